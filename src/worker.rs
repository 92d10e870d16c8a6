//! Running operations off the caller's thread
//!
//! A front end that must stay responsive hands a [`Job`] to [`spawn`] or
//! [`run`]; the whole operation executes on tokio's blocking pool and
//! reports how long it took.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{CompressError, Result};
use crate::{Compressor, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    CompressFile { input: PathBuf, output: PathBuf },
    DecompressFile { input: PathBuf, output: PathBuf },
    CompressDir { input: PathBuf, output: PathBuf },
    DecompressDir { archive: PathBuf },
}

impl Job {
    /// Run the job on the current thread.
    pub fn execute(&self, compressor: &Compressor) -> Result<Summary> {
        match self {
            Job::CompressFile { input, output } => compressor.compress_file(input, output),
            Job::DecompressFile { input, output } => compressor.decompress_file(input, output),
            Job::CompressDir { input, output } => compressor.compress_dir(input, output),
            Job::DecompressDir { archive } => compressor.decompress_dir(archive),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Outcome {
    pub summary: Summary,
    pub elapsed: Duration,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {:.3}s", self.summary, self.elapsed.as_secs_f64())
    }
}

/// Start `job` on the blocking pool.
pub fn spawn(compressor: Compressor, job: Job) -> JoinHandle<Result<Outcome>> {
    tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let summary = job.execute(&compressor)?;
        let elapsed = started.elapsed();
        debug!(?job, ?elapsed, "job finished");
        Ok(Outcome { summary, elapsed })
    })
}

/// Run `job` on the blocking pool and wait for it.
pub async fn run(compressor: Compressor, job: Job) -> Result<Outcome> {
    spawn(compressor, job)
        .await
        .map_err(|e| CompressError::Worker(e.to_string()))?
}

//! huffpack: Huffman coding for single files and whole directory trees.
//!
//! - Frequency analysis, deterministic tree construction and code tables
//! - Bit packing of variable-length codes
//! - A single-file container and a directory archive built on top of it
//!
//! [`Compressor`] is the entry point for callers working with paths; the
//! [`container`] and [`archive`] modules work on in-memory buffers.

pub mod archive;
pub mod bitpack;
pub mod code;
pub mod config;
pub mod container;
pub mod error;
pub mod frequency;
pub mod tree;
pub mod wire;
pub mod worker;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive::Archive;
use crate::config::CodecConfig;
pub use crate::error::{CompressError, Result};
use crate::frequency::FrequencyTable;

/// Which facade operation produced a [`Summary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CompressFile,
    DecompressFile,
    CompressDir,
    DecompressDir,
}

/// Outcome of a completed operation, displayed as a status message.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub operation: Operation,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub files: usize,
    /// Uncompressed byte count
    pub original_size: u64,
    /// Container or archive byte count
    pub compressed_size: u64,
    /// Shannon entropy of a compressed single file, bits per byte
    pub entropy_bits: Option<f64>,
}

impl Summary {
    pub fn ratio(&self) -> f64 {
        if self.original_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.operation {
            Operation::CompressFile | Operation::CompressDir => "compressed",
            Operation::DecompressFile | Operation::DecompressDir => "decompressed",
        };
        write!(
            f,
            "{verb} {} -> {} ({} file(s), {} -> {} bytes, ratio {:.3})",
            self.source.display(),
            self.destination.display(),
            self.files,
            self.original_size,
            self.compressed_size,
            self.ratio()
        )
    }
}

/// Path-level compression operations.
#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CodecConfig,
}

impl Compressor {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compress one file into a single-file container at `output`.
    pub fn compress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Summary> {
        let (input, output) = (input.as_ref(), output.as_ref());
        self.check_destination(output)?;

        self.config.check_input_size(fs::metadata(input)?.len())?;
        let data = fs::read(input)?;
        let container = container::compress(&data)?;
        write_output(output, &container)?;

        let summary = Summary {
            operation: Operation::CompressFile,
            source: input.to_path_buf(),
            destination: output.to_path_buf(),
            files: 1,
            original_size: data.len() as u64,
            compressed_size: container.len() as u64,
            entropy_bits: Some(FrequencyTable::from_bytes(&data).entropy()),
        };
        info!(%summary, "file compressed");
        Ok(summary)
    }

    /// Restore a single-file container to `output`.
    pub fn decompress_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Summary> {
        let (input, output) = (input.as_ref(), output.as_ref());
        self.check_destination(output)?;

        let container = fs::read(input)?;
        let data = container::decompress(&container)?;
        write_output(output, &data)?;

        let summary = Summary {
            operation: Operation::DecompressFile,
            source: input.to_path_buf(),
            destination: output.to_path_buf(),
            files: 1,
            original_size: data.len() as u64,
            compressed_size: container.len() as u64,
            entropy_bits: None,
        };
        info!(%summary, "file decompressed");
        Ok(summary)
    }

    /// Archive the directory tree under `input` into `output`.
    pub fn compress_dir(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Summary> {
        let (input, output) = (input.as_ref(), output.as_ref());
        self.check_destination(output)?;

        let archive = Archive::from_dir(input, &self.config)?;
        let bytes = archive.to_bytes()?;
        write_output(output, &bytes)?;

        let summary = Summary {
            operation: Operation::CompressDir,
            source: input.to_path_buf(),
            destination: output.to_path_buf(),
            files: archive.manifest.files.len(),
            original_size: archive.original_size(),
            compressed_size: bytes.len() as u64,
            entropy_bits: None,
        };
        info!(%summary, "directory compressed");
        Ok(summary)
    }

    /// Restore an archive to the root directory recorded inside it.
    pub fn decompress_dir(&self, archive_path: impl AsRef<Path>) -> Result<Summary> {
        self.restore(archive_path.as_ref(), None)
    }

    /// Restore an archive under `dest` instead of its recorded root.
    pub fn decompress_dir_into(
        &self,
        archive_path: impl AsRef<Path>,
        dest: impl AsRef<Path>,
    ) -> Result<Summary> {
        self.restore(archive_path.as_ref(), Some(dest.as_ref()))
    }

    fn restore(&self, archive_path: &Path, dest: Option<&Path>) -> Result<Summary> {
        let bytes = fs::read(archive_path)?;
        let archive = Archive::parse(&bytes)?;
        let dest = dest.unwrap_or_else(|| archive.root()).to_path_buf();
        archive.extract(&dest)?;

        let summary = Summary {
            operation: Operation::DecompressDir,
            source: archive_path.to_path_buf(),
            destination: dest,
            files: archive.manifest.files.len(),
            original_size: archive.original_size(),
            compressed_size: bytes.len() as u64,
            entropy_bits: None,
        };
        info!(%summary, "directory decompressed");
        Ok(summary)
    }

    fn check_destination(&self, output: &Path) -> Result<()> {
        if !self.config.overwrite && output.symlink_metadata().is_ok() {
            return Err(CompressError::DestinationExists(output.to_path_buf()));
        }
        Ok(())
    }
}

/// Write `bytes` to `path`. If that fails and the file did not exist
/// before, remove whatever was written.
fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let existed = path.symlink_metadata().is_ok();
    if let Err(e) = fs::write(path, bytes) {
        if !existed && path.symlink_metadata().is_ok() {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %cleanup, "could not remove partial output");
            }
        }
        return Err(e.into());
    }
    Ok(())
}

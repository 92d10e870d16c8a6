//! Directory archive
//!
//! ```text
//! [u32 root_len][root][u32 dir_count][u32 file_count]
//! {[u32 len][dir]} x dir_count
//! {[u32 len][file]} x file_count
//! entry x file_count
//! ```
//!
//! Directory and file names are `/`-separated paths relative to the root.
//! Each entry is a container header followed by `[u32 packed_len]` and the
//! packed bits (see [`crate::container::encode_entry`]). Entries are written
//! and read strictly in manifest order since every entry starts where the
//! previous one ended.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CodecConfig;
use crate::container;
use crate::error::{CompressError, Result, Stage};
use crate::wire::{self, Reader};

/// The directory and file lists stored at the front of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    /// Root directory as it was given when the archive was made
    pub root: String,
    /// Directories, parents before children
    pub directories: Vec<String>,
    /// Files, in entry order
    pub files: Vec<String>,
}

impl Manifest {
    /// Walk `root` depth-first, names sorted within each directory.
    ///
    /// Symbolic links are not followed and are left out of the archive.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CompressError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let mut manifest = Manifest {
            root: path_to_string(root)?,
            ..Manifest::default()
        };

        for entry in WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| CompressError::InvalidPath(e.to_string()))?;
            let name = relative_name(relative)?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                manifest.directories.push(name);
            } else if file_type.is_file() {
                manifest.files.push(name);
            } else {
                warn!(path = %entry.path().display(), "skipping non-regular file");
            }
        }

        debug!(
            root = %manifest.root,
            directories = manifest.directories.len(),
            files = manifest.files.len(),
            "scanned directory"
        );
        Ok(manifest)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        wire::put_bytes(out, self.root.as_bytes())?;
        wire::put_u32(out, count_u32(self.directories.len())?);
        wire::put_u32(out, count_u32(self.files.len())?);
        for name in self.directories.iter().chain(&self.files) {
            wire::put_bytes(out, name.as_bytes())?;
        }
        Ok(())
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let root = utf8(r.bytes("root path")?, "root path")?;
        let dir_count = r.u32("directory count")? as usize;
        let file_count = r.u32("file count")? as usize;

        let mut seen = HashSet::new();
        let directories = read_names(r, dir_count, "directory name", &mut seen)?;
        let files = read_names(r, file_count, "file name", &mut seen)?;
        check_conflicts(&directories, &files)?;

        Ok(Manifest {
            root,
            directories,
            files,
        })
    }
}

fn read_names(
    r: &mut Reader<'_>,
    count: usize,
    what: &str,
    seen: &mut HashSet<String>,
) -> Result<Vec<String>> {
    // every name costs at least its 4-byte length
    let mut names = Vec::with_capacity(count.min(r.remaining() / 4));
    for _ in 0..count {
        let name = utf8(r.bytes(what)?, what)?;
        checked_relative(&name)?;
        if !seen.insert(name.clone()) {
            return Err(CompressError::malformed(
                Stage::Manifest,
                format!("{what} {name:?} listed twice"),
            ));
        }
        names.push(name);
    }
    Ok(names)
}

/// A recorded file cannot also be a directory or the parent of anything.
fn check_conflicts(directories: &[String], files: &[String]) -> Result<()> {
    let file_keys: HashSet<String> = files.iter().map(|f| normalized(f)).collect();
    for name in directories.iter().chain(files) {
        let parts: Vec<&str> = name.split('/').filter(|p| !p.is_empty()).collect();
        for depth in 1..parts.len() {
            let ancestor = parts[..depth].join("/");
            if file_keys.contains(&ancestor) {
                return Err(CompressError::malformed(
                    Stage::Manifest,
                    format!("{name:?} lies under the file {ancestor:?}"),
                ));
            }
        }
    }
    for dir in directories {
        if file_keys.contains(&normalized(dir)) {
            return Err(CompressError::malformed(
                Stage::Manifest,
                format!("{dir:?} is recorded as both a directory and a file"),
            ));
        }
    }
    Ok(())
}

fn normalized(name: &str) -> String {
    name.split('/').filter(|p| !p.is_empty()).collect::<Vec<_>>().join("/")
}

/// A directory tree held in memory: its manifest and every file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub manifest: Manifest,
    /// File contents, parallel to `manifest.files`
    pub contents: Vec<Vec<u8>>,
}

impl Archive {
    /// Scan `root` and read every file, one after another.
    pub fn from_dir(root: impl AsRef<Path>, config: &CodecConfig) -> Result<Self> {
        let root = root.as_ref();
        let manifest = Manifest::scan(root)?;
        let mut contents = Vec::with_capacity(manifest.files.len());
        for name in &manifest.files {
            let path = root.join(name);
            let size = fs::metadata(&path)?.len();
            config.check_input_size(size)?;
            contents.push(fs::read(&path)?);
        }
        Ok(Self { manifest, contents })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.manifest.write(&mut out)?;
        for (name, data) in self.manifest.files.iter().zip(&self.contents) {
            let start = out.len();
            container::encode_entry(data, &mut out)?;
            debug!(file = %name, offset = start, size = out.len() - start, "wrote entry");
        }
        Ok(out)
    }

    /// Read the manifest and decode every entry. Nothing touches the
    /// filesystem here, so a damaged archive is rejected as a whole.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes, 0, Stage::Manifest);
        let manifest = Manifest::read(&mut r)?;

        let mut offset = r.position();
        let mut contents = Vec::with_capacity(manifest.files.len());
        for name in &manifest.files {
            let (data, next) = container::decode_entry(bytes, offset)?;
            debug!(file = %name, offset, next, "decoded entry");
            contents.push(data);
            offset = next;
        }

        if offset != bytes.len() {
            return Err(CompressError::malformed(
                Stage::Unpack,
                format!("{} unexpected bytes after the last entry", bytes.len() - offset),
            ));
        }
        Ok(Self { manifest, contents })
    }

    /// Recreate the tree under `dest`, which must not exist yet.
    pub fn extract(&self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        if dest.symlink_metadata().is_ok() {
            return Err(CompressError::DestinationExists(dest.to_path_buf()));
        }

        let directories = self
            .manifest
            .directories
            .iter()
            .map(|d| checked_relative(d).map(|p| dest.join(p)))
            .collect::<Result<Vec<_>>>()?;
        let files = self
            .manifest
            .files
            .iter()
            .map(|f| checked_relative(f).map(|p| dest.join(p)))
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(dest)?;
        if let Err(e) = self.write_tree(&directories, &files) {
            if let Err(cleanup) = fs::remove_dir_all(dest) {
                warn!(path = %dest.display(), error = %cleanup, "could not remove partial tree");
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_tree(&self, directories: &[PathBuf], files: &[PathBuf]) -> Result<()> {
        for dir in directories {
            fs::create_dir_all(dir)?;
        }
        for (path, data) in files.iter().zip(&self.contents) {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, data)?;
        }
        Ok(())
    }

    /// Where the tree was taken from.
    pub fn root(&self) -> &Path {
        Path::new(&self.manifest.root)
    }

    pub fn original_size(&self) -> u64 {
        self.contents.iter().map(|c| c.len() as u64).sum()
    }
}

/// Scan and encode the tree under `root`.
pub fn compress(root: impl AsRef<Path>, config: &CodecConfig) -> Result<Vec<u8>> {
    Archive::from_dir(root, config)?.to_bytes()
}

fn relative_name(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str().ok_or_else(|| {
                CompressError::InvalidPath(format!("{} is not valid UTF-8", relative.display()))
            }),
            _ => Err(CompressError::InvalidPath(relative.display().to_string())),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

/// Accept only plain relative paths; no `..`, no roots, no prefixes.
fn checked_relative(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    let plain = !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(CompressError::malformed(
            Stage::Manifest,
            format!("{name:?} is not a plain relative path"),
        ));
    }
    Ok(path.to_path_buf())
}

fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| CompressError::InvalidPath(format!("{} is not valid UTF-8", path.display())))
}

fn utf8(bytes: &[u8], what: &str) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| {
            CompressError::malformed(Stage::Manifest, format!("{what} is not valid UTF-8"))
        })
}

fn count_u32(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| CompressError::InputTooLarge {
        size: n as u64,
        limit: u32::MAX as u64,
    })
}

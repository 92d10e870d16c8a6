//! Configuration for huffpack

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CompressError, Result};

/// Hard ceiling imposed by the 32-bit length fields of both formats.
pub const FORMAT_MAX_INPUT: u64 = u32::MAX as u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest single file (in bytes) accepted for compression
    pub max_input_size: u64,
    /// Replace existing output files instead of failing
    pub overwrite: bool,
    /// Extension appended to compressed single files
    pub file_extension: String,
    /// Extension appended to directory archives
    pub archive_extension: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_input_size: FORMAT_MAX_INPUT,
            overwrite: false,
            file_extension: "filebak".to_string(),
            archive_extension: "folderbak".to_string(),
        }
    }
}

impl CodecConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CompressError::Config(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The effective per-file limit: the configured one, capped by the format.
    pub fn input_limit(&self) -> u64 {
        self.max_input_size.min(FORMAT_MAX_INPUT)
    }

    pub(crate) fn check_input_size(&self, size: u64) -> Result<()> {
        let limit = self.input_limit();
        if size > limit {
            return Err(CompressError::InputTooLarge { size, limit });
        }
        Ok(())
    }

    /// `notes.txt` -> `notes.txt.filebak`, next to the input.
    pub fn compressed_path_for(&self, input: impl AsRef<Path>) -> PathBuf {
        with_appended_extension(input.as_ref(), &self.file_extension)
    }

    /// `photos` -> `photos.folderbak`, next to the input directory.
    pub fn archive_path_for(&self, input: impl AsRef<Path>) -> PathBuf {
        with_appended_extension(input.as_ref(), &self.archive_extension)
    }
}

fn with_appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.input_limit(), u32::MAX as u64);
        assert!(!config.overwrite);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"overwrite": true, "max_input_size": 10}"#;
        let config = CodecConfig::from_json_str(json).unwrap();
        assert!(config.overwrite);
        assert_eq!(config.input_limit(), 10);
        assert_eq!(config.file_extension, "filebak");
    }

    #[test]
    fn test_limit_capped_by_format() {
        let config = CodecConfig {
            max_input_size: u64::MAX,
            ..CodecConfig::default()
        };
        assert_eq!(config.input_limit(), FORMAT_MAX_INPUT);
        assert!(matches!(
            config.check_input_size(FORMAT_MAX_INPUT + 1),
            Err(CompressError::InputTooLarge { .. })
        ));
    }

    #[test]
    fn test_bad_json() {
        let result = CodecConfig::from_json_str("{not json");
        assert!(matches!(result, Err(CompressError::Config(_))));
    }

    #[test]
    fn test_output_names() {
        let config = CodecConfig::default();
        assert_eq!(
            config.compressed_path_for("dir/notes.txt"),
            PathBuf::from("dir/notes.txt.filebak")
        );
        assert_eq!(config.archive_path_for("photos"), PathBuf::from("photos.folderbak"));
    }
}

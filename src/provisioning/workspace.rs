// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scratch directory of the provisioning driver

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::config::RangeConfig;
use crate::errors::{RangeError, RangeResult};

const TEMP_PREFIX: &str = ".range-compiler-";

/// Root under which range workspaces are created
///
/// An owned temp dir is removed on [`close`](Self::close) or drop; a
/// provided directory is left alone.
#[derive(Debug)]
pub enum ScratchDir {
    Owned(TempDir),
    Provided(PathBuf),
}

impl ScratchDir {
    /// Fresh temp directory
    pub fn temporary() -> RangeResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| RangeError::Io(format!("Cannot create scratch directory: {e}")))?;
        debug!(path = %dir.path().display(), "Created scratch directory");
        Ok(ScratchDir::Owned(dir))
    }

    /// Existing directory managed by the caller
    pub fn provided(path: impl Into<PathBuf>) -> Self {
        ScratchDir::Provided(path.into())
    }

    /// Configured directory, or a temp dir when none is set
    pub fn from_config(config: &RangeConfig) -> RangeResult<Self> {
        match &config.scratch_dir {
            Some(path) => Ok(Self::provided(path)),
            None => Self::temporary(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ScratchDir::Owned(dir) => dir.path(),
            ScratchDir::Provided(path) => path,
        }
    }

    /// Directory holding one workspace per stack
    pub fn stacks_dir(&self) -> PathBuf {
        self.path().join("stacks")
    }

    /// Release the directory, removing it when owned
    pub fn close(self) -> RangeResult<()> {
        match self {
            ScratchDir::Owned(dir) => {
                let path = dir.path().to_path_buf();
                dir.close()?;
                debug!(path = %path.display(), "Removed scratch directory");
                Ok(())
            }
            ScratchDir::Provided(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_dir_is_removed_on_close() {
        let scratch = ScratchDir::temporary().unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(TEMP_PREFIX)));

        scratch.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_provided_dir_survives_close() {
        let dir = tempfile::tempdir().unwrap();
        let config = RangeConfig {
            scratch_dir: Some(dir.path().to_path_buf()),
            ..RangeConfig::default()
        };

        let scratch = ScratchDir::from_config(&config).unwrap();
        assert_eq!(scratch.stacks_dir(), dir.path().join("stacks"));
        scratch.close().unwrap();
        assert!(dir.path().is_dir());
    }
}

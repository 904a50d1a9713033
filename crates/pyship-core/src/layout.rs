use std::env::consts::EXE_SUFFIX;
use std::path::{self, Path, PathBuf};

use anyhow::{Context, Result};

use crate::error::PyshipError;

pub const VENV_DIR: &str = "ve";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const VERSION_FILE: &str = "VERSION";

#[cfg(windows)]
const VENV_BIN: &str = "Scripts";
#[cfg(not(windows))]
const VENV_BIN: &str = "bin";

/// Paths derived from a project's base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    base: PathBuf,
}

impl ProjectLayout {
    /// Anchors a layout at `base`, made absolute against the current
    /// directory.
    ///
    /// # Errors
    /// Returns [`PyshipError::MissingBaseDir`] when `base` is not a directory.
    pub fn discover(base: &Path) -> Result<Self> {
        if !base.is_dir() {
            return Err(PyshipError::MissingBaseDir(base.to_path_buf()).into());
        }
        let base = path::absolute(base)
            .with_context(|| format!("resolving base directory {}", base.display()))?;
        Ok(Self { base })
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.base.join("build")
    }

    #[must_use]
    pub fn src_dir(&self) -> PathBuf {
        self.base.join("src")
    }

    #[must_use]
    pub fn venv_dir(&self) -> PathBuf {
        self.base.join(VENV_DIR)
    }

    #[must_use]
    pub fn venv_bin_dir(&self) -> PathBuf {
        self.venv_dir().join(VENV_BIN)
    }

    /// An executable inside the environment, e.g. `ve/bin/pip`.
    #[must_use]
    pub fn venv_executable(&self, name: &str) -> PathBuf {
        self.venv_bin_dir().join(format!("{name}{EXE_SUFFIX}"))
    }

    #[must_use]
    pub fn requirements(&self) -> PathBuf {
        self.base.join(REQUIREMENTS_FILE)
    }

    /// `VERSION` next to the base directory, shared by the whole repository.
    #[must_use]
    pub fn version_file(&self) -> Option<PathBuf> {
        self.base.parent().map(|parent| parent.join(VERSION_FILE))
    }
}

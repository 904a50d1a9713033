//! Launch environments for commands run inside a project's virtualenv.
//!
//! Nothing here mutates the current process: the variables a shell would
//! export after activating the environment are collected into a
//! [`LaunchEnv`] and applied to each child command.

use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::debug;

use crate::config::EnvSnapshot;
use crate::error::PyshipError;
use crate::layout::ProjectLayout;
use crate::process;
use crate::version;

pub const PYTHONPATH: &str = "PYTHONPATH";
pub const PATH: &str = "PATH";
pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";
pub const PYTHONHOME: &str = "PYTHONHOME";
pub const PBR_VERSION: &str = "PBR_VERSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEnv {
    cwd: PathBuf,
    set: BTreeMap<String, OsString>,
    remove: Vec<String>,
}

/// Printable form of a [`LaunchEnv`].
#[derive(Debug, Clone, Serialize)]
pub struct LaunchSummary {
    pub cwd: String,
    pub set: BTreeMap<String, String>,
    pub unset: Vec<String>,
}

impl LaunchEnv {
    /// Runs in `cwd` with the parent's environment untouched.
    #[must_use]
    pub fn inherit(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            set: BTreeMap::new(),
            remove: Vec::new(),
        }
    }

    /// The environment an activated project virtualenv provides: runs in the
    /// base directory with `VIRTUAL_ENV`, the search path, the execution path
    /// and the release version (when a VERSION file exists) exported.
    ///
    /// # Errors
    /// Returns an error when a path cannot be joined into a variable or the
    /// VERSION file is unreadable or empty.
    pub fn for_project(layout: &ProjectLayout, snapshot: &EnvSnapshot) -> Result<Self> {
        let mut launch = Self::inherit(layout.base());
        launch
            .set
            .insert(VIRTUAL_ENV.to_string(), layout.venv_dir().into_os_string());
        launch.remove.push(PYTHONHOME.to_string());
        launch.set.insert(
            PYTHONPATH.to_string(),
            compose_search_path(layout, snapshot.var_os(PYTHONPATH))?,
        );
        launch.set.insert(
            PATH.to_string(),
            compose_exec_path(&layout.venv_bin_dir(), snapshot.var_os(PATH))?,
        );
        if let Some(version) = version::release_version(layout)? {
            launch.set.insert(PBR_VERSION.to_string(), version.into());
        }
        debug!(cwd = %launch.cwd.display(), vars = ?launch.set, "launch environment");
        Ok(launch)
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub fn var(&self, key: &str) -> Option<&OsStr> {
        self.set.get(key).map(OsString::as_os_str)
    }

    pub(crate) fn apply(&self, command: &mut Command) {
        for key in &self.remove {
            command.env_remove(key);
        }
        command.envs(&self.set);
        command.current_dir(&self.cwd);
    }

    /// Finds `program` on this environment's `PATH` (falling back to the
    /// parent's), the way the activated shell would. A program given as a
    /// path is taken relative to the working directory and returned as long
    /// as it exists, so a non-executable file fails at launch instead.
    ///
    /// # Errors
    /// Returns [`PyshipError::CommandNotFound`] when nothing matches.
    pub fn resolve_program(&self, program: &str) -> Result<PathBuf> {
        if has_separator(program) {
            let candidate = self.cwd.join(program);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        let search = self
            .var(PATH)
            .map(OsStr::to_os_string)
            .or_else(|| env::var_os(PATH));
        which::which_in(program, search, &self.cwd).map_err(|_| {
            PyshipError::CommandNotFound {
                program: program.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn summary(&self) -> LaunchSummary {
        LaunchSummary {
            cwd: self.cwd.display().to_string(),
            set: self
                .set
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string_lossy().into_owned()))
                .collect(),
            unset: self.remove.clone(),
        }
    }
}

/// `<base>/build`, `<base>/src`, then the prior value when non-empty.
///
/// # Errors
/// Returns an error when an entry contains the platform path separator.
pub fn compose_search_path(layout: &ProjectLayout, prior: Option<&OsStr>) -> Result<OsString> {
    let mut entries = vec![layout.build_dir(), layout.src_dir()];
    entries.extend(prior_entries(prior));
    join(&entries, PYTHONPATH)
}

/// The environment's executable directory ahead of the prior `PATH`.
///
/// # Errors
/// Returns an error when an entry contains the platform path separator.
pub fn compose_exec_path(bin_dir: &Path, prior: Option<&OsStr>) -> Result<OsString> {
    let mut entries = vec![bin_dir.to_path_buf()];
    entries.extend(prior_entries(prior));
    join(&entries, PATH)
}

fn has_separator(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

fn prior_entries(prior: Option<&OsStr>) -> Vec<PathBuf> {
    match prior {
        Some(value) if !value.is_empty() => env::split_paths(value).collect(),
        _ => Vec::new(),
    }
}

fn join(entries: &[PathBuf], var: &str) -> Result<OsString> {
    env::join_paths(entries).map_err(|err| anyhow!("building {var}: {err}"))
}

/// Hands the process over to `program`.
///
/// On Unix the current process image is replaced, so this only returns on
/// failure. Elsewhere the command runs as a child and its exit code is
/// returned for the caller to exit with.
///
/// # Errors
/// Returns an error when the program cannot be resolved or started.
pub fn exec(program: &str, args: &[String], env: &LaunchEnv) -> Result<i32> {
    let resolved = env.resolve_program(program)?;
    let args: Vec<OsString> = args.iter().map(OsString::from).collect();
    debug!(program = %resolved.display(), ?args, "exec");
    exec_resolved(&resolved, &args, env)
}

#[cfg(unix)]
fn exec_resolved(program: &Path, args: &[OsString], env: &LaunchEnv) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    let mut command = process::configured_command(program, args, env);
    let source = command.exec();
    Err(PyshipError::launch(program.display().to_string(), source).into())
}

#[cfg(not(unix))]
fn exec_resolved(program: &Path, args: &[OsString], env: &LaunchEnv) -> Result<i32> {
    process::run_command_passthrough(program, args, env)
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::config::{EnvSnapshot, GlobalOptions, Settings};
use crate::error::PyshipError;
use crate::launch::{self, LaunchEnv, LaunchSummary};
use crate::layout::ProjectLayout;
use crate::process::run_command_passthrough;
use crate::provision::ensure_environment;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub base: PathBuf,
    pub command: Vec<String>,
}

/// Provisions the project environment and hands the process to the command.
///
/// Returns the exit code to terminate with. On Unix a successful launch never
/// returns. With no command the environment is provisioned and `0` returned.
///
/// # Errors
///
/// Returns an error when the base directory is missing, settings are invalid,
/// provisioning fails, or the command cannot be launched.
pub fn run(global: &GlobalOptions, request: &RunRequest) -> Result<i32> {
    let (layout, launch_env) = prepare(global, &request.base)?;
    let Some((program, args)) = request.command.split_first() else {
        info!(base = %layout.base().display(), "environment ready");
        return Ok(0);
    };
    launch::exec(program, args, &launch_env)
}

/// The launch environment for `base`, computed without provisioning.
///
/// # Errors
///
/// Returns an error when the base directory is missing or the environment
/// variables cannot be composed.
pub fn describe(base: &Path) -> Result<LaunchSummary> {
    let layout = ProjectLayout::discover(base)?;
    let launch_env = LaunchEnv::for_project(&layout, &EnvSnapshot::capture())?;
    Ok(launch_env.summary())
}

pub(crate) fn prepare(
    global: &GlobalOptions,
    base: &Path,
) -> Result<(ProjectLayout, LaunchEnv)> {
    let layout = ProjectLayout::discover(base)?;
    let settings = Settings::load(global, layout.base())?;
    ensure_environment(&layout, &settings)?;
    let launch_env = LaunchEnv::for_project(&layout, &EnvSnapshot::capture())?;
    Ok((layout, launch_env))
}

/// Runs one command as a child inside the launch environment, failing with
/// the command's exit code when it is non-zero.
pub(crate) fn run_step(step: &str, argv: &[String], launch_env: &LaunchEnv) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };
    let resolved = launch_env.resolve_program(program)?;
    let args: Vec<OsString> = args.iter().map(OsString::from).collect();
    info!(step, command = %argv.join(" "), "running");
    let code = run_command_passthrough(&resolved, &args, launch_env)?;
    if code != 0 {
        return Err(PyshipError::StepFailed {
            step: format!("{step} step `{}`", argv.join(" ")),
            code,
        }
        .into());
    }
    Ok(())
}

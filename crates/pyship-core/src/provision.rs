use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info};

use crate::config::{EnvCreator, Settings};
use crate::error::PyshipError;
use crate::launch::LaunchEnv;
use crate::layout::ProjectLayout;
use crate::process::{run_command, run_command_passthrough};
use crate::python::{resolve_interpreter, resolve_tool};

/// A provisioned project virtualenv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    root: PathBuf,
    created: bool,
}

impl Environment {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether this call created the environment rather than reusing it.
    #[must_use]
    pub fn created(&self) -> bool {
        self.created
    }
}

/// Makes sure `<base>/ve` exists, then installs the requirements manifest and
/// helper packages into it.
///
/// An existing environment directory is trusted as-is.
///
/// # Errors
///
/// Returns an error when the interpreter cannot be resolved, environment
/// creation fails, or the installer exits non-zero.
pub fn ensure_environment(layout: &ProjectLayout, settings: &Settings) -> Result<Environment> {
    let root = layout.venv_dir();
    let created = if root.exists() {
        debug!(env = %root.display(), "reusing environment");
        false
    } else {
        create_environment(layout, settings)?;
        true
    };
    install_requirements(layout, settings)?;
    Ok(Environment { root, created })
}

fn create_environment(layout: &ProjectLayout, settings: &Settings) -> Result<()> {
    let python = resolve_interpreter(&settings.python)?;
    let target = layout.venv_dir().into_os_string();
    let (program, args): (PathBuf, Vec<OsString>) = match settings.creator {
        EnvCreator::Venv => (python, vec!["-m".into(), "venv".into(), target]),
        EnvCreator::Virtualenv => (
            resolve_tool("virtualenv")?,
            vec![
                "--python".into(),
                python.into_os_string(),
                "--quiet".into(),
                target,
            ],
        ),
    };
    info!(env = %layout.venv_dir().display(), "creating environment");
    let output = run_command(&program, &args, &LaunchEnv::inherit(layout.base()))?;
    if output.code != 0 {
        error!(
            code = output.code,
            stderr = %output.stderr.trim_end(),
            "environment creation failed"
        );
        return Err(PyshipError::StepFailed {
            step: "environment creation".to_string(),
            code: output.code,
        }
        .into());
    }
    Ok(())
}

fn install_requirements(layout: &ProjectLayout, settings: &Settings) -> Result<()> {
    let pip = layout.venv_executable("pip");
    let mut args: Vec<OsString> = vec![
        "install".into(),
        "-r".into(),
        layout.requirements().into_os_string(),
    ];
    args.extend(settings.helpers.iter().map(OsString::from));
    info!(requirements = %layout.requirements().display(), "installing dependencies");
    let code = run_command_passthrough(&pip, &args, &LaunchEnv::inherit(layout.base()))?;
    if code != 0 {
        return Err(PyshipError::StepFailed {
            step: "dependency installation".to_string(),
            code,
        }
        .into());
    }
    Ok(())
}

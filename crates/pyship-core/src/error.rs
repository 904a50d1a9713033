use std::io;
use std::path::PathBuf;

/// Failures that decide the process exit code.
///
/// Everything else travels as a plain `anyhow::Error` and exits with 1.
#[derive(thiserror::Error, Debug)]
pub enum PyshipError {
    #[error("base directory {} does not exist", .0.display())]
    MissingBaseDir(PathBuf),
    #[error("invalid configuration in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("python interpreter `{0}` not found; pass --python or set PYSHIP_PYTHON")]
    InterpreterNotFound(String),
    #[error("{step} exited with status {code}")]
    StepFailed { step: String, code: i32 },
    #[error("command `{program}` not found")]
    CommandNotFound { program: String },
    #[error("failed to execute `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl PyshipError {
    pub(crate) fn launch(program: impl Into<String>, source: io::Error) -> Self {
        let program = program.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::CommandNotFound { program }
        } else {
            Self::Launch { program, source }
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Exit code the binary reports for this failure, following shell
    /// conventions for commands that cannot be found (127) or run (126).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingBaseDir(_) | Self::Config { .. } | Self::InterpreterNotFound(_) => 1,
            Self::StepFailed { code, .. } => {
                if *code > 0 {
                    *code
                } else {
                    1
                }
            }
            Self::CommandNotFound { .. } => 127,
            Self::Launch { .. } => 126,
        }
    }
}

/// Exit code for an arbitrary error chain.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PyshipError>())
        .map_or(1, PyshipError::exit_code)
}

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;
use which::which;

use crate::error::PyshipError;

/// Resolves the interpreter used to create a project environment.
///
/// `python` is either a command name looked up on `PATH` or a path to an
/// executable.
///
/// # Errors
///
/// Returns [`PyshipError::InterpreterNotFound`] when nothing executable
/// matches.
pub fn resolve_interpreter(python: &str) -> Result<PathBuf> {
    let path = which(python).map_err(|_| PyshipError::InterpreterNotFound(python.to_string()))?;
    debug!(requested = python, resolved = %path.display(), "resolved interpreter");
    Ok(path)
}

/// Resolves a helper tool such as `virtualenv` on `PATH`.
///
/// # Errors
///
/// Returns [`PyshipError::CommandNotFound`] when the tool is missing.
pub fn resolve_tool(name: &str) -> Result<PathBuf> {
    which(name).map_err(|_| {
        PyshipError::CommandNotFound {
            program: name.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_interpreter_is_reported_with_its_name() {
        let err = resolve_interpreter("pyship-no-such-python9").unwrap_err();
        let err = err.downcast_ref::<PyshipError>().expect("pyship error");
        assert!(matches!(err, PyshipError::InterpreterNotFound(name) if name == "pyship-no-such-python9"));
        assert_eq!(err.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn explicit_paths_resolve_directly() {
        let resolved = resolve_interpreter("/bin/sh").expect("sh exists");
        assert_eq!(resolved, PathBuf::from("/bin/sh"));
    }
}

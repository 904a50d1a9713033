use std::{
    ffi::OsString,
    io::Read,
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread,
};

use anyhow::{anyhow, Context, Result};

use crate::error::PyshipError;
use crate::launch::LaunchEnv;

/// Captured output kept per stream; older bytes are dropped first.
const MAX_CAPTURE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Execute a program quietly, capturing stdout/stderr.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned or the I/O streams cannot
/// be read entirely.
pub fn run_command(program: &Path, args: &[OsString], env: &LaunchEnv) -> Result<RunOutput> {
    let mut command = configured_command(program, args, env);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    let label = program.display().to_string();
    let mut child = command
        .spawn()
        .map_err(|source| PyshipError::launch(label.clone(), source))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout missing for {label}"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr missing for {label}"))?;
    let stdout_handle = thread::spawn(move || read_to_string_limited(stdout, MAX_CAPTURE_BYTES));
    let stderr_handle = thread::spawn(move || read_to_string_limited(stderr, MAX_CAPTURE_BYTES));

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {label}"))?;
    let (mut stdout, stdout_truncated) = stdout_handle
        .join()
        .map_err(|_| anyhow!("stdout thread panicked"))??;
    let (mut stderr, stderr_truncated) = stderr_handle
        .join()
        .map_err(|_| anyhow!("stderr thread panicked"))??;
    if stdout_truncated {
        stdout.push_str("\n[...truncated...]\n");
    }
    if stderr_truncated {
        stderr.push_str("\n[...truncated...]\n");
    }
    Ok(RunOutput {
        code: exit_code(status),
        stdout,
        stderr,
    })
}

/// Execute a program with inherited stdio and return its exit code.
///
/// # Errors
///
/// Returns an error when the program cannot be spawned.
pub fn run_command_passthrough(program: &Path, args: &[OsString], env: &LaunchEnv) -> Result<i32> {
    let mut command = configured_command(program, args, env);
    command.stdin(Stdio::inherit());
    command.stdout(Stdio::inherit());
    command.stderr(Stdio::inherit());

    let status = command
        .status()
        .map_err(|source| PyshipError::launch(program.display().to_string(), source))?;
    Ok(exit_code(status))
}

pub(crate) fn configured_command(program: &Path, args: &[OsString], env: &LaunchEnv) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    env.apply(&mut command);
    command
}

/// Maps a finished process to the code a shell would report: the exit code,
/// or `128 + signal` for a process killed by a signal on Unix.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

fn read_to_string_limited(mut reader: impl Read, limit: usize) -> Result<(String, bool)> {
    let mut buffer = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        append_limited(&mut buffer, &chunk[..read], limit, &mut truncated);
    }
    Ok((String::from_utf8_lossy(&buffer).to_string(), truncated))
}

// Keeps the tail of the stream; creation failures report at the end.
fn append_limited(buffer: &mut Vec<u8>, chunk: &[u8], limit: usize, truncated: &mut bool) {
    if limit == 0 {
        return;
    }
    if buffer.len().saturating_add(chunk.len()) <= limit {
        buffer.extend_from_slice(chunk);
        return;
    }
    *truncated = true;
    let old_len = buffer.len();
    let excess = old_len.saturating_add(chunk.len()).saturating_sub(limit);
    if excess >= old_len {
        buffer.clear();
        let drop_from_chunk = excess.saturating_sub(old_len).min(chunk.len());
        buffer.extend_from_slice(&chunk[drop_from_chunk..]);
    } else {
        buffer.drain(0..excess);
        buffer.extend_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn sh(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[cfg(unix)]
    #[test]
    fn run_command_captures_output_and_status_unix() -> Result<()> {
        let env = LaunchEnv::inherit(Path::new("."));
        let output = run_command(
            Path::new("/bin/sh"),
            &sh("printf out && printf err >&2; exit 7"),
            &env,
        )?;
        assert_eq!(output.code, 7);
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_command_reports_signals_like_a_shell() -> Result<()> {
        let env = LaunchEnv::inherit(Path::new("."));
        let output = run_command(Path::new("/bin/sh"), &sh("kill -9 $$"), &env)?;
        assert_eq!(output.code, 128 + 9);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn run_command_passthrough_returns_status_unix() -> Result<()> {
        let env = LaunchEnv::inherit(Path::new("."));
        let code = run_command_passthrough(Path::new("/bin/sh"), &sh("exit 3"), &env)?;
        assert_eq!(code, 3);
        Ok(())
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let env = LaunchEnv::inherit(Path::new("."));
        let err = run_command_passthrough(Path::new("/definitely/not/here"), &[], &env)
            .unwrap_err();
        let err = err.downcast_ref::<PyshipError>().expect("pyship error");
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn run_command_bounds_captured_output() -> Result<()> {
        let env = LaunchEnv::inherit(Path::new("."));
        let output = run_command(
            Path::new("/bin/sh"),
            &sh("yes | head -c 1100000; printf end"),
            &env,
        )?;
        assert_eq!(output.code, 0);
        assert!(output.stdout.ends_with("end\n[...truncated...]\n"));
        assert!(output.stdout.len() <= MAX_CAPTURE_BYTES + "\n[...truncated...]\n".len());
        Ok(())
    }

    #[test]
    fn append_limited_keeps_the_tail() {
        let mut buffer = b"abcd".to_vec();
        let mut truncated = false;
        append_limited(&mut buffer, b"ef", 4, &mut truncated);
        assert!(truncated);
        assert_eq!(buffer, b"cdef");
    }
}

//! Bounded execution of external capture/detection/OCR tools

use std::fs::File;
use std::io::{Read, Seek};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

const WAIT_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command line is invalid: {0}")]
    Invalid(String),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `command_line` (shell-split) with `extra_args` appended.
///
/// The child is killed once `timeout` elapses. Output is spooled to
/// anonymous temp files so a chatty tool cannot fill a pipe and stall.
pub fn run_command<I, S>(
    command_line: &str,
    extra_args: I,
    timeout: Duration,
) -> Result<CommandOutput, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut parts = match shell_words::split(command_line) {
        Ok(parts) if !parts.is_empty() => parts,
        Ok(_) => return Err(CommandError::Invalid("empty command".to_string())),
        Err(err) => return Err(CommandError::Invalid(format!("{}: {}", command_line, err))),
    };
    let program = parts.remove(0);

    let mut stdout_file = tempfile::tempfile()?;
    let mut stderr_file = tempfile::tempfile()?;

    let mut cmd = Command::new(&program);
    cmd.args(&parts)
        .args(extra_args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file.try_clone()?))
        .stderr(Stdio::from(stderr_file.try_clone()?));

    tracing::debug!(program = %program, args = ?cmd.get_args().collect::<Vec<_>>(), "Running external command");

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
        program: program.clone(),
        source,
    })?;

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CommandError::Timeout { program, timeout });
        }
        std::thread::sleep(WAIT_SLICE);
    };

    let stdout = read_spool(&mut stdout_file)?;
    let stderr = read_spool(&mut stderr_file)?;

    if !status.success() {
        return Err(CommandError::Failed {
            program,
            status,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        elapsed: started.elapsed(),
    })
}

fn read_spool(file: &mut File) -> std::io::Result<String> {
    file.rewind()?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let output = run_command("echo", ["hello"], Duration::from_secs(5)).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn test_quoted_arguments() {
        let output = run_command("sh -c 'echo \"$0 $1\"' a", ["b"], Duration::from_secs(5)).unwrap();
        assert_eq!(output.stdout.trim(), "a b");
    }

    #[test]
    fn test_nonzero_exit() {
        let err = run_command("sh -c 'echo oops >&2; exit 3'", Vec::<String>::new(), Duration::from_secs(5))
            .unwrap_err();
        match err {
            CommandError::Failed { stderr, .. } => assert_eq!(stderr, "oops"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let err = run_command("sleep", ["5"], Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_program() {
        let err = run_command("plategate-no-such-tool", Vec::<String>::new(), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn test_empty_command() {
        let err = run_command("   ", Vec::<String>::new(), Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }
}

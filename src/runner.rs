//! Running user commands through the host shell.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Captured result of one command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The command could not be started at all
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("no command given")]
    EmptyCommand,

    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes a command line and captures its output
pub trait CommandRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, ExecutionError>;
}

/// Runs commands with `sh -c` (`cmd /C` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell_command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Result<CommandOutput, ExecutionError> {
        if command.trim().is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }

        debug!(%command, "running command");
        let output = Self::shell_command(command)
            .stdin(Stdio::inherit())
            .output()
            .map_err(|source| ExecutionError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let result = CommandOutput {
            stdout: decode(&output.stdout),
            stderr: decode(&output.stderr),
            exit_code: exit_code(output.status),
        };
        debug!(exit_code = result.exit_code, stderr_bytes = output.stderr.len(), "command finished");
        Ok(result)
    }
}

/// Read captured output from `reader` until EOF, decoded like command output
pub fn read_output<R: Read>(mut reader: R) -> io::Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode(&bytes))
}

/// Decode process output as UTF-8, replacing invalid sequences
fn decode(bytes: &[u8]) -> String {
    let (text, _had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    text.into_owned()
}

/// Exit code, or `128 + signal` for a process killed by a signal
fn exit_code(status: ExitStatus) -> i32 {
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

    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_is_rejected() {
        let err = ShellRunner.run("   ").unwrap_err();
        assert!(matches!(err, ExecutionError::EmptyCommand));
    }

    #[test]
    fn test_decode_replaces_invalid_utf8() {
        assert_eq!(decode(b"ok \xff done"), "ok \u{FFFD} done");
        assert_eq!(decode(b"\xEF\xBB\xBFbom"), "bom");
    }

    #[test]
    fn test_read_output_accepts_invalid_utf8() {
        let piped = std::io::Cursor::new(b"bad \xff byte\nnext line".to_vec());
        let text = read_output(piped).unwrap();
        assert_eq!(text, "bad \u{FFFD} byte\nnext line");
    }

    #[test]
    fn test_read_output_empty_input() {
        assert_eq!(read_output(std::io::empty()).unwrap(), "");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_and_exit_code() {
        let output = ShellRunner.run("echo hello").unwrap();
        assert_eq!(output.stdout, "hello\n");
        assert_eq!(output.stderr, "");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stderr_of_failing_command() {
        let output = ShellRunner.run("echo partial; echo oops 1>&2; exit 3").unwrap();
        assert_eq!(output.stdout, "partial\n");
        assert_eq!(output.stderr, "oops\n");
        assert_eq!(output.exit_code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_signal_as_high_exit_code() {
        let output = ShellRunner.run("kill -9 $$").unwrap();
        assert_eq!(output.exit_code, 137);
    }
}

//! Process invocation for OS facilities.
//!
//! Every command is built from an argument vector and executed directly,
//! never through a shell, so device names and paths are passed verbatim.

use configdrive_shared::errors::{ConfigDriveError, ConfigDriveResult};
use std::ffi::OsString;
use std::process::Command;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs OS commands on behalf of the discovery components.
///
/// Implementations block until the command exits.
pub trait CommandRunner {
    /// Run `program` with `args` and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only when the process could not be spawned or
    /// waited on. A non-zero exit is reported through [`CommandOutput::status`].
    fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Render a command line for logs and error messages.
pub fn display_command(program: &str, args: &[OsString]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// Run a command and require a zero exit status.
///
/// # Errors
///
/// Returns `ConfigDriveError::Execution` if the command cannot be spawned or
/// exits unsuccessfully.
pub fn run_checked(
    runner: &dyn CommandRunner,
    program: &str,
    args: &[OsString],
) -> ConfigDriveResult<CommandOutput> {
    let line = display_command(program, args);
    tracing::debug!("Running: {}", line);

    let output = runner
        .run(program, args)
        .map_err(|e| ConfigDriveError::Execution(format!("Failed to run {}: {}", line, e)))?;

    if !output.success() {
        return Err(ConfigDriveError::Execution(format!(
            "{} exited with {}: {}",
            line,
            exit_description(output.status),
            output.stderr.trim()
        )));
    }

    Ok(output)
}

/// Human-readable exit status.
pub(crate) fn exit_description(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRunner(std::io::Result<CommandOutput>);

    impl CommandRunner for FixedRunner {
        fn run(&self, _program: &str, _args: &[OsString]) -> std::io::Result<CommandOutput> {
            match &self.0 {
                Ok(out) => Ok(out.clone()),
                Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    #[test]
    fn test_display_command_joins_args() {
        let args = vec![OsString::from("-n"), OsString::from("kern.disks")];
        assert_eq!(display_command("sysctl", &args), "sysctl -n kern.disks");
    }

    #[test]
    fn test_run_checked_passes_through_success() {
        let runner = FixedRunner(Ok(CommandOutput::ok("cd0\n")));
        let out = run_checked(&runner, "sysctl", &[]).unwrap();
        assert_eq!(out.stdout, "cd0\n");
    }

    #[test]
    fn test_run_checked_rejects_nonzero_exit() {
        let runner = FixedRunner(Ok(CommandOutput::failed(1, "permission denied\n")));
        let err = run_checked(&runner, "mount", &[]).unwrap_err();
        assert!(matches!(err, ConfigDriveError::Execution(_)));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_run_checked_maps_spawn_failure() {
        let runner = FixedRunner(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        )));
        let err = run_checked(&runner, "mount", &[]).unwrap_err();
        assert!(matches!(err, ConfigDriveError::Execution(_)));
    }

    #[test]
    fn test_signal_exit_is_not_success() {
        let out = CommandOutput {
            status: None,
            ..Default::default()
        };
        assert!(!out.success());
        assert_eq!(exit_description(out.status), "signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_stdout() {
        let out = SystemRunner
            .run("echo", &[OsString::from("cd0 vtbd0")])
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "cd0 vtbd0\n");
    }
}

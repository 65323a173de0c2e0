//! Test helpers for config drive discovery.
//!
//! [`ScriptedRunner`] stands in for the OS: it answers commands from a script
//! and records every invocation so tests can assert on what was (and was not)
//! run.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use configdrive::{CommandOutput, CommandRunner};
use parking_lot::Mutex;
use tempfile::TempDir;

type Responder = Arc<dyn Fn(&[String]) -> std::io::Result<CommandOutput> + Send + Sync>;

/// A recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Command runner answering from a script.
///
/// Lookup order: a reply registered for the exact argument list, then a
/// reply registered for the program, then a spawn failure (`NotFound`), as if
/// the program were not installed.
#[derive(Default)]
pub struct ScriptedRunner {
    exact: HashMap<(String, Vec<String>), Responder>,
    by_program: HashMap<String, Responder>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to any invocation of `program`.
    pub fn reply(self, program: &str, output: CommandOutput) -> Self {
        self.respond(program, move |_| Ok(output.clone()))
    }

    /// Reply to `program` invoked with exactly `args`.
    pub fn reply_args(mut self, program: &str, args: &[&str], output: CommandOutput) -> Self {
        let key = (
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
        );
        self.exact.insert(
            key,
            Arc::new(move |_: &[String]| -> std::io::Result<CommandOutput> {
                Ok(output.clone())
            }),
        );
        self
    }

    /// Compute the reply to any invocation of `program` from its arguments.
    pub fn respond<F>(mut self, program: &str, f: F) -> Self
    where
        F: Fn(&[String]) -> std::io::Result<CommandOutput> + Send + Sync + 'static,
    {
        self.by_program.insert(program.to_string(), Arc::new(f));
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.program == program)
            .cloned()
            .collect()
    }

    /// Invocations of `mount` that actually mount something (have arguments).
    pub fn mount_commands(&self) -> Vec<Invocation> {
        self.calls_to("mount")
            .into_iter()
            .filter(|c| !c.args.is_empty())
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> std::io::Result<CommandOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.lock().push(Invocation {
            program: program.to_string(),
            args: args.clone(),
        });

        let key = (program.to_string(), args);
        let responder = self
            .exact
            .get(&key)
            .or_else(|| self.by_program.get(program))
            .cloned();

        match responder {
            Some(f) => f(&key.1),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: command not scripted", program),
            )),
        }
    }
}

/// Write a minimal OpenStack config drive layout into `dir`.
pub fn populate_config_drive(dir: &Path) -> std::io::Result<()> {
    let latest = dir.join("openstack").join("latest");
    std::fs::create_dir_all(&latest)?;
    std::fs::write(
        latest.join("meta_data.json"),
        r#"{"uuid": "d8e02d56-2648-49a3-bf97-6be8f1204f38", "hostname": "guest"}"#,
    )?;
    std::fs::write(latest.join("user_data"), "#!/bin/sh\necho hello\n")?;
    std::fs::create_dir_all(dir.join("ec2").join("latest"))?;
    Ok(())
}

/// Temporary directory holding a config drive layout.
pub fn config_drive_fixture() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    populate_config_drive(dir.path()).expect("Failed to populate config drive fixture");
    dir
}

/// Remove everything inside `dir`, keeping `dir` itself.
pub fn empty_dir(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

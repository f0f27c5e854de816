//! Scripted host for discovery and dispatch tests.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use host::{ExecOutput, Host, HostError};

#[derive(Debug, Clone)]
enum Scripted {
    Output(ExecOutput),
    Timeout,
    Panic,
}

/// Host with a fixed set of executables and canned command responses.
///
/// Commands are keyed by their full command line (`git --version`). Anything
/// unscripted fails to spawn.
#[derive(Debug, Default)]
pub struct FakeHost {
    present: HashSet<String>,
    responses: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, name: &str) -> Self {
        self.present.insert(name.to_string());
        self
    }

    pub fn respond(mut self, command_line: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses.insert(
            command_line.to_string(),
            Scripted::Output(ExecOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
        );
        self
    }

    pub fn time_out(mut self, command_line: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), Scripted::Timeout);
        self
    }

    pub fn panic_on(mut self, command_line: &str) -> Self {
        self.responses.insert(command_line.to_string(), Scripted::Panic);
        self
    }

    /// Command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Host for FakeHost {
    fn which(&self, name: &str) -> Option<PathBuf> {
        self.present
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    async fn run(&self, program: &str, args: &[&str], timeout: Duration) -> host::Result<ExecOutput> {
        let mut parts = vec![program];
        parts.extend_from_slice(args);
        let command = parts.join(" ");
        self.calls.lock().unwrap().push(command.clone());

        match self.responses.get(&command).cloned() {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Timeout) => Err(HostError::Timeout { command, timeout }),
            Some(Scripted::Panic) => panic!("scripted panic running {command}"),
            None => Err(HostError::Spawn {
                command,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}

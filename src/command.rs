use std::process::{ExitStatus, Stdio};
use std::thread::JoinHandle;

use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("failed to parse command line: {0}")]
    Parse(#[from] shell_words::ParseError),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Receives the command string of a command item when it fires
pub trait CommandSink {
    fn execute(&mut self, command: &str) -> Result<(), CommandError>;
}

/// Runs commands as child processes
///
/// The command line is split with shell quoting rules; no shell is involved.
/// Each child is waited on from its own thread so it never lingers as a
/// zombie.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellCommandSink;

impl ShellCommandSink {
    pub fn new() -> Self {
        Self
    }

    /// Start `command` and wait for it in the background
    ///
    /// The handle resolves to the exit status, or `None` if waiting failed.
    pub fn spawn(&self, command: &str) -> Result<JoinHandle<Option<ExitStatus>>, CommandError> {
        let (program, args) = split_command(command)?;
        debug!("spawning {} {:?}", program, args);
        let spawned = std::process::Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => return Err(CommandError::Spawn { program, source }),
        };

        Ok(std::thread::spawn(move || match child.wait() {
            Ok(status) => {
                if status.success() {
                    debug!("{} finished", program);
                } else {
                    warn!("{} exited with {}", program, status);
                }
                Some(status)
            }
            Err(err) => {
                error!("failed to wait for {}: {}", program, err);
                None
            }
        }))
    }
}

impl CommandSink for ShellCommandSink {
    fn execute(&mut self, command: &str) -> Result<(), CommandError> {
        self.spawn(command).map(|_| ())
    }
}

/// Records commands instead of running them
#[derive(Debug, Default, Clone)]
pub struct DryRunSink {
    executed: Vec<String>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }
}

impl CommandSink for DryRunSink {
    fn execute(&mut self, command: &str) -> Result<(), CommandError> {
        info!("would execute: {}", command);
        self.executed.push(command.to_string());
        Ok(())
    }
}

fn split_command(command: &str) -> Result<(String, Vec<String>), CommandError> {
    let mut words = shell_words::split(command)?.into_iter();
    let program = words.next().ok_or(CommandError::Empty)?;
    Ok((program, words.collect()))
}

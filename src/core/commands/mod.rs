use std::collections::BTreeMap;
use std::path::PathBuf;

mod cd;
mod exit;
mod status;

pub use cd::CdCommand;
pub use exit::ExitCommand;
pub use status::StatusCommand;

use super::state::ShellState;
use super::Flow;
use crate::parser::ParsedCommand;
use crate::process::{self, ExitOutcome, ProcessError};

#[derive(Debug)]
pub enum CommandError {
    InvalidArguments(String),
    ChangeDirectory { path: PathBuf, source: std::io::Error },
    HomeDirNotFound,
    Process(ProcessError),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::InvalidArguments(msg) => write!(f, "{}", msg),
            CommandError::ChangeDirectory { path, source } => {
                write!(f, "cd: {}: {}", path.display(), source)
            }
            CommandError::HomeDirNotFound => write!(f, "cd: HOME not set"),
            CommandError::Process(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<ProcessError> for CommandError {
    fn from(err: ProcessError) -> Self {
        CommandError::Process(err)
    }
}

/// A command run inside the interpreter itself.
pub trait Command {
    fn execute(&self, args: &[String], state: &mut ShellState) -> Result<Flow, CommandError>;
}

#[derive(Clone)]
enum CommandType {
    Cd(CdCommand),
    Exit(ExitCommand),
    Status(StatusCommand),
}

impl Command for CommandType {
    fn execute(&self, args: &[String], state: &mut ShellState) -> Result<Flow, CommandError> {
        match self {
            CommandType::Cd(cmd) => cmd.execute(args, state),
            CommandType::Exit(cmd) => cmd.execute(args, state),
            CommandType::Status(cmd) => cmd.execute(args, state),
        }
    }
}

/// Routes a parsed line to a built-in or to a child process.
#[derive(Clone)]
pub struct CommandExecutor {
    commands: BTreeMap<&'static str, CommandType>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        let mut commands = BTreeMap::new();
        commands.insert("cd", CommandType::Cd(CdCommand::new()));
        commands.insert("exit", CommandType::Exit(ExitCommand::new()));
        commands.insert("status", CommandType::Status(StatusCommand::new()));
        Self { commands }
    }

    /// Built-ins ignore redirection and `&`. A failing built-in leaves the
    /// last status at `exit value 1`.
    pub fn execute(
        &self,
        command: &ParsedCommand,
        state: &mut ShellState,
    ) -> Result<Flow, CommandError> {
        match self.commands.get(command.program.as_str()) {
            Some(builtin) => {
                tracing::debug!(builtin = %command.program, "running built-in");
                builtin.execute(command.args(), state).inspect_err(|_| {
                    state.record(ExitOutcome::Exited(1));
                })
            }
            None => {
                process::launch(command, state)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn is_builtin(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn builtin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }
}

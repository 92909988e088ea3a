use super::{Command, CommandError};
use crate::core::state::ShellState;
use crate::core::Flow;

/// Terminates and reaps every background child, then asks the loop to stop.
/// The process itself is left for the caller to end.
#[derive(Clone)]
pub struct ExitCommand;

impl Default for ExitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ExitCommand {
    fn execute(&self, _args: &[String], state: &mut ShellState) -> Result<Flow, CommandError> {
        for report in state.jobs.terminate_all() {
            tracing::debug!(pid = report.pid, outcome = %report.outcome, "terminated on exit");
        }
        Ok(Flow::Exit)
    }
}

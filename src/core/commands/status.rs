use super::{Command, CommandError};
use crate::core::state::ShellState;
use crate::core::Flow;

#[derive(Clone)]
pub struct StatusCommand;

impl Default for StatusCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Command for StatusCommand {
    fn execute(&self, _args: &[String], state: &mut ShellState) -> Result<Flow, CommandError> {
        println!("{}", state.last_outcome());
        Ok(Flow::Continue)
    }
}

use crate::core::Flow;
use crate::error::ShellError;
use crate::parser::{parse, tokenize};

/// The core's contract with the prompt loop: one raw line in, a decision out.
pub trait CommandHandler {
    fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError>;
}

impl CommandHandler for super::Shell {
    fn execute_line(&mut self, line: &str) -> Result<Flow, ShellError> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return Ok(Flow::Continue);
        }

        let command = parse(&tokens, self.state.foreground_only())?;
        tracing::debug!(?command, "parsed line");

        Ok(self.executor.execute(&command, &mut self.state)?)
    }
}

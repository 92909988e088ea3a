use crate::process::{signal, ExitOutcome, JobTable};

/// Interpreter state that outlives a single line.
#[derive(Debug, Default)]
pub struct ShellState {
    last_outcome: ExitOutcome,
    pub jobs: JobTable,
}

impl ShellState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the most recent foreground command.
    pub fn last_outcome(&self) -> ExitOutcome {
        self.last_outcome
    }

    pub fn last_exit_status(&self) -> Option<i32> {
        self.last_outcome.exit_code()
    }

    pub fn last_signal(&self) -> Option<i32> {
        self.last_outcome.signal()
    }

    pub fn record(&mut self, outcome: ExitOutcome) {
        self.last_outcome = outcome;
    }

    pub fn foreground_only(&self) -> bool {
        signal::foreground_only()
    }
}

use std::fmt;
use std::io;

pub mod jobs;
pub mod launcher;
pub mod signal;
pub mod status;

pub use jobs::{JobReport, JobTable};
pub use launcher::launch;
pub use status::ExitOutcome;

/// Exit code of a child whose redirection could not be opened or bound.
pub const REDIRECT_FAILURE: i32 = 126;

/// Exit code of a child whose program could not be found or run.
pub const EXEC_FAILURE: i32 = 127;

#[derive(Debug)]
pub enum ProcessError {
    Fork(io::Error),
    Wait(io::Error),
    SignalError(String),
    InvalidArgument(String),
}

impl ProcessError {
    /// Fork and signal-setup failures leave the interpreter unable to run
    /// anything else.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessError::Fork(_) | ProcessError::SignalError(_))
    }
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Fork(e) => write!(f, "fork failed: {}", e),
            ProcessError::Wait(e) => write!(f, "wait failed: {}", e),
            ProcessError::SignalError(msg) => write!(f, "signal error: {}", msg),
            ProcessError::InvalidArgument(arg) => {
                write!(f, "argument contains a NUL byte: {:?}", arg)
            }
        }
    }
}

impl std::error::Error for ProcessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProcessError::Fork(e) | ProcessError::Wait(e) => Some(e),
            _ => None,
        }
    }
}

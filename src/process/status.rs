use std::fmt;

use libc::c_int;

/// How a child finished. A child either exits or is killed, never both, so
/// the exit code and the signal number are never reported together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Exited(i32),
    Signaled(i32),
}

impl ExitOutcome {
    /// Decodes a raw status word filled in by `waitpid`.
    pub fn from_wait_status(status: c_int) -> Self {
        if libc::WIFSIGNALED(status) {
            ExitOutcome::Signaled(libc::WTERMSIG(status))
        } else {
            ExitOutcome::Exited(libc::WEXITSTATUS(status))
        }
    }

    pub fn exit_code(self) -> Option<i32> {
        match self {
            ExitOutcome::Exited(code) => Some(code),
            ExitOutcome::Signaled(_) => None,
        }
    }

    pub fn signal(self) -> Option<i32> {
        match self {
            ExitOutcome::Signaled(signo) => Some(signo),
            ExitOutcome::Exited(_) => None,
        }
    }
}

impl Default for ExitOutcome {
    fn default() -> Self {
        ExitOutcome::Exited(0)
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exit value {}", code),
            ExitOutcome::Signaled(signo) => write!(f, "terminated by signal {}", signo),
        }
    }
}

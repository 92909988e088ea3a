use std::collections::BTreeSet;
use std::fmt;
use std::io;

use libc::{c_int, pid_t};

use super::signal::TERMINATE_CHILDREN;
use super::{ExitOutcome, ProcessError};

/// Completion notice for one background child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub pid: pid_t,
    pub outcome: ExitOutcome,
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background pid {} is done: {}", self.pid, self.outcome)
    }
}

enum Poll {
    Running,
    Done(ExitOutcome),
    Gone,
}

/// Background children that have been started but not yet reported.
#[derive(Debug, Default)]
pub struct JobTable {
    running: BTreeSet<pid_t>,
    finished: Vec<JobReport>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly spawned background child and makes one
    /// non-blocking attempt to collect it. A child that is already gone is
    /// queued for the next [`JobTable::reap`], never reported here.
    pub fn track(&mut self, pid: pid_t) {
        self.running.insert(pid);
        match poll(pid) {
            Ok(Poll::Running) => {}
            Ok(Poll::Done(outcome)) => {
                self.running.remove(&pid);
                self.finished.push(JobReport { pid, outcome });
            }
            Ok(Poll::Gone) => {
                self.running.remove(&pid);
            }
            Err(e) => tracing::warn!(pid, "initial poll failed: {}", e),
        }
    }

    pub fn contains(&self, pid: pid_t) -> bool {
        self.running.contains(&pid)
    }

    /// Number of children not yet collected.
    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty() && self.finished.is_empty()
    }

    /// Collects every background child that has finished, without blocking.
    pub fn reap(&mut self) -> Vec<JobReport> {
        let mut reports = std::mem::take(&mut self.finished);

        let pids: Vec<pid_t> = self.running.iter().copied().collect();
        for pid in pids {
            match poll(pid) {
                Ok(Poll::Running) => continue,
                Ok(Poll::Done(outcome)) => reports.push(JobReport { pid, outcome }),
                Ok(Poll::Gone) => tracing::warn!(pid, "background child vanished before reaping"),
                Err(e) => tracing::warn!(pid, "dropping background child: {}", e),
            }
            self.running.remove(&pid);
        }

        for report in &reports {
            tracing::debug!(pid = report.pid, outcome = %report.outcome, "reaped");
        }
        reports
    }

    /// Signals every outstanding child with [`TERMINATE_CHILDREN`] and blocks
    /// until each one has been collected.
    pub fn terminate_all(&mut self) -> Vec<JobReport> {
        let mut reports = std::mem::take(&mut self.finished);

        for &pid in &self.running {
            if unsafe { libc::kill(pid, TERMINATE_CHILDREN) } == -1 {
                tracing::debug!(pid, "kill failed: {}", io::Error::last_os_error());
            }
        }

        for pid in std::mem::take(&mut self.running) {
            match wait_blocking(pid) {
                Ok(status) => reports.push(JobReport {
                    pid,
                    outcome: ExitOutcome::from_wait_status(status),
                }),
                Err(ProcessError::Wait(e)) if e.raw_os_error() == Some(libc::ECHILD) => {}
                Err(e) => tracing::warn!(pid, "could not collect child: {}", e),
            }
        }
        reports
    }
}

fn poll(pid: pid_t) -> Result<Poll, ProcessError> {
    let mut status: c_int = 0;
    loop {
        match unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) } {
            0 => return Ok(Poll::Running),
            -1 => {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::EINTR) => continue,
                    Some(libc::ECHILD) => return Ok(Poll::Gone),
                    _ => return Err(ProcessError::Wait(err)),
                }
            }
            _ => return Ok(Poll::Done(ExitOutcome::from_wait_status(status))),
        }
    }
}

/// Blocks until `pid` terminates, retrying when a signal interrupts the wait.
pub(crate) fn wait_blocking(pid: pid_t) -> Result<c_int, ProcessError> {
    let mut status: c_int = 0;
    loop {
        if unsafe { libc::waitpid(pid, &mut status, 0) } != -1 {
            return Ok(status);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(ProcessError::Wait(err));
        }
    }
}

use std::io;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, Ordering};

use libc::{c_int, SIGINT, SIGTERM, SIGTSTP, SIG_DFL, SIG_ERR, SIG_IGN};

use crate::process::ProcessError;

pub const ENTER_FOREGROUND_ONLY: &str = "\nEntering foreground-only mode (& is now ignored)\n";
pub const EXIT_FOREGROUND_ONLY: &str = "\nExiting foreground-only mode\n";

/// Signal sent to background children by `exit`.
pub const TERMINATE_CHILDREN: c_int = SIGTERM;

static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Whether a trailing `&` is currently ignored.
pub fn foreground_only() -> bool {
    FOREGROUND_ONLY.load(Ordering::SeqCst)
}

/// Runs in signal context: one atomic flip and one raw write, nothing else.
pub(crate) fn toggle_foreground_only() {
    toggle_and_notify(libc::STDOUT_FILENO);
}

fn toggle_and_notify(fd: c_int) {
    let was_active = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    let notice = if was_active {
        EXIT_FOREGROUND_ONLY
    } else {
        ENTER_FOREGROUND_ONLY
    };
    unsafe {
        libc::write(fd, notice.as_ptr().cast(), notice.len());
    }
}

/// Installs the interpreter's signal policy: SIGINT ignored, SIGTSTP
/// toggling foreground-only mode. Later calls are no-ops.
pub fn setup_signal_handlers() -> Result<(), ProcessError> {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    set_disposition(SIGINT, SIG_IGN)
        .map_err(|e| ProcessError::SignalError(format!("cannot ignore SIGINT: {}", e)))?;

    unsafe { signal_hook::low_level::register(SIGTSTP, toggle_foreground_only) }
        .map_err(|e| ProcessError::SignalError(format!("cannot handle SIGTSTP: {}", e)))?;

    tracing::debug!("signal handlers installed");
    Ok(())
}

/// Called in a freshly forked child before `execvp`. Only async-signal-safe
/// calls are made here.
pub(crate) fn reset_child_dispositions(foreground: bool) {
    unsafe {
        libc::signal(SIGTSTP, SIG_IGN);
        libc::signal(TERMINATE_CHILDREN, SIG_DFL);
        if foreground {
            libc::signal(SIGINT, SIG_DFL);
        }
    }
}

fn set_disposition(signo: c_int, handler: libc::sighandler_t) -> io::Result<()> {
    if unsafe { libc::signal(signo, handler) } == SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Keeps SIGTSTP blocked on the current thread while alive. A stop signal
/// arriving meanwhile stays pending and is handled once the guard drops.
pub struct StopSignalBlock {
    previous: libc::sigset_t,
}

impl StopSignalBlock {
    pub fn new() -> Result<Self, ProcessError> {
        unsafe {
            let mut blocked = MaybeUninit::<libc::sigset_t>::uninit();
            libc::sigemptyset(blocked.as_mut_ptr());
            libc::sigaddset(blocked.as_mut_ptr(), SIGTSTP);
            let blocked = blocked.assume_init();

            let mut previous = MaybeUninit::<libc::sigset_t>::uninit();
            let rc = libc::pthread_sigmask(libc::SIG_BLOCK, &blocked, previous.as_mut_ptr());
            if rc != 0 {
                return Err(ProcessError::SignalError(format!(
                    "cannot block SIGTSTP: {}",
                    io::Error::from_raw_os_error(rc)
                )));
            }
            Ok(Self {
                previous: previous.assume_init(),
            })
        }
    }
}

impl Drop for StopSignalBlock {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
        }
    }
}

use std::ffi::CString;
use std::io::{self, Write};
use std::ptr;

use libc::{c_char, c_int, pid_t};

use super::jobs::wait_blocking;
use super::signal::{self, StopSignalBlock};
use super::{ExitOutcome, ProcessError, EXEC_FAILURE, REDIRECT_FAILURE};
use crate::core::state::ShellState;
use crate::parser::ParsedCommand;

const NULL_DEVICE: &str = "/dev/null";
const CREATE_MODE: libc::c_uint = 0o644;

/// Binds one standard stream of the child to a file.
struct Redirect {
    path: CString,
    flags: c_int,
    target: c_int,
    failure: Vec<u8>,
}

impl Redirect {
    fn input(path: &str) -> Result<Self, ProcessError> {
        Ok(Self {
            path: c_string(path)?,
            flags: libc::O_RDONLY,
            target: libc::STDIN_FILENO,
            failure: format!("cannot open {} for input\n", path).into_bytes(),
        })
    }

    fn output(path: &str) -> Result<Self, ProcessError> {
        Ok(Self {
            path: c_string(path)?,
            flags: libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            target: libc::STDOUT_FILENO,
            failure: format!("cannot open {} for output\n", path).into_bytes(),
        })
    }

    /// Child side only.
    unsafe fn apply(&self) {
        let fd = libc::open(self.path.as_ptr(), self.flags, CREATE_MODE);
        if fd == -1 {
            fail(&self.failure, REDIRECT_FAILURE);
        }
        if fd != self.target {
            if libc::dup2(fd, self.target) == -1 {
                fail(&self.failure, REDIRECT_FAILURE);
            }
            libc::close(fd);
        }
    }
}

/// Everything the child needs, allocated before `fork` so the child never
/// touches the allocator.
struct ChildPlan {
    argv: Vec<CString>,
    input: Option<Redirect>,
    output: Option<Redirect>,
    foreground: bool,
    not_found: Vec<u8>,
}

impl ChildPlan {
    fn new(command: &ParsedCommand) -> Result<Self, ProcessError> {
        let argv = command
            .arguments
            .iter()
            .map(|arg| c_string(arg))
            .collect::<Result<Vec<_>, _>>()?;

        let input = match (&command.input_file, command.background) {
            (Some(path), _) => Some(Redirect::input(path)?),
            (None, true) => Some(Redirect::input(NULL_DEVICE)?),
            (None, false) => None,
        };
        let output = match (&command.output_file, command.background) {
            (Some(path), _) => Some(Redirect::output(path)?),
            (None, true) => Some(Redirect::output(NULL_DEVICE)?),
            (None, false) => None,
        };

        Ok(Self {
            argv,
            input,
            output,
            foreground: !command.background,
            not_found: format!("{}: no such file or directory\n", command.program).into_bytes(),
        })
    }

    /// Runs in the forked child and never returns.
    unsafe fn exec(&self, argv: &[*const c_char]) -> ! {
        signal::reset_child_dispositions(self.foreground);

        if let Some(input) = &self.input {
            input.apply();
        }
        if let Some(output) = &self.output {
            output.apply();
        }

        libc::execvp(argv[0], argv.as_ptr());
        fail(&self.not_found, EXEC_FAILURE)
    }
}

fn c_string(value: &str) -> Result<CString, ProcessError> {
    CString::new(value).map_err(|_| ProcessError::InvalidArgument(value.to_string()))
}

unsafe fn fail(message: &[u8], code: c_int) -> ! {
    libc::write(libc::STDERR_FILENO, message.as_ptr().cast(), message.len());
    libc::_exit(code)
}

/// Runs an external command in a child process.
///
/// Foreground commands are waited for with SIGTSTP held off and their
/// outcome is recorded in `state`. Background commands are handed to the
/// job table and announced; their completion surfaces later through
/// [`super::JobTable::reap`].
pub fn launch(command: &ParsedCommand, state: &mut ShellState) -> Result<(), ProcessError> {
    let plan = ChildPlan::new(command)?;
    let mut argv: Vec<*const c_char> = plan.argv.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(ptr::null());

    // Nothing buffered may be duplicated into the child.
    let _ = io::stdout().flush();

    let pid: pid_t = unsafe { libc::fork() };
    match pid {
        -1 => Err(ProcessError::Fork(io::Error::last_os_error())),
        0 => unsafe { plan.exec(&argv) },
        pid if command.background => {
            tracing::debug!(pid, program = %command.program, "spawned background child");
            state.jobs.track(pid);
            println!("background pid is {}", pid);
            Ok(())
        }
        pid => {
            tracing::debug!(pid, program = %command.program, "spawned foreground child");
            let outcome = {
                let _stop_held = StopSignalBlock::new()?;
                let outcome = ExitOutcome::from_wait_status(wait_blocking(pid)?);
                if let ExitOutcome::Signaled(signo) = outcome {
                    println!("terminated by signal {}", signo);
                }
                outcome
            };
            state.record(outcome);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, tokenize};
    use crate::process::JobReport;
    use std::error::Error;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};

    fn command(line: &str) -> ParsedCommand {
        parse(&tokenize(line), false).expect("valid test command")
    }

    /// `sh -c <script>`, built by hand so `$$` reaches the child's shell
    /// instead of being expanded to the test process.
    fn shell_script(script: &str, background: bool) -> ParsedCommand {
        ParsedCommand {
            program: "sh".into(),
            arguments: vec!["sh".into(), "-c".into(), script.into()],
            input_file: None,
            output_file: None,
            background,
        }
    }

    fn wait_for_report(state: &mut ShellState) -> Vec<JobReport> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut reports = Vec::new();
        while reports.is_empty() && Instant::now() < deadline {
            reports = state.jobs.reap();
            thread::sleep(Duration::from_millis(20));
        }
        reports
    }

    #[test]
    fn test_foreground_exit_status() -> Result<(), ProcessError> {
        let mut state = ShellState::new();
        launch(&command("false"), &mut state)?;
        assert_eq!(state.last_outcome(), ExitOutcome::Exited(1));

        launch(&command("true"), &mut state)?;
        assert_eq!(state.last_exit_status(), Some(0));
        assert_eq!(state.last_signal(), None);
        Ok(())
    }

    #[test]
    fn test_output_redirection() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out.txt");
        let mut state = ShellState::new();

        launch(&command(&format!("echo hi > {}", out.display())), &mut state)?;

        assert_eq!(fs::read_to_string(&out)?, "hi\n");
        assert_eq!(state.last_outcome().to_string(), "exit value 0");
        Ok(())
    }

    #[test]
    fn test_output_redirection_truncates() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out.txt");
        fs::write(&out, "a much longer previous content\n")?;
        let mut state = ShellState::new();

        launch(&command(&format!("echo new > {}", out.display())), &mut state)?;

        assert_eq!(fs::read_to_string(&out)?, "new\n");
        Ok(())
    }

    #[test]
    fn test_input_redirection() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("in.txt");
        let out = dir.path().join("out.txt");
        fs::write(&input, "line one\nline two\n")?;
        let mut state = ShellState::new();

        let line = format!("wc -l < {} > {}", input.display(), out.display());
        launch(&command(&line), &mut state)?;

        assert_eq!(fs::read_to_string(&out)?.trim(), "2");
        assert_eq!(state.last_exit_status(), Some(0));
        Ok(())
    }

    #[test]
    fn test_missing_input_file_fails_child() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.txt");
        let mut state = ShellState::new();

        launch(&command(&format!("cat < {}", missing.display())), &mut state)?;

        assert_eq!(state.last_outcome(), ExitOutcome::Exited(REDIRECT_FAILURE));
        Ok(())
    }

    #[test]
    fn test_unknown_program_fails_child() -> Result<(), ProcessError> {
        let mut state = ShellState::new();
        launch(&command("definitely-not-a-real-program-4c1f"), &mut state)?;
        assert_eq!(state.last_outcome(), ExitOutcome::Exited(EXEC_FAILURE));
        Ok(())
    }

    #[test]
    fn test_unwritable_output_fails_child() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("no-such-dir").join("out.txt");
        let mut state = ShellState::new();

        launch(&command(&format!("echo hi > {}", out.display())), &mut state)?;

        assert_eq!(state.last_outcome(), ExitOutcome::Exited(REDIRECT_FAILURE));
        assert!(!out.exists());
        Ok(())
    }

    #[test]
    fn test_foreground_signal_is_recorded() -> Result<(), ProcessError> {
        let mut state = ShellState::new();
        launch(&shell_script("kill -KILL $$", false), &mut state)?;
        assert_eq!(state.last_outcome(), ExitOutcome::Signaled(libc::SIGKILL));
        assert_eq!(state.last_exit_status(), None);
        Ok(())
    }

    #[test]
    fn test_background_is_tracked_and_reaped_later() -> Result<(), Box<dyn Error>> {
        let mut state = ShellState::new();
        let before = state.last_outcome();

        launch(&command("true &"), &mut state)?;

        // Background completion never touches the foreground status.
        assert_eq!(state.last_outcome(), before);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut reports = Vec::new();
        while reports.is_empty() && Instant::now() < deadline {
            reports = state.jobs.reap();
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, ExitOutcome::Exited(0));
        assert!(state.jobs.is_empty());
        Ok(())
    }

    #[test]
    fn test_background_streams_default_to_null_device() -> Result<(), Box<dyn Error>> {
        let mut state = ShellState::new();

        // `cat` would block forever on an inherited terminal or pipe.
        launch(&shell_script("cat; echo visible", true), &mut state)?;
        let reports = wait_for_report(&mut state);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, ExitOutcome::Exited(0));

        let script = r#"[ "$(readlink /proc/$$/fd/0)" = /dev/null ] && [ "$(readlink /proc/$$/fd/1)" = /dev/null ]"#;
        launch(&shell_script(script, true), &mut state)?;
        let reports = wait_for_report(&mut state);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, ExitOutcome::Exited(0));
        Ok(())
    }

    #[test]
    fn test_background_redirection_overrides_null_device() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let out = dir.path().join("out.txt");
        let mut state = ShellState::new();

        launch(&command(&format!("echo kept > {} &", out.display())), &mut state)?;
        let reports = wait_for_report(&mut state);

        assert_eq!(reports.len(), 1);
        assert_eq!(fs::read_to_string(&out)?, "kept\n");
        Ok(())
    }

    #[test]
    fn test_foreground_child_restores_interrupt() -> Result<(), ProcessError> {
        signal::setup_signal_handlers()?;
        let mut state = ShellState::new();

        launch(&shell_script("kill -INT $$; exit 3", false), &mut state)?;

        assert_eq!(state.last_outcome(), ExitOutcome::Signaled(libc::SIGINT));
        Ok(())
    }

    #[test]
    fn test_foreground_child_ignores_stop() -> Result<(), ProcessError> {
        signal::setup_signal_handlers()?;
        let mut state = ShellState::new();

        launch(&shell_script("kill -TSTP $$; exit 5", false), &mut state)?;

        assert_eq!(state.last_outcome(), ExitOutcome::Exited(5));
        Ok(())
    }

    #[test]
    fn test_background_child_keeps_interrupt_and_stop_ignored() -> Result<(), Box<dyn Error>> {
        signal::setup_signal_handlers()?;
        let mut state = ShellState::new();

        launch(&shell_script("kill -INT $$; kill -TSTP $$; exit 7", true), &mut state)?;
        let reports = wait_for_report(&mut state);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, ExitOutcome::Exited(7));
        Ok(())
    }

    #[test]
    fn test_nul_byte_is_rejected_before_fork() {
        let mut state = ShellState::new();
        let cmd = ParsedCommand {
            program: "echo".into(),
            arguments: vec!["echo".into(), "bad\0arg".into()],
            input_file: None,
            output_file: None,
            background: false,
        };
        assert!(matches!(
            launch(&cmd, &mut state),
            Err(ProcessError::InvalidArgument(_))
        ));
    }
}

use std::io::{self, Write};
use std::path::PathBuf;

mod executor;

pub use executor::CommandHandler;

use crate::{
    core::{commands::CommandExecutor, state::ShellState, Flow},
    error::ShellError,
    flags::Flags,
    highlight::SyntaxHighlighter,
    input::{LineReader, ReadOutcome, ShellCompleter},
    process::signal,
};

const HISTORY_FILE: &str = ".smallsh_history";

pub struct Shell {
    pub(crate) reader: LineReader,
    pub(crate) executor: CommandExecutor,
    pub(crate) state: ShellState,
    pub(crate) highlighter: SyntaxHighlighter,
}

impl Shell {
    pub fn new(flags: &Flags) -> Result<Self, ShellError> {
        let reader = LineReader::from_stdin(
            || {
                let builtins = CommandExecutor::new();
                ShellCompleter::new(builtins.builtin_names(), SyntaxHighlighter::new())
            },
            history_path(flags),
        )?;

        Ok(Self::with_reader(reader))
    }

    /// A shell reading from an arbitrary source, with default built-ins.
    pub fn with_reader(reader: LineReader) -> Self {
        let highlighter = if reader.is_interactive() {
            SyntaxHighlighter::new()
        } else {
            SyntaxHighlighter::plain()
        };

        Shell {
            reader,
            executor: CommandExecutor::new(),
            state: ShellState::new(),
            highlighter,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    /// Runs the prompt loop until `exit` or end of input. Background
    /// children never outlive the loop, however it ends.
    pub fn run(&mut self) -> Result<(), ShellError> {
        signal::setup_signal_handlers()?;
        let result = self.run_command_loop();
        if let Err(e) = &result {
            tracing::warn!("leaving after fatal error: {}", e);
        }
        for report in self.state.jobs.terminate_all() {
            tracing::debug!(pid = report.pid, outcome = %report.outcome, "terminated on shutdown");
        }
        self.reader.close();
        result
    }

    fn run_command_loop(&mut self) -> Result<(), ShellError> {
        loop {
            self.report_finished_jobs();

            let line = match self.reader.read_line()? {
                ReadOutcome::Line(line) => line,
                ReadOutcome::Eof => {
                    tracing::debug!("end of input");
                    self.execute_line("exit")?;
                    return Ok(());
                }
            };

            match self.execute_line(&line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => eprintln!("{}", self.highlighter.highlight_error(&e.to_string())),
            }
            io::stdout().flush()?;
        }
    }

    /// Prints completions collected since the previous prompt. This is the
    /// only place background results reach the terminal.
    fn report_finished_jobs(&mut self) {
        for report in self.state.jobs.reap() {
            println!("{}", report);
        }
    }
}

fn history_path(flags: &Flags) -> Option<PathBuf> {
    if flags.is_set("no-history") {
        return None;
    }
    match flags.get_value("history") {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::home_dir().map(|home| home.join(HISTORY_FILE)),
    }
}

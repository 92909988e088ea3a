use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use rustyline::{config::Configurer, error::ReadlineError, history::FileHistory, Editor};

use super::ShellCompleter;
use crate::error::ShellError;

pub const PROMPT: &str = ": ";

/// Result of one prompt cycle's read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    Eof,
}

/// Source of raw input lines. Terminals get a line editor with history;
/// anything else is read plainly, one line at a time.
pub enum LineReader {
    Interactive {
        editor: Box<Editor<ShellCompleter, FileHistory>>,
        history_file: Option<PathBuf>,
    },
    Plain(Box<dyn BufRead>),
}

impl LineReader {
    /// Picks the backend by whether stdin is a terminal.
    pub fn from_stdin(
        completer: impl FnOnce() -> ShellCompleter,
        history_file: Option<PathBuf>,
    ) -> Result<Self, ShellError> {
        if io::stdin().is_terminal() {
            Self::interactive(completer(), history_file)
        } else {
            Ok(Self::plain(io::BufReader::new(io::stdin())))
        }
    }

    pub fn interactive(
        completer: ShellCompleter,
        history_file: Option<PathBuf>,
    ) -> Result<Self, ShellError> {
        let mut editor = Editor::<ShellCompleter, FileHistory>::new()?;
        editor.set_helper(Some(completer));
        editor.set_auto_add_history(true);

        if let Some(path) = &history_file {
            if let Err(e) = editor.load_history(path) {
                tracing::debug!(path = %path.display(), "no history loaded: {}", e);
            }
        }

        Ok(LineReader::Interactive {
            editor: Box::new(editor),
            history_file,
        })
    }

    pub fn plain(reader: impl BufRead + 'static) -> Self {
        LineReader::Plain(Box::new(reader))
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, LineReader::Interactive { .. })
    }

    /// Prints the prompt and reads one line with its newline stripped.
    pub fn read_line(&mut self) -> Result<ReadOutcome, ShellError> {
        match self {
            LineReader::Interactive { editor, .. } => match editor.readline(PROMPT) {
                Ok(line) => Ok(ReadOutcome::Line(line)),
                Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Line(String::new())),
                Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
                Err(e) => Err(e.into()),
            },
            LineReader::Plain(reader) => {
                let mut stdout = io::stdout();
                stdout.write_all(PROMPT.as_bytes())?;
                stdout.flush()?;

                // Raw bytes: an invalid sequence costs one line, not the session.
                let mut raw = Vec::new();
                if reader.read_until(b'\n', &mut raw)? == 0 {
                    return Ok(ReadOutcome::Eof);
                }
                let line = String::from_utf8_lossy(&raw);
                Ok(ReadOutcome::Line(
                    line.trim_end_matches(['\n', '\r']).to_string(),
                ))
            }
        }
    }

    /// Persists history for interactive sessions.
    pub fn close(&mut self) {
        if let LineReader::Interactive {
            editor,
            history_file: Some(path),
        } = self
        {
            if let Err(e) = editor.save_history(path.as_path()) {
                tracing::warn!(path = %path.display(), "could not save history: {}", e);
            }
        }
    }
}

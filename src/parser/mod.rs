use std::fmt;

mod command;
mod tokenizer;

pub use command::{parse, ParsedCommand};
pub use tokenizer::{expand_pid, tokenize, PID_MARKER};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MissingRedirectTarget(char),
    MissingCommand,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget(op) => {
                write!(f, "missing file name after '{}'", op)
            }
            ParseError::MissingCommand => write!(f, "missing command"),
        }
    }
}

impl std::error::Error for ParseError {}

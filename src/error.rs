use crate::core::commands::CommandError;
use crate::parser::ParseError;
use crate::process::ProcessError;

#[derive(Debug)]
pub enum ShellError {
    Readline(rustyline::error::ReadlineError),
    Io(std::io::Error),
    Parse(ParseError),
    Command(CommandError),
    ProcessError(ProcessError),
    FlagError(String),
}

impl ShellError {
    /// Errors that must take the whole interpreter down rather than just
    /// the line that produced them.
    pub fn is_fatal(&self) -> bool {
        match self {
            ShellError::ProcessError(e) => e.is_fatal(),
            ShellError::Command(CommandError::Process(e)) => e.is_fatal(),
            ShellError::Readline(_) | ShellError::Io(_) => true,
            _ => false,
        }
    }
}

impl From<rustyline::error::ReadlineError> for ShellError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        ShellError::Readline(err)
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Io(err)
    }
}

impl From<ParseError> for ShellError {
    fn from(err: ParseError) -> Self {
        ShellError::Parse(err)
    }
}

impl From<CommandError> for ShellError {
    fn from(err: CommandError) -> Self {
        ShellError::Command(err)
    }
}

impl From<ProcessError> for ShellError {
    fn from(err: ProcessError) -> Self {
        ShellError::ProcessError(err)
    }
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::Readline(e) => write!(f, "readline error: {}", e),
            ShellError::Io(e) => write!(f, "IO error: {}", e),
            ShellError::Parse(e) => write!(f, "{}", e),
            ShellError::Command(e) => write!(f, "{}", e),
            ShellError::ProcessError(e) => write!(f, "{}", e),
            ShellError::FlagError(msg) => write!(f, "flag error: {}", msg),
        }
    }
}

impl std::error::Error for ShellError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let fork = ShellError::from(ProcessError::Fork(std::io::Error::from_raw_os_error(
            libc::EAGAIN,
        )));
        assert!(fork.is_fatal());

        let parse = ShellError::from(ParseError::MissingCommand);
        assert!(!parse.is_fatal());

        let cd = ShellError::from(CommandError::InvalidArguments("cd: too many arguments".into()));
        assert!(!cd.is_fatal());
    }

    #[test]
    fn test_display_passes_through_inner_message() {
        let err = ShellError::from(ParseError::MissingRedirectTarget('<'));
        assert_eq!(err.to_string(), "missing file name after '<'");
    }
}

use super::{Command, CommandError};
use crate::core::state::ShellState;
use crate::core::Flow;
use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct CdCommand;

impl Default for CdCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CdCommand {
    pub fn new() -> Self {
        Self
    }

    /// `$HOME`, or the platform home directory when the variable is unset.
    fn home_dir(&self) -> Result<PathBuf, CommandError> {
        env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or(CommandError::HomeDirNotFound)
    }
}

impl Command for CdCommand {
    fn execute(&self, args: &[String], _state: &mut ShellState) -> Result<Flow, CommandError> {
        let target = match args {
            [] => self.home_dir()?,
            [path] => PathBuf::from(path),
            _ => {
                return Err(CommandError::InvalidArguments(
                    "cd: too many arguments".to_string(),
                ))
            }
        };

        env::set_current_dir(&target).map_err(|source| CommandError::ChangeDirectory {
            path: target.clone(),
            source,
        })?;
        tracing::debug!(cwd = %target.display(), "changed directory");
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commands::tests::cwd_lock;

    #[test]
    fn test_cd_home() -> Result<(), Box<dyn std::error::Error>> {
        let _cwd = cwd_lock();
        let original = env::current_dir()?;
        let home = tempfile::tempdir()?;
        let previous_home = env::var_os("HOME");
        env::set_var("HOME", home.path());

        let result = CdCommand::new().execute(&[], &mut ShellState::new());
        let cwd = env::current_dir()?;

        env::set_current_dir(original)?;
        match previous_home {
            Some(value) => env::set_var("HOME", value),
            None => env::remove_var("HOME"),
        }
        assert_eq!(result?, Flow::Continue);
        assert_eq!(cwd.canonicalize()?, home.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_cd_temp() -> Result<(), Box<dyn std::error::Error>> {
        let _cwd = cwd_lock();
        let original = env::current_dir()?;
        let dir = tempfile::tempdir()?;
        let arg = dir.path().to_string_lossy().into_owned();

        let result = CdCommand::new().execute(&[arg], &mut ShellState::new());
        let cwd = env::current_dir()?;
        env::set_current_dir(original)?;

        assert_eq!(result?, Flow::Continue);
        assert_eq!(cwd.canonicalize()?, dir.path().canonicalize()?);
        Ok(())
    }

    #[test]
    fn test_cd_invalid() {
        let _cwd = cwd_lock();
        let result = CdCommand::new().execute(
            &["/nonexistent/path".to_string()],
            &mut ShellState::new(),
        );
        assert!(matches!(result, Err(CommandError::ChangeDirectory { .. })));
    }

    #[test]
    fn test_cd_too_many_arguments() {
        let result = CdCommand::new().execute(
            &["/tmp".to_string(), "/var".to_string()],
            &mut ShellState::new(),
        );
        assert!(matches!(result, Err(CommandError::InvalidArguments(_))));
    }
}

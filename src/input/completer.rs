use std::{borrow::Cow, collections::BTreeSet, env, fs};

use rustyline::{
    completion::{Completer, FilenameCompleter, Pair},
    highlight::{CmdKind, Highlighter},
    hint::Hinter,
    validate::Validator,
    Context, Helper,
};

use crate::highlight::SyntaxHighlighter;

/// Line-editor helper: program-name completion for the first word,
/// filename completion after it, and syntax highlighting.
pub struct ShellCompleter {
    commands: BTreeSet<String>,
    files: FilenameCompleter,
    highlighter: SyntaxHighlighter,
}

impl ShellCompleter {
    pub fn new<'a>(builtins: impl IntoIterator<Item = &'a str>, highlighter: SyntaxHighlighter) -> Self {
        let mut completer = ShellCompleter {
            commands: builtins.into_iter().map(String::from).collect(),
            files: FilenameCompleter::new(),
            highlighter,
        };
        completer.add_path_commands();
        completer
    }

    fn add_path_commands(&mut self) {
        let Some(path_var) = env::var_os("PATH") else {
            return;
        };
        for dir in env::split_paths(&path_var) {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.filter_map(Result::ok) {
                let is_program = entry
                    .file_type()
                    .map(|t| t.is_file() || t.is_symlink())
                    .unwrap_or(false);
                if let (true, Some(name)) = (is_program, entry.file_name().to_str()) {
                    self.commands.insert(name.to_string());
                }
            }
        }
    }

    pub fn complete_command(&self, prefix: &str) -> Vec<Pair> {
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(prefix))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            })
            .collect()
    }
}

impl Helper for ShellCompleter {}

impl Highlighter for ShellCompleter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(self.highlighter.highlight_command(line))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

impl Hinter for ShellCompleter {
    type Hint = String;
}

impl Validator for ShellCompleter {}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before_cursor = &line[..pos];
        let word_start = before_cursor
            .rfind(char::is_whitespace)
            .map_or(0, |i| i + 1);

        if before_cursor[..word_start].trim().is_empty() {
            Ok((word_start, self.complete_command(&before_cursor[word_start..])))
        } else {
            self.files.complete(line, pos, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_complete() {
        let completer = ShellCompleter::new(["cd", "exit", "status"], SyntaxHighlighter::plain());
        let names: Vec<String> = completer
            .complete_command("st")
            .into_iter()
            .map(|pair| pair.display)
            .collect();
        assert!(names.contains(&"status".to_string()));
        assert!(names.iter().all(|name| name.starts_with("st")));
    }
}

use inksac::prelude::*;

use crate::parser::PID_MARKER;

const BUILTINS: [&str; 3] = ["cd", "exit", "status"];

#[derive(Debug, Clone, Copy)]
pub struct SyntaxHighlighter {
    color_support: ColorSupport,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    pub fn new() -> Self {
        let support = check_color_support().unwrap_or(ColorSupport::NoColor);
        Self {
            color_support: support,
        }
    }

    /// A highlighter that never emits escape codes.
    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    /// Colours built-in names, redirection operators, a trailing `&` and
    /// `$$` markers. Whitespace is copied through untouched so the cursor
    /// position stays valid.
    pub fn highlight_command(&self, input: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) {
            return input.to_string();
        }

        let last_word_start = input
            .trim_end()
            .rfind(char::is_whitespace)
            .map_or(0, |pos| pos + 1);

        let mut out = String::with_capacity(input.len() * 2);
        let mut word_start = None;
        let mut first_word = true;

        for (pos, ch) in input.char_indices().chain(std::iter::once((input.len(), ' '))) {
            if ch.is_whitespace() {
                if let Some(start) = word_start.take() {
                    let word = &input[start..pos];
                    out.push_str(&self.highlight_word(word, first_word, start == last_word_start));
                    first_word = false;
                }
                if pos < input.len() {
                    out.push(ch);
                }
            } else if word_start.is_none() {
                word_start = Some(pos);
            }
        }

        out
    }

    fn highlight_word(&self, word: &str, is_first: bool, is_last: bool) -> String {
        let style = if is_first && BUILTINS.contains(&word) {
            Style::builder().foreground(Color::Cyan).bold().build()
        } else if word == "<" || word == ">" {
            Style::builder().foreground(Color::Yellow).bold().build()
        } else if word == "&" && is_last {
            Style::builder().foreground(Color::RGB(200, 120, 255)).build()
        } else if word.contains(PID_MARKER) {
            Style::builder().foreground(Color::Green).build()
        } else {
            return word.to_string();
        };
        word.to_string().style(style).to_string()
    }

    pub fn highlight_error(&self, error: &str) -> String {
        if matches!(self.color_support, ColorSupport::NoColor) {
            return error.to_string();
        }

        let error_style = Style::builder()
            .foreground(Color::Red)
            .bold()
            .build();

        error.style(error_style).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_highlighter_is_identity() {
        let highlighter = SyntaxHighlighter::plain();
        let line = "  cd   /tmp\t> out &";
        assert_eq!(highlighter.highlight_command(line), line);
        assert_eq!(highlighter.highlight_error("oops"), "oops");
    }
}

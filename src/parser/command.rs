use std::borrow::Cow;

use super::ParseError;

const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const BACKGROUND_MARKER: &str = "&";

/// One input line, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub program: String,
    /// Full argument vector; `arguments[0]` is the program name.
    pub arguments: Vec<String>,
    pub input_file: Option<String>,
    pub output_file: Option<String>,
    pub background: bool,
}

impl ParsedCommand {
    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or_default()
    }
}

/// Builds a [`ParsedCommand`] from already-expanded tokens.
///
/// A trailing `&` requests background execution; while `foreground_only`
/// is set it is dropped instead. An `&` anywhere else is an ordinary
/// argument.
pub fn parse(tokens: &[Cow<'_, str>], foreground_only: bool) -> Result<ParsedCommand, ParseError> {
    let mut arguments = Vec::with_capacity(tokens.len());
    let mut input_file = None;
    let mut output_file = None;
    let mut background = false;

    let mut iter = tokens.iter().enumerate();
    while let Some((index, token)) = iter.next() {
        match &**token {
            INPUT_REDIRECT => input_file = Some(redirect_target(&mut iter, '<')?),
            OUTPUT_REDIRECT => output_file = Some(redirect_target(&mut iter, '>')?),
            BACKGROUND_MARKER if index + 1 == tokens.len() => {
                background = !foreground_only;
            }
            word => arguments.push(word.to_string()),
        }
    }

    let program = arguments.first().cloned().ok_or(ParseError::MissingCommand)?;

    Ok(ParsedCommand {
        program,
        arguments,
        input_file,
        output_file,
        background,
    })
}

fn redirect_target<'a, 'b: 'a>(
    iter: &mut impl Iterator<Item = (usize, &'a Cow<'b, str>)>,
    operator: char,
) -> Result<String, ParseError> {
    match iter.next() {
        Some((_, target)) if target != INPUT_REDIRECT && target != OUTPUT_REDIRECT => {
            Ok(target.to_string())
        }
        _ => Err(ParseError::MissingRedirectTarget(operator)),
    }
}

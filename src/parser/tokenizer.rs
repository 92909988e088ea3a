use std::borrow::Cow;

/// Expands to the interpreter's own process id wherever it appears in a token.
pub const PID_MARKER: &str = "$$";

/// Splits `line` on whitespace and expands [`PID_MARKER`] in every token.
///
/// Returns no tokens for a blank line or a comment (first token starting
/// with `#`); callers treat that as "nothing to run".
pub fn tokenize(line: &str) -> Vec<Cow<'_, str>> {
    let mut words = line.split_whitespace().peekable();

    match words.peek() {
        None => return Vec::new(),
        Some(first) if first.starts_with('#') => return Vec::new(),
        Some(_) => {}
    }

    let pid = std::process::id().to_string();
    words.map(|word| expand_pid(word, &pid)).collect()
}

/// Replaces each non-overlapping `$$`, scanning left to right, with `pid`.
/// Tokens without the marker are handed back borrowed.
pub fn expand_pid<'a>(token: &'a str, pid: &str) -> Cow<'a, str> {
    if token.contains(PID_MARKER) {
        Cow::Owned(token.replace(PID_MARKER, pid))
    } else {
        Cow::Borrowed(token)
    }
}

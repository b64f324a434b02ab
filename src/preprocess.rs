//! Lexical preprocessing
//!
//! Runs before any parsing or synthesis: physical lines ending in a
//! trailing comma or backslash are joined with the next line so that
//! multi-line calls read as one logical line. All downstream line indices
//! (including clip provenance) refer to the joined array, so parsing and
//! synthesis must both start from [`join_continuation_lines`] on the same
//! text.

/// Join continuation lines into logical lines.
///
/// A line whose trimmed end is `,` or `\` absorbs the following physical
/// line with a single-space join, repeatedly. A trailing continuation at
/// end-of-input is left as-is — parsing runs on every keystroke and the
/// code is allowed to be incomplete.
pub fn join_continuation_lines(code: &str) -> Vec<String> {
    let raw: Vec<&str> = code.lines().collect();
    let mut joined = Vec::new();
    let mut i = 0;

    while i < raw.len() {
        let mut current = raw[i].to_string();
        while i + 1 < raw.len() {
            let trimmed = current.trim_end();
            if trimmed.ends_with('\\') {
                let next = raw[i + 1].trim();
                current = format!("{} {}", trimmed.trim_end_matches('\\').trim_end(), next);
                i += 1;
            } else if trimmed.ends_with(',') {
                let next = raw[i + 1].trim();
                current = format!("{} {}", trimmed, next);
                i += 1;
            } else {
                break;
            }
        }
        joined.push(current);
        i += 1;
    }

    joined
}

/// Byte position of an inline `#` comment, ignoring `#` inside string
/// literals.
pub fn inline_comment_pos(line: &str) -> Option<usize> {
    let mut in_string = false;
    let mut string_char = ' ';
    let mut prev = ' ';
    for (pos, ch) in line.char_indices() {
        if in_string {
            if ch == string_char && prev != '\\' {
                in_string = false;
            }
        } else if ch == '"' || ch == '\'' {
            in_string = true;
            string_char = ch;
        } else if ch == '#' {
            return Some(pos);
        }
        prev = ch;
    }
    None
}

/// Strip an inline `#` comment, ignoring `#` inside string literals.
///
/// Used when classifying a line; verbatim slices keep the original text.
pub fn strip_inline_comment(line: &str) -> String {
    match inline_comment_pos(line) {
        Some(pos) => line[..pos].trim().to_string(),
        None => line.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_trailing_comma() {
        let lines = join_continuation_lines("play 60,\n  amp: 0.5\nsleep 1");
        assert_eq!(lines, vec!["play 60, amp: 0.5", "sleep 1"]);
    }

    #[test]
    fn joins_repeatedly() {
        let lines = join_continuation_lines("sample :bd,\n  amp: 1,\n  rate: 2\n");
        assert_eq!(lines, vec!["sample :bd, amp: 1, rate: 2"]);
    }

    #[test]
    fn joins_backslash_continuation() {
        let lines = join_continuation_lines("play 60 \\\n+ 12");
        assert_eq!(lines, vec!["play 60 + 12"]);
    }

    #[test]
    fn tolerates_trailing_comma_at_eof() {
        let lines = join_continuation_lines("sample :bd,");
        assert_eq!(lines, vec!["sample :bd,"]);
    }

    #[test]
    fn strips_comment_outside_strings() {
        assert_eq!(strip_inline_comment("sleep 1 # half bar"), "sleep 1");
        assert_eq!(
            strip_inline_comment("sample \"kick#1.wav\""),
            "sample \"kick#1.wav\""
        );
    }
}

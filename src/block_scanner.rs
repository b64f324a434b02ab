//! Depth-tracked block extraction
//!
//! The script has no AST; blocks are found by walking lines from a header
//! that ends in `do`, `do |x|`, or `then`, counting nested openers and
//! `end` lines until the depth returns to zero. `elsif` and bare `else`
//! inside an `if` body sit at the same depth as the header and never open
//! a new level. A block with no matching `end` is consumed to end-of-input
//! rather than rejected — the scanner runs on every keystroke against code
//! that is routinely incomplete, so it never fails.

use crate::preprocess::strip_inline_comment;

/// The span of one block in the joined line array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// Index of the header line.
    pub header: usize,
    /// Index of the closing `end`, or the last input line when truncated.
    pub last: usize,
    /// Index of the first line after the block.
    pub next: usize,
    /// Whether a matching `end` was actually found.
    pub closed: bool,
}

impl BlockSpan {
    /// Body line range, excluding header and closing `end`.
    pub fn body_range(&self) -> std::ops::Range<usize> {
        let body_end = if self.closed { self.last } else { self.last + 1 };
        (self.header + 1)..body_end
    }
}

/// Does this line open a block that a matching `end` will close?
pub fn is_block_opener(line: &str) -> bool {
    let trimmed = strip_inline_comment(line);
    if trimmed.ends_with("do") || trimmed.ends_with("then") {
        return true;
    }
    // "... do |x|" / "... do |x, i|"
    if let Some(do_pos) = trimmed.rfind(" do ") {
        let after = trimmed[do_pos + 4..].trim();
        if after.starts_with('|') && after.ends_with('|') {
            return true;
        }
    }
    if trimmed == "begin" {
        return true;
    }
    // Ruby-style `def name(args)` opens without `do`
    if trimmed.starts_with("def ") {
        return true;
    }
    false
}

/// Scan the block opened at `lines[start]`.
///
/// `start` must point at a line for which [`is_block_opener`] holds (or a
/// `def` line). Returns the full span; on truncated input the span runs to
/// the last line and `closed` is false.
pub fn scan_block(lines: &[String], start: usize) -> BlockSpan {
    let mut depth = 1usize;
    let mut i = start + 1;

    while i < lines.len() {
        let stripped = strip_inline_comment(&lines[i]);

        if stripped == "end" {
            depth -= 1;
            if depth == 0 {
                return BlockSpan {
                    header: start,
                    last: i,
                    next: i + 1,
                    closed: true,
                };
            }
        } else if is_block_opener(&stripped) {
            // elsif/else continue their surrounding if and bring no `end`
            // of their own, so they never open a nested level
            if !(stripped.starts_with("elsif") || stripped == "else") {
                depth += 1;
            }
        }

        i += 1;
    }

    // Ran off the end of the input: hand back whatever accumulated.
    BlockSpan {
        header: start,
        last: lines.len().saturating_sub(1),
        next: lines.len(),
        closed: false,
    }
}

/// Split an `if` body into its optimistic branch, dropping everything from
/// the first depth-0 `elsif`/`else` line onward.
pub fn optimistic_branch(body: &[String]) -> Vec<String> {
    let mut depth = 0usize;
    let mut kept = Vec::new();

    for line in body {
        let stripped = strip_inline_comment(line);
        if depth == 0 && (stripped.starts_with("elsif") || stripped == "else") {
            break;
        }
        if stripped == "end" {
            depth = depth.saturating_sub(1);
        } else if is_block_opener(&stripped) && !stripped.starts_with("elsif") {
            depth += 1;
        }
        kept.push(line.clone());
    }

    kept
}

//! Beat accounting
//!
//! Sums elapsed beats over a flat sequence of lines. Only `sleep` and
//! `play_pattern_timed` at the top level of the given body contribute;
//! nested blocks are skipped wholesale. That undercounts repeated inner
//! blocks on purpose — the timeline is a visualization, not the execution
//! engine, and callers that care about repetition (`N.times`) multiply
//! explicitly.

use crate::block_scanner::{is_block_opener, scan_block};
use crate::preprocess::strip_inline_comment;
use lazy_static::lazy_static;
use std::collections::HashMap;

/// Length in seconds assumed for a sample with no table entry.
pub const DEFAULT_SAMPLE_SECS: f32 = 2.0;

lazy_static! {
    /// Approximate lengths of the stock samples the editor ships with.
    /// Values are seconds; timeline durations convert via the active bpm.
    static ref SAMPLE_LENGTH_SECS: HashMap<&'static str, f32> = {
        let mut m = HashMap::new();
        m.insert("loop_amen", 1.75);
        m.insert("loop_amen_full", 7.01);
        m.insert("loop_breakbeat", 1.68);
        m.insert("loop_compus", 6.92);
        m.insert("loop_industrial", 0.89);
        m.insert("loop_mika", 8.0);
        m.insert("loop_safari", 8.0);
        m.insert("loop_tabla", 10.67);
        m.insert("bd_haus", 0.36);
        m.insert("bd_boom", 1.71);
        m.insert("bd_tek", 0.24);
        m.insert("bd_808", 0.56);
        m.insert("sn_dolf", 0.36);
        m.insert("sn_dub", 0.28);
        m.insert("drum_cymbal_closed", 0.14);
        m.insert("drum_cymbal_open", 1.07);
        m.insert("drum_snare_hard", 0.44);
        m.insert("drum_bass_hard", 0.22);
        m.insert("ambi_choir", 4.4);
        m.insert("ambi_drone", 4.26);
        m.insert("ambi_lunar_land", 8.0);
        m.insert("ambi_piano", 2.72);
        m
    };
}

/// Parse a bare `sleep X` line.
pub fn sleep_value(line: &str) -> Option<f32> {
    let rest = strip_inline_comment(line);
    let rest = rest.strip_prefix("sleep")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    rest.trim().parse::<f32>().ok().filter(|v| *v >= 0.0)
}

/// Sum of the timing list on a `play_pattern_timed` line.
///
/// `play_pattern_timed [:c4, :e4], [0.5, 0.25]` → 0.75. The second
/// bracketed list is the per-note durations.
pub fn pattern_timed_total(line: &str) -> Option<f32> {
    let line = strip_inline_comment(line);
    if !line.starts_with("play_pattern_timed") {
        return None;
    }
    let times = extract_bracket_list(&line, 1)?;
    let mut total = 0.0;
    for item in times {
        total += item.trim().parse::<f32>().ok()?;
    }
    Some(total)
}

/// Extract the `nth` (0-based) `[...]` group on a line as raw items.
fn extract_bracket_list(line: &str, nth: usize) -> Option<Vec<String>> {
    let mut found = 0usize;
    let mut rest = line;
    loop {
        let open = rest.find('[')?;
        let close = rest[open..].find(']')? + open;
        if found == nth {
            let inner = &rest[open + 1..close];
            return Some(inner.split(',').map(|s| s.trim().to_string()).collect());
        }
        found += 1;
        rest = &rest[close + 1..];
    }
}

/// Sum elapsed beats across a flat body: every top-level `sleep` and the
/// timing totals of every top-level `play_pattern_timed`. Nested blocks
/// are skipped, not recursed into. An empty or timing-free body is 0.
pub fn flat_duration(body: &[String]) -> f32 {
    let mut total = 0.0;
    let mut i = 0;

    while i < body.len() {
        let stripped = strip_inline_comment(&body[i]);
        if stripped.is_empty() || stripped.starts_with('#') {
            i += 1;
            continue;
        }
        if is_block_opener(&stripped) {
            let span = scan_block(body, i);
            i = span.next;
            continue;
        }
        if let Some(beats) = sleep_value(&stripped) {
            total += beats;
        } else if let Some(beats) = pattern_timed_total(&stripped) {
            total += beats;
        }
        i += 1;
    }

    total
}

/// Duration in beats of a named sample at the given bpm and playback rate.
pub fn sample_duration_beats(name: &str, rate: Option<f32>, bpm: u32) -> f32 {
    let secs = SAMPLE_LENGTH_SECS
        .get(name)
        .copied()
        .unwrap_or(DEFAULT_SAMPLE_SECS);
    let beats = secs * bpm as f32 / 60.0;
    match rate {
        Some(r) if r.abs() > f32::EPSILON => beats / r.abs(),
        _ => beats,
    }
}

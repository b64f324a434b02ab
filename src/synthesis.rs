//! Surgical code synthesis
//!
//! Writes visual edits back into the source text using the provenance of
//! the most recent parse. Every function takes the full current source and
//! returns new source; edits stay inside the clip's line range (or the
//! immediately adjacent line, for timing) and never reformat anything
//! else. Provenance is only valid until the next edit — callers re-parse
//! before issuing another synthesis call. An edit whose target is not
//! textually present returns the input unchanged.
//!
//! All functions re-derive the joined line array exactly as the parser
//! does, so line indices mean the same thing on both sides.

use crate::block_scanner::scan_block;
use crate::duration::sleep_value;
use crate::extractors::leading_indent;
use crate::preprocess::{inline_comment_pos, join_continuation_lines, strip_inline_comment};
use crate::timeline::{Clip, ClipEffect, Track};
use lazy_static::lazy_static;
use regex::Regex;

/// Prefix toggled onto every line of a muted clip.
pub const MUTE_PREFIX: &str = "# MUTED ";

lazy_static! {
    // leading boundary keeps pre_amp: intact
    static ref AMP_RE: Regex = Regex::new(r"(^|[\s,(])amp:\s*-?[0-9]*\.?[0-9]+").unwrap();
    static ref SLEEP_RE: Regex = Regex::new(r"^sleep\s+-?[0-9]*\.?[0-9]+$").unwrap();
    static ref TIMES_LINE_RE: Regex = Regex::new(r"^(\s*)(\d+)(\.times\s+do.*)$").unwrap();
}

/// Render a beat/amp value the way the scripts write them: integers stay
/// integral, fractions keep their shortest form.
pub(crate) fn fmt_num(v: f32) -> String {
    if (v - v.round()).abs() < 1e-6 {
        format!("{}", v.round() as i64)
    } else {
        // trim float noise to a stable short form
        let s = format!("{:.4}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn clip_range(lines: &[String], clip: &Clip) -> Option<(usize, usize)> {
    if clip.src_line_start >= lines.len() {
        return None;
    }
    Some((clip.src_line_start, clip.src_line_end.min(lines.len() - 1)))
}

/// Rewrite every `amp:` token in `lines`; when none exists and
/// `append_if_missing` is set, append one to the first playable line.
pub(crate) fn rewrite_amp(lines: &mut [String], amp: f32, append_if_missing: bool) {
    let replacement = format!("amp: {}", fmt_num(amp));
    let with_boundary = format!("${{1}}{}", replacement);
    let mut replaced = false;
    for line in lines.iter_mut() {
        if AMP_RE.is_match(line) {
            *line = AMP_RE.replace_all(line, with_boundary.as_str()).into_owned();
            replaced = true;
        }
    }

    if !replaced && append_if_missing {
        for line in lines.iter_mut() {
            let stripped = strip_inline_comment(line);
            if stripped.starts_with("sample")
                || stripped.starts_with("play")
                || stripped.starts_with("synth ")
            {
                // Insert before any trailing comment
                let code_end = match inline_comment_pos(line) {
                    Some(pos) => line[..pos].trim_end().len(),
                    None => line.trim_end().len(),
                };
                *line = format!(
                    "{}, {}{}",
                    &line[..code_end],
                    replacement,
                    &line[code_end..]
                );
                break;
            }
        }
    }
}

/// Set a clip's amplitude: every `amp:` token inside the clip's lines is
/// rewritten; if the clip has none, `amp:` is appended to its first
/// playable line so the edit survives a re-parse.
pub fn apply_clip_amp(source: &str, clip: &Clip, amp: f32) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };

    rewrite_amp(&mut lines[start..=end], amp, true);
    lines.join("\n")
}

/// Track-level amplitude: re-dispatch per clip as `clip.amp * track_amp`.
/// Amp rewrites never add or remove lines, so every clip's provenance
/// stays valid across the whole batch.
pub fn apply_track_amp(source: &str, track: &Track, track_amp: f32) -> String {
    let mut out = source.to_string();
    for clip in &track.clips {
        out = apply_clip_amp(&out, clip, clip.amp * track_amp);
    }
    out
}

fn fx_header(indent: &str, effect: &ClipEffect) -> String {
    let mut header = format!("{}with_fx :{}", indent, effect.kind);
    for (name, value) in &effect.params {
        header.push_str(&format!(", {}: {}", name, fmt_num(*value)));
    }
    header.push_str(" do");
    header
}

/// Wrap the clip's block in a new `with_fx`, matching its indentation.
pub fn add_clip_effect(source: &str, clip: &Clip, effect: &ClipEffect) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };

    let indent = leading_indent(&lines[start]).to_string();
    lines.insert(start, fx_header(&indent, effect));
    lines.insert(end + 2, format!("{}end", indent));
    lines.join("\n")
}

/// Remove the first `with_fx :kind` wrapper found in the clip's range,
/// deleting the header and its matching `end` but keeping the body.
/// No-op when the effect is not textually present.
pub fn remove_clip_effect(source: &str, clip: &Clip, fx_kind: &str) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };

    let needle = format!("with_fx :{}", fx_kind);
    let Some(fx_line) = (start..=end).find(|&i| strip_inline_comment(&lines[i]).starts_with(&needle))
    else {
        return source.to_string();
    };

    let span = scan_block(&lines, fx_line);
    if span.closed {
        lines.remove(span.last);
    }
    lines.remove(fx_line);
    lines.join("\n")
}

/// Rewrite the parameters of an existing `with_fx :kind` line in place.
/// No-op when the effect is not textually present.
pub fn update_clip_effect(source: &str, clip: &Clip, effect: &ClipEffect) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };

    let needle = format!("with_fx :{}", effect.kind);
    for i in start..=end {
        if strip_inline_comment(&lines[i]).starts_with(&needle) {
            let indent = leading_indent(&lines[i]).to_string();
            lines[i] = fx_header(&indent, effect);
            break;
        }
    }
    lines.join("\n")
}

/// Move a clip in time by adjusting the bare `sleep` immediately before
/// it. Delta-based: the preceding sleep absorbs `new_start - old_start`
/// (clamped at zero); with no such sleep, a new one is inserted when the
/// clip moves later. Repeated edits without re-parsing compound error.
pub fn apply_clip_start(source: &str, clip: &Clip, new_start: f32) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, _)) = clip_range(&lines, clip) else {
        return source.to_string();
    };
    let delta = new_start - clip.start_beat;
    if delta.abs() < 1e-6 {
        return source.to_string();
    }

    if start > 0 {
        let prev = strip_inline_comment(&lines[start - 1]);
        if SLEEP_RE.is_match(&prev) {
            if let Some(old) = sleep_value(&prev) {
                let indent = leading_indent(&lines[start - 1]).to_string();
                let adjusted = (old + delta).max(0.0);
                lines[start - 1] = format!("{}sleep {}", indent, fmt_num(adjusted));
                return lines.join("\n");
            }
        }
    }

    if delta > 0.0 {
        let indent = leading_indent(&lines[start]).to_string();
        lines.insert(start, format!("{}sleep {}", indent, fmt_num(delta)));
    }
    lines.join("\n")
}

/// Resize a clip. Prefers rescaling an `N.times do` repeat count inside
/// the clip proportionally (rounded, floored at 1); otherwise the last
/// `sleep` inside the block absorbs the duration delta.
pub fn apply_clip_duration(source: &str, clip: &Clip, new_duration: f32) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };
    if clip.duration_beats <= 0.0 {
        return source.to_string();
    }

    // Proportional repeat-count rescale
    for i in start..=end {
        if let Some(caps) = TIMES_LINE_RE.captures(&lines[i]) {
            let indent = caps[1].to_string();
            let tail = caps[3].to_string();
            if let Ok(n) = caps[2].parse::<f32>() {
                let scaled = ((n * new_duration / clip.duration_beats).round() as i64).max(1);
                lines[i] = format!("{}{}{}", indent, scaled, tail);
                return lines.join("\n");
            }
        }
    }

    // Otherwise stretch or shrink the trailing sleep
    let delta = new_duration - clip.duration_beats;
    for i in (start..=end).rev() {
        let stripped = strip_inline_comment(&lines[i]);
        if let Some(old) = sleep_value(&stripped) {
            let indent = leading_indent(&lines[i]).to_string();
            let adjusted = (old + delta).max(0.0);
            lines[i] = format!("{}sleep {}", indent, fmt_num(adjusted));
            return lines.join("\n");
        }
    }

    source.to_string()
}

/// Toggle the `# MUTED ` prefix on every line of the clip. The only edit
/// that is exactly self-inverting by construction.
pub fn apply_clip_mute(source: &str, clip: &Clip, muted: bool) -> String {
    let mut lines = join_continuation_lines(source);
    let Some((start, end)) = clip_range(&lines, clip) else {
        return source.to_string();
    };

    for line in &mut lines[start..=end] {
        if muted {
            if !line.starts_with(MUTE_PREFIX) {
                *line = format!("{}{}", MUTE_PREFIX, line);
            }
        } else if let Some(rest) = line.strip_prefix(MUTE_PREFIX) {
            *line = rest.to_string();
        }
    }
    lines.join("\n")
}

/// Mute or unmute every clip on a track.
pub fn apply_track_mute(source: &str, track: &Track, muted: bool) -> String {
    let mut out = source.to_string();
    for clip in &track.clips {
        out = apply_clip_mute(&out, clip, muted);
    }
    out
}

//! Script → timeline projection
//!
//! A single left-to-right pass over the joined lines, dispatching on line
//! shape and maintaining a global beat cursor plus the current section
//! label. Sequential constructs advance the cursor by their computed
//! duration; concurrent ones (`live_loop`, `loop`, `in_thread`) and
//! instantaneous hits (bare `sample`/`play`) do not. Anything unrecognized
//! that opens a block is consumed wholesale and discarded so it can never
//! be mis-read as flat statements.
//!
//! The pass never fails: malformed or truncated input degrades to fewer
//! clips, because the editor re-parses on every keystroke and must always
//! have something to render.

use crate::block_scanner::{is_block_opener, optimistic_branch, scan_block};
use crate::duration::{flat_duration, pattern_timed_total, sample_duration_beats, sleep_value};
use crate::extractors::{
    extract_amp, extract_fx_params, extract_rate, extract_symbol, extract_envelope,
    is_assignment, is_bare_identifier, sample_display_name,
};
use crate::preprocess::{join_continuation_lines, strip_inline_comment};
use crate::timeline::{
    Clip, ClipEffect, ClipKind, SectionMarker, TimelineData, MIN_TOTAL_BEATS,
};
use crate::track_registry::TrackRegistry;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"^##\s*-+\s*(.*?)\s*-+\s*##$").unwrap();
    static ref TIMES_RE: Regex = Regex::new(r"^(\d+)\.times\s+do(\s*\|[^|]*\|)?$").unwrap();
}

/// Global settings recognized (and skipped) without emitting a clip.
const PRAGMAS: [&str; 11] = [
    "use_bpm",
    "use_bpm_mul",
    "use_synth",
    "use_synth_defaults",
    "use_sample_defaults",
    "use_sample_pack",
    "use_random_seed",
    "use_debug",
    "use_octave",
    "use_timing_guarantees",
    "use_sched_ahead_time",
];

/// Parse a buffer's source into its timeline projection.
///
/// `fallback_bpm` applies only when the script has no `use_bpm` pragma.
/// This never fails; incomplete code yields a partial model.
pub fn parse_timeline(code: &str, buffer_id: u32, fallback_bpm: u32) -> TimelineData {
    let lines = join_continuation_lines(code);
    let bpm = scan_bpm(&lines).unwrap_or(fallback_bpm).max(1);
    let functions = collect_definitions(&lines);

    let mut pass = Pass {
        lines: &lines,
        bpm,
        buffer_id,
        functions,
        cursor: 0.0,
        section: None,
        registry: TrackRegistry::new(),
        sections: Vec::new(),
        clip_seq: 0,
        max_end: 0.0,
    };
    pass.run();

    let total_beats = pass.max_end.max(pass.cursor).max(MIN_TOTAL_BEATS);
    TimelineData {
        tracks: pass.registry.into_tracks(),
        bpm,
        total_beats,
        sections: pass.sections,
    }
}

/// First `use_bpm N` wins; later pragmas are ignored.
fn scan_bpm(lines: &[String]) -> Option<u32> {
    for line in lines {
        let stripped = strip_inline_comment(line);
        if let Some(rest) = stripped.strip_prefix("use_bpm") {
            if rest.starts_with(char::is_whitespace) {
                if let Ok(v) = rest.trim().parse::<f32>() {
                    if v >= 1.0 {
                        return Some(v.round() as u32);
                    }
                }
            }
        }
    }
    None
}

/// Collect `define :name do … end` and `def name … end` bodies so that
/// bare calls can be inlined at their call sites.
fn collect_definitions(lines: &[String]) -> HashMap<String, Vec<String>> {
    let mut functions = HashMap::new();
    let mut i = 0;

    while i < lines.len() {
        let stripped = strip_inline_comment(&lines[i]);
        if stripped.starts_with("define") && is_block_opener(&stripped) {
            let name = extract_symbol(&stripped).unwrap_or_else(|| "unnamed".to_string());
            let span = scan_block(lines, i);
            functions.insert(name, lines[span.body_range()].to_vec());
            i = span.next;
        } else if stripped.starts_with("def ") {
            let rest = stripped[4..].trim();
            let name_end = rest.find('(').or_else(|| rest.find(' ')).unwrap_or(rest.len());
            let name = rest[..name_end].trim().to_string();
            let span = scan_block(lines, i);
            functions.insert(name, lines[span.body_range()].to_vec());
            i = span.next;
        } else {
            i += 1;
        }
    }

    functions
}

/// What one block body contains, seen through the timeline's eyes.
struct BodyInfo {
    /// Times-aware duration: depth-0 `N.times` blocks contribute
    /// iteration × count; otherwise the flat duration.
    duration: f32,
    /// Plain flat duration, ignoring repetition.
    flat: f32,
    kind: Option<ClipKind>,
    effects: Vec<ClipEffect>,
    samples: Vec<String>,
    amp: Option<f32>,
    has_stop: bool,
    /// Value of a leading bare `sleep` before any playable line.
    lead_sleep: f32,
}

fn analyze_body(body: &[String]) -> BodyInfo {
    let mut effects = Vec::new();
    let mut samples = Vec::new();
    let mut amp = None;
    let mut has_sample = false;
    let mut has_synth = false;
    let mut has_stop = false;
    let mut times_total = 0.0f32;
    let mut depth = 0usize;

    for i in 0..body.len() {
        let stripped = strip_inline_comment(&body[i]);
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        if stripped == "end" {
            depth = depth.saturating_sub(1);
            continue;
        }

        if depth == 0 {
            if let Some(caps) = TIMES_RE.captures(&stripped) {
                if let Ok(n) = caps[1].parse::<f32>() {
                    let span = scan_block(body, i);
                    times_total += n * flat_duration(&body[span.body_range()]);
                }
            }
        }

        if stripped.starts_with("with_fx") {
            if let Some(sym) = extract_symbol(&stripped) {
                effects.push(ClipEffect::with_params(sym, extract_fx_params(&stripped)));
            }
        } else if stripped.starts_with("sample") {
            if let Some(name) = sample_display_name(&stripped) {
                samples.push(name);
                has_sample = true;
                if amp.is_none() {
                    amp = extract_amp(&stripped);
                }
            }
        } else if stripped.starts_with("play") || stripped.starts_with("synth ") {
            has_synth = true;
            if amp.is_none() {
                amp = extract_amp(&stripped);
            }
        } else if stripped == "stop" {
            has_stop = true;
        }

        if is_block_opener(&stripped) && !stripped.starts_with("elsif") && stripped != "else" {
            depth += 1;
        }
    }

    let flat = flat_duration(body);
    let duration = if times_total > 0.0 { times_total } else { flat };

    let kind = match (has_sample, has_synth) {
        (true, true) => Some(ClipKind::Mixed),
        (true, false) => Some(ClipKind::Sample),
        (false, true) => Some(ClipKind::Synth),
        (false, false) => None,
    };

    // A sleep before the first playable line reads as an internal offset;
    // with nothing playable after it, it's just the loop's period.
    let mut lead_sleep = 0.0;
    if has_sample || has_synth {
        for line in body {
            let stripped = strip_inline_comment(line);
            if stripped.is_empty() || stripped.starts_with('#') {
                continue;
            }
            if let Some(v) = sleep_value(&stripped) {
                lead_sleep = v;
            }
            break;
        }
    }

    BodyInfo {
        duration,
        flat,
        kind,
        effects,
        samples,
        amp,
        has_stop,
        lead_sleep,
    }
}

struct Pass<'a> {
    lines: &'a [String],
    bpm: u32,
    buffer_id: u32,
    functions: HashMap<String, Vec<String>>,
    cursor: f32,
    section: Option<String>,
    registry: TrackRegistry,
    sections: Vec<SectionMarker>,
    clip_seq: usize,
    max_end: f32,
}

impl<'a> Pass<'a> {
    fn run(&mut self) {
        let mut i = 0;
        while i < self.lines.len() {
            i = self.handle_line(i);
        }
    }

    /// Dispatch one logical line; returns the index to continue from.
    fn handle_line(&mut self, i: usize) -> usize {
        let raw = self.lines[i].trim();
        if raw.is_empty() {
            return i + 1;
        }

        // Section markers are comments, so they must win before the
        // comment skip: `## ---- Intro ---- ##`
        if let Some(caps) = SECTION_RE.captures(raw) {
            let label = caps[1].to_string();
            debug!(beat = self.cursor, label = %label, "section marker");
            self.sections.push(SectionMarker {
                label: label.clone(),
                beat_start: self.cursor,
            });
            self.section = Some(label);
            return i + 1;
        }

        let stripped = strip_inline_comment(raw);
        if stripped.is_empty() || stripped.starts_with('#') {
            return i + 1;
        }

        if let Some(word) = stripped.split_whitespace().next() {
            if PRAGMAS.contains(&word) {
                return i + 1;
            }
        }

        // Definitions were collected up front; skip their bodies here.
        if (stripped.starts_with("define") && is_block_opener(&stripped))
            || stripped.starts_with("def ")
        {
            return scan_block(self.lines, i).next;
        }

        if is_assignment(&stripped) {
            // `x = something do … end` still owns a block; eat it whole.
            if is_block_opener(&stripped) {
                return scan_block(self.lines, i).next;
            }
            return i + 1;
        }

        if stripped.starts_with("live_loop") && is_block_opener(&stripped) {
            return self.handle_live_loop(i, &stripped);
        }
        if stripped.starts_with("loop do") {
            return self.handle_anonymous_loop(i);
        }
        if stripped.starts_with("in_thread") && is_block_opener(&stripped) {
            return self.handle_in_thread(i);
        }
        if let Some(caps) = TIMES_RE.captures(&stripped) {
            let count = caps[1].parse::<u32>().unwrap_or(1);
            return self.handle_times(i, count);
        }
        if stripped.starts_with("with_fx") && is_block_opener(&stripped) {
            return self.handle_with_fx(i, &stripped);
        }
        if stripped.starts_with("with_synth") && is_block_opener(&stripped) {
            return self.handle_with_synth(i, &stripped);
        }
        // covers with_bpm_mul as well
        if stripped.starts_with("with_bpm") && is_block_opener(&stripped) {
            return self.handle_with_bpm(i, &stripped);
        }
        if (stripped.starts_with("if ") || stripped.starts_with("unless "))
            && is_block_opener(&stripped)
        {
            return self.handle_conditional(i, &stripped);
        }
        if stripped.contains(".each") && is_block_opener(&stripped) {
            return self.handle_each(i, &stripped);
        }
        if stripped.starts_with("play_pattern_timed") {
            return self.handle_pattern_timed(i, &stripped);
        }
        if stripped.starts_with("sample") {
            if let Some(name) = sample_display_name(&stripped) {
                return self.handle_sample(i, &stripped, name);
            }
        }
        if stripped.starts_with("play ") || stripped.starts_with("play(") {
            return self.handle_play(i, &stripped);
        }
        if let Some(beats) = sleep_value(&stripped) {
            self.cursor += beats;
            return i + 1;
        }
        if is_bare_identifier(&stripped) && self.functions.contains_key(&stripped) {
            return self.handle_call(i, &stripped);
        }

        // Unknown block-introducing construct: consume and discard so its
        // body can't be mis-parsed as flat statements.
        if is_block_opener(&stripped) {
            let span = scan_block(self.lines, i);
            debug!(line = i, "discarding unrecognized block");
            return span.next;
        }

        i + 1
    }

    fn next_clip_id(&mut self) -> String {
        let id = format!("clip-{}", self.clip_seq);
        self.clip_seq += 1;
        id
    }

    fn base_clip(&mut self, name: &str, start: f32, raw_duration: f32, code: String,
                 kind: ClipKind, src: (usize, usize)) -> Clip {
        let duration = Clip::clamp_duration(raw_duration);
        if start + duration > self.max_end {
            self.max_end = start + duration;
        }
        Clip {
            id: self.next_clip_id(),
            name: name.to_string(),
            start_beat: start,
            duration_beats: duration,
            code,
            kind,
            color: String::new(),
            amp: 1.0,
            effects: Vec::new(),
            is_looping: false,
            loop_count: 1,
            samples: Vec::new(),
            src_line_start: src.0,
            src_line_end: src.1,
            buffer_id: self.buffer_id,
        }
    }

    fn slice(&self, from: usize, to: usize) -> String {
        self.lines[from..=to].join("\n")
    }

    fn handle_live_loop(&mut self, i: usize, header: &str) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        let name = extract_symbol(header).unwrap_or_else(|| "loop".to_string());

        let start = self.cursor + info.lead_sleep;
        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            &name,
            start,
            info.duration,
            code,
            info.kind.unwrap_or(ClipKind::Sample),
            (i, span.last),
        );
        clip.is_looping = !info.has_stop;
        clip.loop_count = if info.has_stop { 1 } else { 0 };
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);
        debug!(name = %name, start, duration = clip.duration_beats, looping = clip.is_looping, "live_loop clip");

        let section = self.section.clone();
        self.registry.add_clip(&name, section.as_deref(), clip);
        // Loops run concurrently with later top-level code.
        span.next
    }

    fn handle_anonymous_loop(&mut self, i: usize) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);

        let start = self.cursor + info.lead_sleep;
        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            "loop",
            start,
            info.duration,
            code,
            info.kind.unwrap_or(ClipKind::Sample),
            (i, span.last),
        );
        clip.is_looping = true;
        clip.loop_count = 0;
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Loop", section.as_deref(), clip);
        span.next
    }

    fn handle_in_thread(&mut self, i: usize) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);

        let start = self.cursor + info.lead_sleep;
        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            "thread",
            start,
            info.duration,
            code,
            info.kind.unwrap_or(ClipKind::Sample),
            (i, span.last),
        );
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Thread", section.as_deref(), clip);
        // Threads run alongside the main sequence.
        span.next
    }

    fn handle_times(&mut self, i: usize, count: u32) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        let raw = info.flat * count as f32;

        let code = self.slice(i, span.last);
        let name = format!("{}.times", count);
        let mut clip = self.base_clip(
            &name,
            self.cursor,
            raw,
            code,
            info.kind.unwrap_or(ClipKind::Synth),
            (i, span.last),
        );
        clip.loop_count = count.max(1);
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Loop", section.as_deref(), clip);
        self.cursor += raw;
        span.next
    }

    fn handle_with_fx(&mut self, i: usize, header: &str) -> usize {
        let fx = extract_symbol(header).unwrap_or_else(|| "reverb".to_string());
        let params = extract_fx_params(header);
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        let raw = info.flat;

        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            &fx,
            self.cursor,
            raw,
            code,
            info.kind.unwrap_or(ClipKind::Mixed),
            (i, span.last),
        );
        let mut effects = vec![ClipEffect::with_params(fx.clone(), params)];
        effects.extend(info.effects);
        clip.effects = effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let track = format!("FX: {}", fx);
        let section = self.section.clone();
        self.registry.add_clip(&track, section.as_deref(), clip);
        self.cursor += raw;
        span.next
    }

    fn handle_with_synth(&mut self, i: usize, header: &str) -> usize {
        let synth = extract_symbol(header).unwrap_or_else(|| "synth".to_string());
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        let raw = info.flat;

        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            &synth,
            self.cursor,
            raw,
            code,
            ClipKind::Synth,
            (i, span.last),
        );
        clip.effects = info.effects;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip(&synth, section.as_deref(), clip);
        self.cursor += raw;
        span.next
    }

    fn handle_with_bpm(&mut self, i: usize, header: &str) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        // The tempo value does not rescale nested durations; the clip just
        // marks the block's extent.
        let raw = info.flat;

        let name = header
            .trim_end_matches("do")
            .trim_end_matches("then")
            .trim()
            .to_string();
        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            &name,
            self.cursor,
            raw,
            code,
            info.kind.unwrap_or(ClipKind::Mixed),
            (i, span.last),
        );
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("BPM Block", section.as_deref(), clip);
        self.cursor += raw;
        span.next
    }

    fn handle_conditional(&mut self, i: usize, header: &str) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        // Optimistic: assume the condition holds and render only the first
        // branch; elsif/else never materialize.
        let branch = optimistic_branch(body);
        let info = analyze_body(&branch);
        let raw = info.flat;

        if raw > 0.0 {
            let name = header
                .trim_end_matches("do")
                .trim_end_matches("then")
                .trim()
                .to_string();
            let code = self.slice(i, span.last);
            let mut clip = self.base_clip(
                &name,
                self.cursor,
                raw,
                code,
                info.kind.unwrap_or(ClipKind::Mixed),
                (i, span.last),
            );
            clip.effects = info.effects;
            clip.samples = info.samples;
            clip.amp = info.amp.unwrap_or(1.0);

            let section = self.section.clone();
            self.registry.add_clip("Conditional", section.as_deref(), clip);
            self.cursor += raw;
        }
        span.next
    }

    fn handle_each(&mut self, i: usize, header: &str) -> usize {
        let span = scan_block(self.lines, i);
        let body = &self.lines[span.body_range()];
        let info = analyze_body(body);
        // Collection length is unknown statically; count one pass.
        let raw = info.flat;

        let name = header
            .split(" do")
            .next()
            .unwrap_or(header)
            .trim()
            .to_string();
        let code = self.slice(i, span.last);
        let mut clip = self.base_clip(
            &name,
            self.cursor,
            raw,
            code,
            info.kind.unwrap_or(ClipKind::Synth),
            (i, span.last),
        );
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Iteration", section.as_deref(), clip);
        self.cursor += raw;
        span.next
    }

    fn handle_pattern_timed(&mut self, i: usize, line: &str) -> usize {
        let raw = pattern_timed_total(line).unwrap_or(0.0);
        let code = self.lines[i].clone();
        let mut clip = self.base_clip("pattern", self.cursor, raw, code, ClipKind::Synth, (i, i));
        clip.amp = extract_amp(line).unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Synth Pattern", section.as_deref(), clip);
        // A pattern is sequential, unlike a bare simultaneous hit.
        self.cursor += raw;
        i + 1
    }

    fn handle_sample(&mut self, i: usize, line: &str, name: String) -> usize {
        let rate = extract_rate(line);
        let raw = sample_duration_beats(&name, rate, self.bpm);
        let code = self.lines[i].clone();
        let mut clip = self.base_clip(&name, self.cursor, raw, code, ClipKind::Sample, (i, i));
        clip.samples = vec![name];
        clip.amp = extract_amp(line).unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Samples", section.as_deref(), clip);
        // An immediate hit; time only moves via sleep.
        i + 1
    }

    fn handle_play(&mut self, i: usize, line: &str) -> usize {
        let (attack, sustain, release) = extract_envelope(line);
        let raw = attack + sustain + release;
        let name = play_arg(line);
        let code = self.lines[i].clone();
        let mut clip = self.base_clip(&name, self.cursor, raw, code, ClipKind::Synth, (i, i));
        clip.amp = extract_amp(line).unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip("Synth", section.as_deref(), clip);
        i + 1
    }

    fn handle_call(&mut self, i: usize, name: &str) -> usize {
        let body = self.functions.get(name).cloned().unwrap_or_default();
        let info = analyze_body(&body);
        let raw = info.duration;
        debug!(name = %name, duration = raw, "inlining call");

        let code = self.lines[i].clone();
        let mut clip = self.base_clip(
            name,
            self.cursor,
            raw,
            code,
            info.kind.unwrap_or(ClipKind::Synth),
            (i, i),
        );
        clip.effects = info.effects;
        clip.samples = info.samples;
        clip.amp = info.amp.unwrap_or(1.0);

        let section = self.section.clone();
        self.registry.add_clip(name, section.as_deref(), clip);
        self.cursor += raw;
        i + 1
    }
}

/// First argument of a `play` line, respecting parentheses:
/// `play chord(:e3, :minor), amp: 2` → `chord(:e3, :minor)`.
fn play_arg(line: &str) -> String {
    let rest = line.trim().strip_prefix("play").unwrap_or(line).trim_start();
    let mut depth = 0usize;
    let mut out = String::new();
    for ch in rest.chars() {
        match ch {
            '(' => {
                depth += 1;
                out.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(ch);
            }
            ',' if depth == 0 => break,
            _ => out.push(ch),
        }
    }
    let arg = out.trim().to_string();
    if arg.is_empty() {
        "play".to_string()
    } else {
        arg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> TimelineData {
        parse_timeline(code, 0, 60)
    }

    #[test]
    fn sleep_accumulates_before_sample() {
        let t = parse("sleep 0.5\nsleep 0.25\nsample :kick\n");
        let track = t.tracks.iter().find(|tr| tr.name == "Samples").unwrap();
        assert!((track.clips[0].start_beat - 0.75).abs() < 1e-6);
    }

    #[test]
    fn use_bpm_first_occurrence_wins() {
        let t = parse("use_bpm 90\nuse_bpm 140\n");
        assert_eq!(t.bpm, 90);
    }

    #[test]
    fn fallback_bpm_applies_without_pragma() {
        let t = parse_timeline("sleep 1\n", 0, 133);
        assert_eq!(t.bpm, 133);
    }

    #[test]
    fn live_loop_times_duration() {
        let t = parse("live_loop :x do\n  3.times do\n    sleep 0.5\n  end\nend\n");
        let clip = &t.tracks[0].clips[0];
        assert!((clip.duration_beats - 1.5).abs() < 1e-6);
        assert!(clip.is_looping);
        assert_eq!(clip.loop_count, 0);
    }

    #[test]
    fn stop_makes_live_loop_one_shot() {
        let t = parse("live_loop :x do\n  sample :bd_haus\n  sleep 1\n  stop\nend\n");
        let clip = &t.tracks[0].clips[0];
        assert!(!clip.is_looping);
        assert_eq!(clip.loop_count, 1);
    }

    #[test]
    fn leading_sleep_offsets_start_without_moving_cursor() {
        let t = parse("live_loop :x do\n  sleep 2\n  sample :bd_haus\nend\nsample :kick\n");
        let x = t.tracks.iter().find(|tr| tr.name == "x").unwrap();
        assert!((x.clips[0].start_beat - 2.0).abs() < 1e-6);
        let samples = t.tracks.iter().find(|tr| tr.name == "Samples").unwrap();
        assert!((samples.clips[0].start_beat - 0.0).abs() < 1e-6);
    }

    #[test]
    fn section_marker_recorded_at_cursor() {
        let t = parse("## ---- Intro ---- ##\nsample :kick\n");
        assert_eq!(t.sections.len(), 1);
        assert_eq!(t.sections[0].label, "Intro");
        assert!((t.sections[0].beat_start - 0.0).abs() < 1e-6);
    }

    #[test]
    fn unterminated_block_still_parses() {
        let t = parse("live_loop :x do\n  sample :kick\n");
        assert_eq!(t.tracks.len(), 1);
        assert_eq!(t.tracks[0].clips.len(), 1);
    }

    #[test]
    fn unknown_block_is_discarded_whole() {
        let t = parse("weird_thing do\n  sample :kick\n  sleep 4\nend\nsample :bd_haus\n");
        // the sample inside the unknown block must not leak out
        let samples = t.tracks.iter().find(|tr| tr.name == "Samples").unwrap();
        assert_eq!(samples.clips.len(), 1);
        assert_eq!(samples.clips[0].name, "bd_haus");
        assert!((samples.clips[0].start_beat - 0.0).abs() < 1e-6);
    }

    #[test]
    fn define_inlines_at_call_site() {
        let code = "define :riff do\n  play 60, release: 0.5\n  sleep 1\nend\nriff\nsample :kick\n";
        let t = parse(code);
        let riff = t.tracks.iter().find(|tr| tr.name == "riff").unwrap();
        assert!((riff.clips[0].duration_beats - 1.0).abs() < 1e-6);
        // the call advanced the cursor
        let samples = t.tracks.iter().find(|tr| tr.name == "Samples").unwrap();
        assert!((samples.clips[0].start_beat - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pattern_timed_advances_cursor() {
        let t = parse("play_pattern_timed [:c4, :e4], [0.5, 0.25]\nsample :kick\n");
        let samples = t.tracks.iter().find(|tr| tr.name == "Samples").unwrap();
        assert!((samples.clips[0].start_beat - 0.75).abs() < 1e-6);
    }

    #[test]
    fn total_beats_has_floor() {
        let t = parse("sample :bd_haus\n");
        assert!((t.total_beats - 16.0).abs() < 1e-6);
    }
}

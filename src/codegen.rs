//! Batch code generation
//!
//! Regenerates a whole script from a timeline: `use_bpm` header, clips in
//! start-beat order with gap `sleep`s for the silence between them,
//! section markers reinjected at their beats, and track-level effects
//! wrapped around clips whose own code has none. Used for full
//! reconstructions only — per-gesture edits go through the synthesizer,
//! which touches far less text.

use crate::preprocess::strip_inline_comment;
use crate::synthesis::{fmt_num, rewrite_amp};
use crate::timeline::{Clip, TimelineData, Track};

/// Does re-parsing this clip's construct move the beat cursor past it?
/// Mirrors the parser's rules so regenerated gap sleeps land right.
fn advances_cursor(code: &str) -> bool {
    let first = code
        .lines()
        .map(strip_inline_comment)
        .find(|l| !l.is_empty() && !l.starts_with('#'))
        .unwrap_or_default();

    if first.starts_with("live_loop")
        || first.starts_with("loop do")
        || first.starts_with("in_thread")
    {
        return false;
    }
    if first.starts_with("play_pattern_timed") {
        return true;
    }
    if first.starts_with("sample") || first.starts_with("play ") || first.starts_with("play(") {
        return false;
    }
    true
}

fn section_line(label: &str) -> String {
    format!("## ---- {} ---- ##", label)
}

/// Regenerate source text from a timeline.
pub fn generate_source(timeline: &TimelineData) -> String {
    let mut out: Vec<String> = Vec::new();
    out.push(format!("use_bpm {}", timeline.bpm));
    out.push(String::new());

    // Clips in start-beat order; muted tracks stay out of the score.
    let mut clips: Vec<(&Clip, &Track)> = timeline
        .tracks
        .iter()
        .filter(|t| !t.muted)
        .flat_map(|t| t.clips.iter().map(move |c| (c, t)))
        .collect();
    clips.sort_by(|(a, _), (b, _)| {
        a.start_beat
            .partial_cmp(&b.start_beat)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut sections: Vec<_> = timeline.sections.iter().collect();
    sections.sort_by(|a, b| {
        a.beat_start
            .partial_cmp(&b.beat_start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut next_section = 0usize;

    let mut cursor = 0.0f32;
    for (clip, track) in clips {
        // Reinject any markers due before this clip, sleeping up to their
        // beat first so they land where they were.
        while next_section < sections.len()
            && sections[next_section].beat_start <= clip.start_beat + 1e-6
        {
            let marker = sections[next_section];
            if marker.beat_start > cursor + 1e-6 {
                out.push(format!("sleep {}", fmt_num(marker.beat_start - cursor)));
                cursor = marker.beat_start;
            }
            out.push(section_line(&marker.label));
            next_section += 1;
        }

        if clip.start_beat > cursor + 1e-6 {
            out.push(format!("sleep {}", fmt_num(clip.start_beat - cursor)));
            cursor = clip.start_beat;
        }

        let mut code_lines: Vec<String> = clip.code.lines().map(|l| l.to_string()).collect();
        let effective_amp = clip.amp * track.amp;
        let force_amp = (effective_amp - 1.0).abs() > 1e-6;
        rewrite_amp(&mut code_lines, effective_amp, force_amp);

        // Track effects wrap the clip only when its own code has none.
        if !track.effects.is_empty() && !clip.code.contains("with_fx") {
            for effect in track.effects.iter().rev() {
                let mut header = format!("with_fx :{}", effect.kind);
                for (name, value) in &effect.params {
                    header.push_str(&format!(", {}: {}", name, fmt_num(*value)));
                }
                header.push_str(" do");
                code_lines.insert(0, header);
                code_lines.push("end".to_string());
            }
        }

        out.extend(code_lines);
        out.push(String::new());

        if advances_cursor(&clip.code) {
            cursor += clip.duration_beats;
        }
    }

    // Markers past the last clip still close out the score.
    for marker in &sections[next_section..] {
        out.push(section_line(&marker.label));
    }

    let mut text = out.join("\n");
    while text.ends_with('\n') {
        text.pop();
    }
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline_parser::parse_timeline;

    #[test]
    fn emits_bpm_header() {
        let t = parse_timeline("use_bpm 90\nsample :bd_haus\n", 0, 60);
        let out = generate_source(&t);
        assert!(out.starts_with("use_bpm 90\n"));
    }

    #[test]
    fn emits_gap_sleeps_between_clips() {
        let t = parse_timeline("sleep 2\nsample :bd_haus\n", 0, 60);
        let out = generate_source(&t);
        assert!(out.contains("sleep 2\nsample :bd_haus"));
    }

    #[test]
    fn muted_tracks_are_skipped() {
        let mut t = parse_timeline("sample :bd_haus\n", 0, 60);
        t.tracks[0].muted = true;
        let out = generate_source(&t);
        assert!(!out.contains("sample"));
    }

    #[test]
    fn section_markers_are_reinjected() {
        let t = parse_timeline("## ---- Intro ---- ##\nsample :bd_haus\n", 0, 60);
        let out = generate_source(&t);
        assert!(out.contains("## ---- Intro ---- ##"));
    }

    #[test]
    fn track_effects_wrap_unwrapped_clips() {
        let mut t = parse_timeline("sample :bd_haus\n", 0, 60);
        t.tracks[0].effects.push(crate::timeline::ClipEffect::with_params(
            "reverb",
            vec![("room".into(), 0.6)],
        ));
        let out = generate_source(&t);
        assert!(out.contains("with_fx :reverb, room: 0.6 do\nsample :bd_haus\nend"));
    }
}

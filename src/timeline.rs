//! Timeline data model
//!
//! The structured projection of a live-coding script: named tracks holding
//! clips positioned in beats, plus section markers and a global tempo.
//! Everything here is a fresh, disposable snapshot of the source text —
//! the only persisted state is the script itself. Field names serialize in
//! camelCase because the model crosses the editor IPC boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Visual floor for clip lengths so zero-duration events stay clickable.
/// Cursor arithmetic always uses the unfloored duration.
pub const MIN_CLIP_BEATS: f32 = 0.25;

/// Timelines never render shorter than this many beats.
pub const MIN_TOTAL_BEATS: f32 = 16.0;

/// What kind of sound source a clip represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    Sample,
    Synth,
    Mixed,
}

/// A single effect applied to a clip or track, e.g. `with_fx :reverb, room: 0.8`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipEffect {
    #[serde(rename = "type")]
    pub kind: String,
    pub params: BTreeMap<String, f32>,
}

impl ClipEffect {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(kind: impl Into<String>, params: Vec<(String, f32)>) -> Self {
        Self {
            kind: kind.into(),
            params: params.into_iter().collect(),
        }
    }
}

/// One rendered rectangle on the timeline: an audible event or repeating
/// block, with provenance back into the source it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub name: String,
    pub start_beat: f32,
    /// Clamped to [`MIN_CLIP_BEATS`] for display.
    pub duration_beats: f32,
    /// Verbatim slice of the joined source lines this clip came from.
    pub code: String,
    #[serde(rename = "type")]
    pub kind: ClipKind,
    pub color: String,
    pub amp: f32,
    pub effects: Vec<ClipEffect>,
    /// `true` means the clip repeats forever and `loop_count` is 0.
    pub is_looping: bool,
    /// 0 = infinite, otherwise the finite repeat count.
    pub loop_count: u32,
    pub samples: Vec<String>,
    /// 0-based inclusive range into the joined line array of the parse
    /// that produced this clip. Stale after any subsequent edit.
    pub src_line_start: usize,
    pub src_line_end: usize,
    pub buffer_id: u32,
}

impl Clip {
    /// Display duration: the raw duration with the visual floor applied.
    pub fn clamp_duration(raw: f32) -> f32 {
        if raw < MIN_CLIP_BEATS {
            MIN_CLIP_BEATS
        } else {
            raw
        }
    }

    pub fn end_beat(&self) -> f32 {
        self.start_beat + self.duration_beats
    }
}

/// A named lane grouping related clips. Identity is name-based within one
/// parse; ids and colors are not stable across parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub clips: Vec<Clip>,
    pub muted: bool,
    pub solo: bool,
    pub amp: f32,
    /// Track-level effects; only mute/amp are synced back to source.
    pub effects: Vec<ClipEffect>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A user comment delimiting a named timeline region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMarker {
    pub label: String,
    pub beat_start: f32,
}

/// The full timeline projection of one buffer's source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineData {
    pub tracks: Vec<Track>,
    pub bpm: u32,
    pub total_beats: f32,
    pub sections: Vec<SectionMarker>,
}

impl TimelineData {
    /// Iterate every clip across all tracks.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    /// Find a clip by id.
    pub fn find_clip(&self, id: &str) -> Option<&Clip> {
        self.clips().find(|c| c.id == id)
    }
}

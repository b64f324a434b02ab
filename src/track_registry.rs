//! Track registry
//!
//! Maps semantic track names (a loop name, or a category like "Samples")
//! to tracks for the duration of one parse. Two constructs that resolve to
//! the same name land on the same track. Colors rotate through a fixed
//! palette in creation order; the registry is created fresh per parse so
//! ids and colors are deterministic for a given input but not stable
//! across edits.

use crate::timeline::{Clip, Track};
use std::collections::HashMap;

/// Lane colors, assigned round-robin as tracks are created.
pub const TRACK_PALETTE: [&str; 8] = [
    "#e06c75", "#61afef", "#98c379", "#c678dd", "#d19a66", "#56b6c2", "#e5c07b", "#abb2bf",
];

pub struct TrackRegistry {
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Color the next created track would receive.
    pub fn next_color(&self) -> &'static str {
        TRACK_PALETTE[self.tracks.len() % TRACK_PALETTE.len()]
    }

    /// Fetch the track for `name`, creating it (tagged with the current
    /// section) on first sight.
    pub fn track_mut(&mut self, name: &str, section: Option<&str>) -> &mut Track {
        if let Some(&idx) = self.index.get(name) {
            return &mut self.tracks[idx];
        }
        let idx = self.tracks.len();
        let track = Track {
            id: format!("track-{}", idx),
            name: name.to_string(),
            clips: Vec::new(),
            muted: false,
            solo: false,
            amp: 1.0,
            effects: Vec::new(),
            color: self.next_color().to_string(),
            section: section.map(|s| s.to_string()),
        };
        self.tracks.push(track);
        self.index.insert(name.to_string(), idx);
        &mut self.tracks[idx]
    }

    /// Push a clip onto the named track, inheriting the track color when
    /// the clip has none of its own.
    pub fn add_clip(&mut self, name: &str, section: Option<&str>, mut clip: Clip) {
        let track = self.track_mut(name, section);
        if clip.color.is_empty() {
            clip.color = track.color.clone();
        }
        track.clips.push(clip);
    }

    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

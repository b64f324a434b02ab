//! # Chronon - Script/Timeline Bridge
//!
//! Chronon is the bidirectional transformer between a textual live-coding
//! script (a Sonic Pi-flavored subset) and a structured timeline of tracks
//! and clips for visual editing. It parses source text into a disposable
//! timeline projection, and writes visual edits (move, resize, re-amplify,
//! add/remove effect, mute) surgically back into the original text without
//! disturbing unrelated formatting — no AST, just depth-tracked line
//! scanning and provenance ranges.
//!
//! ## Core Features
//!
//! - **Keystroke-tolerant parsing**: runs on every edit, never fails;
//!   truncated blocks and unknown constructs degrade to fewer clips
//! - **Beat accounting**: sequential time (`sleep`, `play_pattern_timed`),
//!   repetition (`N.times`), concurrency (`live_loop`, `in_thread`), and
//!   optimistic `if`/`unless` evaluation feed one global beat cursor
//! - **Name-keyed tracks**: loops and categories merge into stable lanes
//!   with a rotating color palette, reset per parse
//! - **Surgical synthesis**: per-gesture rewrites confined to a clip's
//!   source lines, plus a batch generator for full reconstructions
//!
//! ## Quick Start
//!
//! ```rust
//! use chronon::timeline_parser::parse_timeline;
//!
//! let source = "use_bpm 120\nlive_loop :drums do\n  sample :bd_haus\n  sleep 1\nend\n";
//! let timeline = parse_timeline(source, 0, 120);
//!
//! assert_eq!(timeline.bpm, 120);
//! assert_eq!(timeline.tracks[0].name, "drums");
//! assert!(timeline.tracks[0].clips[0].is_looping);
//! ```
//!
//! Editing flows back through the synthesizer using provenance from the
//! most recent parse:
//!
//! ```rust
//! use chronon::timeline_parser::parse_timeline;
//! use chronon::synthesis::apply_clip_amp;
//!
//! let source = "live_loop :drums do\n  sample :bd_haus\n  sleep 1\nend\n";
//! let timeline = parse_timeline(source, 0, 120);
//! let clip = &timeline.tracks[0].clips[0];
//!
//! let edited = apply_clip_amp(source, clip, 0.7);
//! let refreshed = parse_timeline(&edited, 0, 120);
//! assert!((refreshed.tracks[0].clips[0].amp - 0.7).abs() < 1e-6);
//! ```
//!
//! ## Architecture
//!
//! 1. [`preprocess`] joins continuation lines into logical lines
//! 2. [`block_scanner`] finds block extents by depth tracking
//! 3. [`extractors`] and [`duration`] read fields and account beats
//! 4. [`timeline_parser`] runs the construct handlers in one pass over
//!    the lines, building [`timeline`] data via [`track_registry`]
//! 5. [`synthesis`] maps edits back onto exact line ranges
//! 6. [`codegen`] regenerates whole scripts from a timeline
//!
//! The source text is the only persisted state; every timeline is a fresh
//! projection of it, and re-parsing is the sole arbiter after any edit.

pub mod block_scanner;
pub mod codegen;
pub mod duration;
pub mod extractors;
pub mod preprocess;
pub mod synthesis;
pub mod timeline;
pub mod timeline_parser;
pub mod track_registry;

pub use timeline::{Clip, ClipEffect, ClipKind, SectionMarker, TimelineData, Track};
pub use timeline_parser::parse_timeline;

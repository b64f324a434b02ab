//! Edit round-trips: every synthesis function is checked by re-parsing
//! its output, the same way the editor reconciles optimistic UI state.

use chronon::synthesis::{
    add_clip_effect, apply_clip_amp, apply_clip_duration, apply_clip_mute, apply_clip_start,
    apply_track_amp, apply_track_mute, remove_clip_effect, update_clip_effect, MUTE_PREFIX,
};
use chronon::timeline::{Clip, ClipEffect, TimelineData};
use chronon::timeline_parser::parse_timeline;

fn parse(code: &str) -> TimelineData {
    parse_timeline(code, 0, 60)
}

fn clip_named<'a>(t: &'a TimelineData, name: &str) -> &'a Clip {
    t.clips()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no clip named {name}"))
}

#[test]
fn amp_change_round_trips() {
    let src = "live_loop :a do\n  sample :bd_haus, amp: 1\n  sleep 1\nend";
    let t = parse(src);
    let edited = apply_clip_amp(src, clip_named(&t, "a"), 0.7);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "a").amp - 0.7).abs() < 1e-6);
}

#[test]
fn amp_change_works_without_existing_token() {
    let src = "sample :loop_amen";
    let t = parse(src);
    let edited = apply_clip_amp(src, clip_named(&t, "loop_amen"), 0.3);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "loop_amen").amp - 0.3).abs() < 1e-6);
}

#[test]
fn amp_edit_touches_only_the_clip_range() {
    let src = "sample :kick, amp: 2\nlive_loop :a do\n  sample :bd_haus, amp: 1\n  sleep 1\nend";
    let t = parse(src);
    let edited = apply_clip_amp(src, clip_named(&t, "a"), 0.5);
    // the unrelated top-level sample keeps its amp
    assert!(edited.contains("sample :kick, amp: 2"));
    assert!(edited.contains("amp: 0.5"));
}

#[test]
fn track_amp_re_dispatches_per_clip() {
    let src = "live_loop :a do\n  sample :bd_haus, amp: 0.8\n  sleep 1\nend";
    let t = parse(src);
    let track = t.tracks.iter().find(|tr| tr.name == "a").unwrap();
    let edited = apply_track_amp(src, track, 0.5);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "a").amp - 0.4).abs() < 1e-6);
}

#[test]
fn effect_add_then_remove_restores_source() {
    let src = "live_loop :a do\n  sample :bd_haus\n  sleep 1\nend";
    let t = parse(src);
    let fx = ClipEffect::with_params("echo", vec![("mix".into(), 0.3)]);
    let with_fx = add_clip_effect(src, clip_named(&t, "a"), &fx);

    // the effect is now parseable...
    let t2 = parse(&with_fx);
    let fx_clip = clip_named(&t2, "echo");
    assert_eq!(fx_clip.effects[0].kind, "echo");

    // ...and removing it restores the exact original text
    let removed = remove_clip_effect(&with_fx, fx_clip, "echo");
    assert_eq!(removed, src);
    assert!(parse(&removed).clips().all(|c| c.effects.is_empty()));
}

#[test]
fn add_effect_matches_clip_indentation() {
    let src = "live_loop :outer do\n  4.times do\n    sample :bd_haus\n    sleep 1\n  end\nend";
    let t = parse(src);
    let clip = clip_named(&t, "outer");
    let fx = ClipEffect::new("reverb");
    let edited = add_clip_effect(src, clip, &fx);
    assert!(edited.starts_with("with_fx :reverb do\nlive_loop :outer do"));
    assert!(edited.ends_with("end\nend"));
}

#[test]
fn update_effect_rewrites_params_in_place() {
    let src = "with_fx :reverb, room: 0.5 do\n  sample :bd_haus\n  sleep 1\nend";
    let t = parse(src);
    let clip = clip_named(&t, "reverb");
    let fx = ClipEffect::with_params(
        "reverb",
        vec![("mix".into(), 0.4), ("room".into(), 0.9)],
    );
    let edited = update_clip_effect(src, clip, &fx);
    let t2 = parse(&edited);
    let params = &clip_named(&t2, "reverb").effects[0].params;
    assert!((params["mix"] - 0.4).abs() < 1e-6);
    assert!((params["room"] - 0.9).abs() < 1e-6);
}

#[test]
fn removing_a_missing_effect_returns_input_unchanged() {
    let src = "live_loop :a do\n  sample :bd_haus\nend";
    let t = parse(src);
    assert_eq!(remove_clip_effect(src, clip_named(&t, "a"), "flanger"), src);
}

#[test]
fn start_edit_adjusts_preceding_sleep_and_round_trips() {
    let src = "sleep 1\nsample :loop_amen";
    let t = parse(src);
    let edited = apply_clip_start(src, clip_named(&t, "loop_amen"), 3.5);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "loop_amen").start_beat - 3.5).abs() < 1e-6);
}

#[test]
fn start_edit_clamps_at_zero() {
    let src = "sleep 1\nsample :loop_amen";
    let t = parse(src);
    let edited = apply_clip_start(src, clip_named(&t, "loop_amen"), -5.0);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "loop_amen").start_beat - 0.0).abs() < 1e-6);
}

#[test]
fn start_edit_inserts_sleep_when_missing() {
    let src = "sample :loop_amen";
    let t = parse(src);
    let edited = apply_clip_start(src, clip_named(&t, "loop_amen"), 2.0);
    assert_eq!(edited, "sleep 2\nsample :loop_amen");
}

#[test]
fn duration_edit_rescales_times_count_and_round_trips() {
    let src = "live_loop :x do\n  3.times do\n    sleep 0.5\n  end\nend";
    let t = parse(src);
    let edited = apply_clip_duration(src, clip_named(&t, "x"), 3.0);
    assert!(edited.contains("6.times do"));
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "x").duration_beats - 3.0).abs() < 1e-6);
}

#[test]
fn duration_edit_times_count_floors_at_one() {
    let src = "live_loop :x do\n  4.times do\n    sleep 1\n  end\nend";
    let t = parse(src);
    let edited = apply_clip_duration(src, clip_named(&t, "x"), 0.01);
    assert!(edited.contains("1.times do"));
}

#[test]
fn duration_edit_falls_back_to_trailing_sleep() {
    let src = "with_fx :reverb do\n  sample :bd_haus\n  sleep 1\nend";
    let t = parse(src);
    let edited = apply_clip_duration(src, clip_named(&t, "reverb"), 2.5);
    let t2 = parse(&edited);
    assert!((clip_named(&t2, "reverb").duration_beats - 2.5).abs() < 1e-6);
}

#[test]
fn mute_is_exactly_self_inverting() {
    let src = "live_loop :a do\n  sample :bd_haus\n  sleep 1\nend";
    let t = parse(src);
    let clip = clip_named(&t, "a");
    let muted = apply_clip_mute(src, clip, true);
    assert_ne!(muted, src);
    let unmuted = apply_clip_mute(&muted, clip, false);
    assert_eq!(unmuted, src);
}

#[test]
fn muted_clip_disappears_from_the_timeline() {
    let src = "live_loop :a do\n  sample :bd_haus\n  sleep 1\nend\nsample :kick";
    let t = parse(src);
    let muted = apply_clip_mute(src, clip_named(&t, "a"), true);
    assert!(muted.lines().take(4).all(|l| l.starts_with(MUTE_PREFIX)));
    let t2 = parse(&muted);
    assert!(t2.clips().all(|c| c.name != "a"));
    // the untouched clip survives
    assert!(t2.clips().any(|c| c.name == "kick"));
}

#[test]
fn track_mute_covers_every_clip() {
    let src = "live_loop :a do\n  sleep 1\nend\nlive_loop :a do\n  sleep 2\nend";
    let t = parse(src);
    let track = t.tracks.iter().find(|tr| tr.name == "a").unwrap();
    assert_eq!(track.clips.len(), 2);
    let muted = apply_track_mute(src, track, true);
    assert!(muted.lines().all(|l| l.starts_with(MUTE_PREFIX)));
    let unmuted = apply_track_mute(&muted, track, false);
    assert_eq!(unmuted, src);
}

#[test]
fn stale_provenance_degrades_to_noop_not_panic() {
    let src = "sample :kick";
    let t = parse(src);
    let clip = clip_named(&t, "kick");
    // simulate the source shrinking underneath the provenance
    let out = apply_clip_amp("", clip, 0.5);
    assert_eq!(out, "");
}

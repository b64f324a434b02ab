//! CLI smoke tests: parse and generate through real files.

use std::fs;
use std::process::Command;

fn chronon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_chronon"))
}

#[test]
fn parse_emits_timeline_json() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("live.rb");
    fs::write(
        &script,
        "use_bpm 100\nlive_loop :drums do\n  sample :bd_haus\n  sleep 1\nend\n",
    )
    .unwrap();

    let out = chronon().arg("parse").arg(&script).output().unwrap();
    assert!(out.status.success());

    let timeline: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(timeline["bpm"], 100);
    assert_eq!(timeline["tracks"][0]["name"], "drums");
    assert_eq!(timeline["tracks"][0]["clips"][0]["isLooping"], true);
}

#[test]
fn parse_honors_fallback_bpm_flag() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("live.rb");
    fs::write(&script, "sample :bd_haus\n").unwrap();

    let out = chronon()
        .args(["parse", "--bpm", "85"])
        .arg(&script)
        .output()
        .unwrap();
    assert!(out.status.success());

    let timeline: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(timeline["bpm"], 85);
}

#[test]
fn generate_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("live.rb");
    fs::write(&script, "use_bpm 100\nsleep 2\nsample :loop_amen\n").unwrap();

    let parsed = chronon().arg("parse").arg(&script).output().unwrap();
    assert!(parsed.status.success());

    let json_path = dir.path().join("timeline.json");
    fs::write(&json_path, &parsed.stdout).unwrap();

    let generated = chronon().arg("generate").arg(&json_path).output().unwrap();
    assert!(generated.status.success());
    let text = String::from_utf8(generated.stdout).unwrap();
    assert!(text.starts_with("use_bpm 100\n"));
    assert!(text.contains("sleep 2"));
    assert!(text.contains("sample :loop_amen"));
}

#[test]
fn missing_file_fails_cleanly() {
    let out = chronon().args(["parse", "/no/such/file.rb"]).output().unwrap();
    assert!(!out.status.success());
}

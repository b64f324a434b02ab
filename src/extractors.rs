//! Per-line field extraction
//!
//! Small pure readers that pull a single fact out of one logical line:
//! a named numeric parameter, a leading `:symbol`, the effect parameter
//! set of a `with_fx` line, or the display name of a sample. These never
//! look past the line they are given.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ASSIGNMENT_RE: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*=[^=~]").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"^[a-z_][A-Za-z0-9_]*[?!]?$").unwrap();
}

/// Effect parameters the editor knows how to surface on a `with_fx` line,
/// in display order.
pub const FX_PARAM_NAMES: [&str; 19] = [
    "mix", "room", "time", "feedback", "phase", "decay", "cutoff", "res", "rate", "depth", "amp",
    "pre_amp", "distort", "damp", "spread", "release", "attack", "sustain", "reps",
];

/// Extract a named numeric parameter, e.g. `extract_param("play 60, amp: 0.5", "amp")`.
///
/// Accepts `name: value` and `name => value` spellings.
pub fn extract_param(line: &str, param: &str) -> Option<f32> {
    let patterns = [
        format!("{}: ", param),
        format!("{}:", param),
        format!("{} => ", param),
    ];
    for pat in &patterns {
        let mut search = 0;
        while let Some(rel) = line[search..].find(pat.as_str()) {
            let pos = search + rel;
            // Reject partial matches like `pre_amp:` when asked for `amp:`
            let word_boundary = pos == 0 || {
                let before = line.as_bytes()[pos - 1] as char;
                !(before.is_alphanumeric() || before == '_')
            };
            if word_boundary {
                let after = line[pos + pat.len()..].trim_start();
                let val_str: String = after
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                if let Ok(v) = val_str.parse::<f32>() {
                    return Some(v);
                }
            }
            search = pos + pat.len();
        }
    }
    None
}

/// Extract the first `:symbol` on a line, e.g. `live_loop :drums do` → `drums`.
pub fn extract_symbol(line: &str) -> Option<String> {
    let pos = line.find(':')?;
    let name: String = line[pos + 1..]
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Amplitude parameter, if present.
pub fn extract_amp(line: &str) -> Option<f32> {
    extract_param(line, "amp")
}

/// Playback rate parameter, if present.
pub fn extract_rate(line: &str) -> Option<f32> {
    extract_param(line, "rate")
}

/// Attack/sustain/release envelope; absent parameters read as 0.
pub fn extract_envelope(line: &str) -> (f32, f32, f32) {
    (
        extract_param(line, "attack").unwrap_or(0.0),
        extract_param(line, "sustain").unwrap_or(0.0),
        extract_param(line, "release").unwrap_or(0.0),
    )
}

/// All recognized effect parameters present on a `with_fx` line, in
/// [`FX_PARAM_NAMES`] order.
pub fn extract_fx_params(line: &str) -> Vec<(String, f32)> {
    let mut params = Vec::new();
    for name in &FX_PARAM_NAMES {
        if let Some(val) = extract_param(line, name) {
            params.push((name.to_string(), val));
        }
    }
    params
}

/// Display name of the sample on a `sample ...` line.
///
/// `sample :loop_amen, rate: 2` → `loop_amen`; quoted path samples display
/// as the file stem: `sample "~/sounds/kick 808.wav"` → `kick 808`.
pub fn sample_display_name(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("sample")?.trim_start();
    if rest.starts_with(':') {
        return extract_symbol(rest);
    }
    if rest.starts_with('"') || rest.starts_with('\'') {
        let quote = rest.chars().next()?;
        let inner: String = rest[1..].chars().take_while(|c| *c != quote).collect();
        let file = inner.rsplit(['/', '\\']).next().unwrap_or(inner.as_str());
        let stem = match file.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => file,
        };
        if stem.is_empty() {
            return None;
        }
        return Some(stem.to_string());
    }
    None
}

/// Is this line a plain variable assignment (`x = ...` but not `==`)?
pub fn is_assignment(line: &str) -> bool {
    ASSIGNMENT_RE.is_match(line)
}

/// Is this line a single bare identifier (a candidate function call)?
pub fn is_bare_identifier(line: &str) -> bool {
    IDENT_RE.is_match(line)
}

/// Leading whitespace of a line, for indentation-preserving rewrites.
pub fn leading_indent(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

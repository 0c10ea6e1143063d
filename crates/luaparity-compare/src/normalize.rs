//! Output normalization for differential comparison.
//!
//! Raw interpreter output differs across implementations in ways that
//! carry no semantic weight. Each step below erases one such axis:
//!
//! - heap addresses and bare pointer digits
//! - float formatting differences
//! - error locations and stack traces
//! - version banners and launcher prefixes
//!
//! Steps run in the fixed order given by [`STEPS`]. Every step is a
//! pure function of the text, and the pipeline is idempotent: running
//! it over already-normalized output changes nothing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// The normalization pipeline, applied top to bottom.
pub const STEPS: &[fn(&str) -> String] = &[
    strip_compatibility_lines,
    mask_version_banners,
    canonicalize_floats,
    mask_addresses,
    redact_source_locations,
    strip_interpreter_prefixes,
    collapse_stack_traces,
    canonicalize_whitespace,
];

/// Run the full normalization pipeline over `text`.
pub fn normalize(text: &str) -> String {
    STEPS.iter().fold(text.to_string(), |acc, step| step(&acc))
}

static RE_COMPAT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\[compatibility\].*\n?").unwrap());

/// Drop `[compatibility]` banner lines entirely.
fn strip_compatibility_lines(text: &str) -> String {
    RE_COMPAT_LINE.replace_all(text, "").into_owned()
}

static RE_LUA_BANNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Lua 5\.\d+").unwrap());
static RE_NOVA_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NovaSharp \d+\.\d+\.\d+\.\d+").unwrap());

/// Replace interpreter version strings with a shared placeholder so
/// `_VERSION` prints compare equal across implementations.
fn mask_version_banners(text: &str) -> String {
    let masked = RE_LUA_BANNER.replace_all(text, "<lua-version>");
    RE_NOVA_BANNER.replace_all(&masked, "<lua-version>").into_owned()
}

static RE_FLOAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+\.\d+(?:e[+-]?\d+)?").unwrap());

/// Rewrite every decimal literal into a canonical spelling, erasing
/// the gap between Lua's `%.14g` output and .NET round-trip formatting.
fn canonicalize_floats(text: &str) -> String {
    RE_FLOAT
        .replace_all(text, |caps: &Captures| canonical_float(&caps[0]))
        .into_owned()
}

/// Values within `1e-10` of zero collapse to `0`; everything else is
/// rounded to ten decimal places and printed without trailing zeros.
fn canonical_float(token: &str) -> String {
    let value: f64 = match token.parse() {
        Ok(v) if f64::is_finite(v) => v,
        _ => return token.to_string(),
    };
    if value.abs() < 1e-10 {
        return "0".to_string();
    }
    let rounded = round_to_ten_places(value);
    if rounded == rounded.trunc() && rounded.abs() < 1e18 {
        return format!("{}", rounded as i64);
    }
    let printed = format!("{}", rounded);
    if printed.contains('.') {
        printed
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        printed
    }
}

fn round_to_ten_places(value: f64) -> f64 {
    // Above this the scaled value leaves f64's exact-integer range and
    // the float grid is already coarser than ten decimal places.
    if value.abs() >= 9.0e5 {
        return value;
    }
    (value * 1e10).round() / 1e10
}

static RE_HEX_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[0-9a-fA-F]+").unwrap());
static RE_BARE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([:\s])([0-9A-F]{8,16})([:\s]|$)").unwrap());

/// Mask heap addresses: `0x`-prefixed literals plus bare runs of 8-16
/// uppercase hex digits bounded by whitespace or colons.
fn mask_addresses(text: &str) -> String {
    let mut masked = RE_HEX_LITERAL.replace_all(text, "<addr>").into_owned();
    // The bounding delimiter is part of the match, so back-to-back
    // addresses need extra passes until the text stops changing.
    loop {
        let pass = RE_BARE_ADDRESS
            .replace_all(&masked, "${1}<addr>${3}")
            .into_owned();
        if pass == masked {
            return masked;
        }
        masked = pass;
    }
}

static RE_LUA_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.lua):(\d+):").unwrap());
static RE_C_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[C\]:\s*-?\d+:").unwrap());
static RE_CHUNK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\[string "[^"]*"\]:\d+:"#).unwrap());

/// Redact line numbers and chunk names from error locations.
fn redact_source_locations(text: &str) -> String {
    let step = RE_LUA_LINE.replace_all(text, "${1}:<line>:");
    let step = RE_C_LINE.replace_all(&step, "[C]:<line>:");
    RE_CHUNK_LINE
        .replace_all(&step, r#"[string "<chunk>"]:<line>:"#)
        .into_owned()
}

static RE_LAUNCHER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^lua\d?\.\d?: ").unwrap());
static RE_DEBUG_PROMPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^lua_debug>").unwrap());
static RE_ABS_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^/[^\s:]+:").unwrap());

/// Strip launcher noise: `luaX.Y:` error prefixes, debug prompts, and
/// absolute script paths at the start of a line.
fn strip_interpreter_prefixes(text: &str) -> String {
    let step = RE_LAUNCHER_PREFIX.replace_all(text, "");
    let step = RE_DEBUG_PROMPT.replace_all(&step, "<debug>");
    RE_ABS_PATH.replace_all(&step, "<path>:").into_owned()
}

static RE_NET_FRAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s+at NovaSharp\..*$").unwrap());
static RE_UNHANDLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^Unhandled exception\. NovaSharp\.Interpreter\.Errors\.").unwrap()
});
static RE_FRAME_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:<stack-frame>\n?)+").unwrap());

/// Collapse .NET stack traces to a single placeholder line and unwrap
/// the `Unhandled exception.` prefix around interpreter errors.
fn collapse_stack_traces(text: &str) -> String {
    let step = RE_NET_FRAME.replace_all(text, "<stack-frame>");
    let step = RE_UNHANDLED.replace_all(&step, "");
    RE_FRAME_RUN.replace_all(&step, "<stack-trace>\n").into_owned()
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Canonicalize path separators and whitespace: forward slashes, no
/// trailing spaces, at most one blank line in a row, no trailing
/// newlines.
fn canonicalize_whitespace(text: &str) -> String {
    let slashed = text.replace('\\', "/");
    let lines: Vec<&str> = slashed.split('\n').map(str::trim_end).collect();
    let joined = lines.join("\n");
    let collapsed = RE_BLANK_RUN.replace_all(&joined, "\n\n");
    collapsed.trim_end_matches('\n').to_string()
}

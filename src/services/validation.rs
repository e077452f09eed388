//! Field sanitizers and validators shared by the settings page and the
//! post metabox.

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;

/// Format of the metabox expiry field once the `T` separator is normalized.
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M";

lazy_static! {
    static ref HEX_COLOR_REGEX: Regex = Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
    static ref SCRIPT_STYLE_REGEX: Regex =
        Regex::new(r"(?is)<script[^>]*?>.*?</script>|<style[^>]*?>.*?</style>").unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Clean a single-line text input: drop script/style elements with their
/// contents, strip remaining markup, fold whitespace runs into single
/// spaces, then trim.
pub fn sanitize_text_field(input: &str) -> String {
    let without_scripts = SCRIPT_STYLE_REGEX.replace_all(input, "");
    let without_tags = TAG_REGEX.replace_all(&without_scripts, "");
    WHITESPACE_REGEX
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// `#` followed by exactly six hex digits, either case.
pub fn is_valid_hex_color(value: &str) -> bool {
    HEX_COLOR_REGEX.is_match(value)
}

/// Parse `value` against `format`, accepting it only if formatting the
/// parsed value gives back the (T-normalized) input exactly.
pub fn parse_datetime(value: &str, format: &str) -> Option<NaiveDateTime> {
    let normalized = value.replace('T', " ");
    let parsed = NaiveDateTime::parse_from_str(&normalized, format).ok()?;
    (parsed.format(format).to_string() == normalized).then_some(parsed)
}

pub fn is_valid_datetime(value: &str, format: &str) -> bool {
    parse_datetime(value, format).is_some()
}

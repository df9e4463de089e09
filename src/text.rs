//! Plain-text helpers shared by the renderer and the exporter

use regex::Regex;
use std::sync::LazyLock;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^<>]*>|<!--.*?-->").expect("valid tag pattern"));

static UNSAFE_FILENAME_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_ \-]+").expect("valid filename pattern"));

static ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity pattern"));

/// Reduce HTML-ish text to its plain text: tags and comments are dropped,
/// common named and numeric entities decoded. Text that merely contains `<`
/// or `>` (e.g. `a < b`) is left alone.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(input, "");

    ENTITY_PATTERN
        .replace_all(&without_tags, |caps: &regex::Captures<'_>| {
            decode_entity(&caps[1]).map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(decimal) = entity.strip_prefix('#') {
        return decimal.parse().ok().and_then(char::from_u32);
    }

    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}

/// Turn a conversation title into a safe file stem.
///
/// Each run of characters outside `[A-Za-z0-9_ -]` becomes one `_`, then
/// every space becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_RUN.replace_all(name, "_").replace(' ', "_")
}

//! Cleanup of free-text directive parameters and numeric clamping for magnitude parameters.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clock::Tick;

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^<>]*>|\[[^\[\]]*\]").expect("markup pattern is valid"));

const QUOTES: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{AB}', '\u{BB}'];
const TRAILING_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':', '\u{2026}'];
const ELLIPSIS: &str = "...";

/// Cleans generator-supplied text before it is stored or displayed.
///
/// Steps: trim, remove `<...>` and `[...]` markup (and stray brackets), strip surrounding
/// quotes, lowercase the first letter (unless it starts an acronym), strip trailing
/// punctuation, truncate to `max_len` characters including a `...` suffix.
#[must_use]
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let without_markup = MARKUP.replace_all(input.trim(), "");
    let without_stray: String = without_markup
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '[' | ']'))
        .collect();
    let unquoted = without_stray.trim().trim_matches(QUOTES).trim();
    let lowered = lowercase_first(unquoted);
    let text = lowered
        .trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace())
        .trim_start();
    truncate(text, max_len)
}

fn lowercase_first(text: &str) -> String {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let acronym = chars.next().is_some_and(char::is_uppercase);
    if acronym || !first.is_uppercase() {
        return text.to_string();
    }
    first.to_lowercase().chain(text[first.len_utf8()..].chars()).collect()
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Clamps `value` into `[-limit, limit]`.
#[must_use]
pub fn clamp_magnitude(value: i64, limit: i32) -> i32 {
    let limit = i64::from(limit.unsigned_abs().min(i32::MAX.unsigned_abs()));
    // the clamp keeps the value inside i32 range
    i32::try_from(value.clamp(-limit, limit)).unwrap_or_default()
}

/// Breakpoints mapping |magnitude| to an effect duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DurationTiers {
    /// |magnitude| at or above which `long` applies.
    #[serde(default = "default_long_at")]
    pub long_at: i32,
    /// |magnitude| at or above which `medium` applies.
    #[serde(default = "default_medium_at")]
    pub medium_at: i32,
    /// Long duration in ticks.
    #[serde(default = "default_long")]
    pub long: Tick,
    /// Medium duration in ticks.
    #[serde(default = "default_medium")]
    pub medium: Tick,
    /// Short duration in ticks.
    #[serde(default = "default_short")]
    pub short: Tick,
}

impl DurationTiers {
    /// Effect duration for `magnitude`.
    #[must_use]
    pub const fn duration_for(&self, magnitude: i32) -> Tick {
        let size = magnitude.unsigned_abs();
        if size >= self.long_at.unsigned_abs() {
            self.long
        } else if size >= self.medium_at.unsigned_abs() {
            self.medium
        } else {
            self.short
        }
    }
}

impl Default for DurationTiers {
    fn default() -> Self {
        Self {
            long_at: default_long_at(),
            medium_at: default_medium_at(),
            long: default_long(),
            medium: default_medium(),
            short: default_short(),
        }
    }
}

const fn default_long_at() -> i32 {
    20
}

const fn default_medium_at() -> i32 {
    10
}

const fn default_long() -> Tick {
    72
}

const fn default_medium() -> Tick {
    48
}

const fn default_short() -> Tick {
    24
}

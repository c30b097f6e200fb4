//! Extraction of `[ACTION:ID:ARG...]` tokens from generated text.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::directive::{normalize_id, Invocation};

const PREFIX: &str = "ACTION:";

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[ACTION:([^\[\]]*)\]").expect("token pattern is valid"));

const OPENER_LEN: usize = PREFIX.len() + 1;

/// Output of [`parse`]: ordered invocations and the token-free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText<'a> {
    /// Invocations in left-to-right order.
    pub invocations: Vec<Invocation>,
    /// Text with every token removed and trimmed; borrowed when no token was present.
    pub cleaned: Cow<'a, str>,
}

impl ParsedText<'_> {
    /// Whether the text carried no directive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Parses every directive token in `text`.
///
/// Tokens with an empty identifier are removed from the text but produce no invocation.
/// Text without any token is returned borrowed and untouched.
#[must_use]
pub fn parse(text: &str) -> ParsedText<'_> {
    if !may_contain_token(text) {
        return ParsedText {
            invocations: Vec::new(),
            cleaned: Cow::Borrowed(text),
        };
    }
    ParsedText {
        invocations: extract(text),
        cleaned: strip(text),
    }
}

/// Ordered invocations found in `text`.
#[must_use]
pub fn extract(text: &str) -> Vec<Invocation> {
    if !may_contain_token(text) {
        return Vec::new();
    }
    let mut invocations = Vec::new();
    let (mut scanned, mut chars_before) = (0, 0);
    for captures in TOKEN.captures_iter(text) {
        let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let mut segments = body.as_str().split(':');
        let id = normalize_id(segments.next().unwrap_or_default());
        if id.is_empty() {
            continue;
        }
        chars_before += text[scanned..whole.start()].chars().count();
        scanned = whole.start();
        invocations.push(Invocation {
            id,
            params: segments.map(str::to_string).collect(),
            offset: chars_before,
            ordinal: invocations.len(),
        });
    }
    invocations
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Open `[ACTION:` whose start is at `start` in the output buffer.
    Token { start: usize, clean: bool },
    /// Any other `[`.
    Bracket,
}

/// Removes every token and trims the result.
///
/// A token whose body still holds a bracket once its inner tokens are gone is kept, as is
/// an unterminated one; parsing the output always yields no invocation. Horizontal
/// whitespace in front of a removed token goes with it unless the token is glued to the
/// next word, so "a [..] b" becomes "a b" and "a [..]b" becomes "a b" too.
#[must_use]
pub fn strip(text: &str) -> Cow<'_, str> {
    if !may_contain_token(text) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut frames: Vec<Frame> = Vec::new();
    let mut removed = false;
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if is_opener(rest) {
            frames.push(Frame::Token {
                start: out.len(),
                clean: true,
            });
            out.push_str(&rest[..OPENER_LEN]);
            rest = &rest[OPENER_LEN..];
            continue;
        }
        rest = &rest[ch.len_utf8()..];
        match ch {
            '[' => {
                frames.push(Frame::Bracket);
                out.push(ch);
            }
            ']' => match frames.pop() {
                Some(Frame::Token { start, clean: true }) => {
                    out.truncate(start);
                    if !rest.starts_with(char::is_alphanumeric) {
                        let kept = out.trim_end_matches([' ', '\t']).len();
                        out.truncate(kept);
                    }
                    removed = true;
                }
                Some(_) => {
                    out.push(ch);
                    // the closed pair stays in the enclosing token's body
                    if let Some(Frame::Token { clean, .. }) = frames.last_mut() {
                        *clean = false;
                    }
                }
                None => out.push(ch),
            },
            _ => out.push(ch),
        }
    }
    if !removed {
        return Cow::Borrowed(text);
    }
    let trimmed = out.trim();
    if trimmed.len() == out.len() {
        Cow::Owned(out)
    } else {
        Cow::Owned(trimmed.to_string())
    }
}

fn is_opener(text: &str) -> bool {
    text.as_bytes()
        .get(..OPENER_LEN)
        .is_some_and(|head| head[0] == b'[' && head[1..].eq_ignore_ascii_case(PREFIX.as_bytes()))
}

// Cheap pre-check that avoids running the regex on plain prose.
fn may_contain_token(text: &str) -> bool {
    text.as_bytes()
        .windows(OPENER_LEN)
        .any(|window| window[0] == b'[' && window[1..].eq_ignore_ascii_case(PREFIX.as_bytes()))
}

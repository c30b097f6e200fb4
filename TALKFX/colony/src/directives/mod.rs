//! Standard directive set, one module per category.

use talkfx_directives::{
    sanitize_text, DirectiveError, ExecutionContext, Params, SanitizeSettings,
};

/// `health` category directives.
pub mod health;
/// `inventory` category directives.
pub mod inventory;
/// `mood` category directives.
pub mod mood;
/// `movement` category directives.
pub mod movement;
/// `needs` category directives.
pub mod needs;
/// `prisoner` category directives.
pub mod prisoner;
/// `skills` category directives.
pub mod skills;
/// `social` category directives.
pub mod social;
/// `special` category directives.
pub mod special;
/// `transform` category directives.
pub mod transform;
/// `work` category directives.
pub mod work;

/// Sanitized, non-empty free text at `index`.
pub(crate) fn clean_text(
    params: &Params<'_>,
    index: usize,
    name: &str,
    ctx: &ExecutionContext<'_>,
) -> Result<String, DirectiveError> {
    let raw = params.text(index).unwrap_or_default();
    let cleaned = ctx.sanitize(raw);
    if cleaned.is_empty() {
        return Err(DirectiveError::InvalidParameter {
            name: name.into(),
            detail: format!("{raw:?} is empty after cleanup"),
        });
    }
    Ok(cleaned)
}

/// Cleans a raw label for lookups made before an execution context exists.
pub(crate) fn lookup_label(raw: &str) -> String {
    sanitize_text(raw, SanitizeSettings::default().max_text_len)
}

/// Lower-case lookup key for maps keyed by name.
pub(crate) fn key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Optional positive count at `index`, bounded by `max`.
pub(crate) fn count(
    params: &Params<'_>,
    index: usize,
    name: &str,
    default: u32,
    max: u32,
) -> Result<u32, DirectiveError> {
    let Some(value) = params.int(index) else {
        return Ok(default);
    };
    u32::try_from(value)
        .ok()
        .filter(|value| (1..=max).contains(value))
        .ok_or_else(|| DirectiveError::InvalidParameter {
            name: name.into(),
            detail: format!("{value} is outside 1..={max}"),
        })
}

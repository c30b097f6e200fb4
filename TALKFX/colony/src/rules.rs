//! Reference relevance rules for colonists.

use std::sync::Arc;

use talkfx_directives::{DirectiveCategory, DirectiveDefinition, FnRule, RelevanceRule};

use crate::{colonist::LOW_MOOD, Colonist};

/// Injured colonist and an injury-tagged directive.
pub const INJURY_BONUS: i32 = 20;
/// The canonical mood directive is always worth offering.
pub const CANONICAL_MOOD_BONUS: i32 = 25;
/// Captive colonist and a captivity-tagged directive.
pub const CAPTIVITY_BONUS: i32 = 20;
/// Unmet need and a directive tagged for it.
pub const LOW_NEED_BONUS: i32 = 15;
/// Unhappy colonist and any mood directive.
pub const LOW_MOOD_BONUS: i32 = 10;

fn injury(colonist: &Colonist, definition: &DirectiveDefinition) -> i32 {
    let targeted = definition
        .tags_with_prefix("injury")
        .any(|part| part == "any" || colonist.has_injury_on(part));
    if targeted && colonist.is_injured() {
        INJURY_BONUS
    } else {
        0
    }
}

fn canonical_mood(_: &Colonist, definition: &DirectiveDefinition) -> i32 {
    if definition.has_tag("mood:canonical") {
        CANONICAL_MOOD_BONUS
    } else {
        0
    }
}

fn captivity(colonist: &Colonist, definition: &DirectiveDefinition) -> i32 {
    if colonist.is_captive() && definition.has_tag("captivity") {
        CAPTIVITY_BONUS
    } else {
        0
    }
}

fn low_need(colonist: &Colonist, definition: &DirectiveDefinition) -> i32 {
    if definition
        .tags_with_prefix("need")
        .any(|need| colonist.need_is_low(need))
    {
        LOW_NEED_BONUS
    } else {
        0
    }
}

fn low_mood(colonist: &Colonist, definition: &DirectiveDefinition) -> i32 {
    if definition.category == DirectiveCategory::Mood && colonist.mood() < LOW_MOOD {
        LOW_MOOD_BONUS
    } else {
        0
    }
}

/// Every reference rule.
#[must_use]
pub fn standard_rules() -> Vec<Arc<dyn RelevanceRule<Colonist>>> {
    let rules: [Arc<dyn RelevanceRule<Colonist>>; 5] = [
        Arc::new(FnRule::new("injury", injury)),
        Arc::new(FnRule::new("canonical_mood", canonical_mood)),
        Arc::new(FnRule::new("captivity", captivity)),
        Arc::new(FnRule::new("low_need", low_need)),
        Arc::new(FnRule::new("low_mood", low_mood)),
    ];
    rules.into()
}

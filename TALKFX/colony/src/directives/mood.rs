use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
    ValidationLevel,
};

use super::{clean_text, lookup_label};
use crate::{colonist::Thought, Colonist};

const DEFAULT_LABEL: &str = "had a meaningful conversation";

/// Adds a timed thought whose mood offset is the invocation magnitude.
///
/// The offset is clamped, limited by cooldown, daily count and a positive daily budget, and
/// lasts longer the stronger it is.
pub struct AddThought {
    definition: DirectiveDefinition,
}

impl AddThought {
    /// Quota shared by every colonist.
    pub const QUOTA: QuotaPolicy = QuotaPolicy::unlimited()
        .with_cooldown(3)
        .with_daily_cap(3)
        .with_magnitude_cap(30);

    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "ADD_THOUGHT",
                DirectiveCategory::Mood,
                "Leave a lasting impression (mood -20..20, short label)",
            )
            .validation(ValidationLevel::Permissive)
            .param(ParamSpec::required("mood", ParamKind::Integer))
            .param(ParamSpec::optional("label", ParamKind::Text))
            .tag("mood:canonical"),
        })
    }
}

impl Directive<Colonist> for AddThought {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, _params: &Params<'_>) -> bool {
        colonist.alive
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let offset = ctx
            .magnitude
            .ok_or_else(|| DirectiveError::InvalidParameter {
                name: "mood".into(),
                detail: "missing magnitude".into(),
            })?;
        if offset == 0 {
            return Err(DirectiveError::Rejected(format!(
                "{} shrugs it off.",
                colonist.name
            )));
        }
        let label = if params.text(1).is_some() {
            clean_text(params, 1, "label", ctx)?
        } else {
            DEFAULT_LABEL.to_string()
        };
        let hours = ctx.duration_for(offset);
        colonist.expire(ctx.now);
        let thought = Thought {
            label: label.clone(),
            mood_offset: offset,
            expires_at: ctx.now.saturating_add(hours),
        };
        match colonist.thought_index(&label) {
            Some(index) => colonist.thoughts[index] = thought,
            None => colonist.thoughts.push(thought),
        }
        Ok(DirectiveEffect::new(
            format!("thought:{offset:+}"),
            format!(
                "{} {label} ({offset:+} mood for {hours} hours).",
                colonist.name
            ),
        ))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(Self::QUOTA)
    }

    fn magnitude(&self, params: &Params<'_>) -> Option<i64> {
        params.int(0)
    }
}

/// Removes a thought by label, matched after the same cleanup `ADD_THOUGHT` applies.
pub struct RemoveThought {
    definition: DirectiveDefinition,
}

impl RemoveThought {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "REMOVE_THOUGHT",
                DirectiveCategory::Mood,
                "Let go of a thought by its label",
            )
            .param(ParamSpec::required("label", ParamKind::Text)),
        })
    }
}

impl Directive<Colonist> for RemoveThought {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && !colonist.thoughts.is_empty()
            && params.text(0).map_or(true, |label| {
                colonist.thought_index(&lookup_label(label)).is_some()
            })
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let label = ctx.sanitize(params.text(0).unwrap_or_default());
        let index = colonist
            .thought_index(&label)
            .ok_or_else(|| DirectiveError::AgentState(format!("no thought {label:?}")))?;
        let removed = colonist.thoughts.remove(index);
        Ok(DirectiveEffect::new(
            format!("thought_removed:{}", removed.mood_offset),
            format!("{} no longer dwells on it.", colonist.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::testing::{allowed, run};

    #[test]
    fn adds_thought_with_tiered_duration() {
        let add = AddThought::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        let effect = run(&add, &mut colonist, &["8", "\"Praised!\""], Some(8)).unwrap();
        assert_eq!(effect.status, "thought:+8");
        assert_eq!(effect.narrative, "Ada praised (+8 mood for 24 hours).");
        assert_eq!(colonist.thoughts[0].expires_at, 24);
        assert_eq!(colonist.mood(), 58);

        run(&add, &mut colonist, &["-15", "praised"], Some(-15)).unwrap();
        assert_eq!(colonist.thoughts.len(), 1);
        assert_eq!(colonist.thoughts[0].expires_at, 48);
    }

    #[test]
    fn zero_offset_is_rejected() {
        let add = AddThought::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        assert!(matches!(
            run(&add, &mut colonist, &["0"], Some(0)),
            Err(DirectiveError::Rejected(_))
        ));
        assert!(colonist.thoughts.is_empty());
    }

    #[test]
    fn removes_by_label() {
        let add = AddThought::handle();
        let remove = RemoveThought::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        assert!(!allowed(&remove, &colonist, &[]));
        run(&add, &mut colonist, &["-5", "insulted"], Some(-5)).unwrap();
        assert!(allowed(&remove, &colonist, &["Insulted"]));
        assert!(!allowed(&remove, &colonist, &["praised"]));
        run(&remove, &mut colonist, &["insulted"], None).unwrap();
        assert!(colonist.thoughts.is_empty());
    }

    #[test]
    fn removes_by_the_label_it_was_added_with() {
        let add = AddThought::handle();
        let remove = RemoveThought::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        run(&add, &mut colonist, &["5", "Praised!"], Some(5)).unwrap();
        assert_eq!(colonist.thoughts[0].label, "praised");
        assert!(allowed(&remove, &colonist, &["Praised!"]));
        run(&remove, &mut colonist, &["Praised!"], None).unwrap();
        assert!(colonist.thoughts.is_empty());
    }
}

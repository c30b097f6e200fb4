use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
    ValidationLevel,
};

use super::key;
use crate::{colonist::Inspiration, Colonist};

const KINDS: &[&str] = &["creativity", "work", "recruitment", "surgery"];

/// Grants a temporary inspiration, once per day.
pub struct Inspire {
    definition: DirectiveDefinition,
}

impl Inspire {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "INSPIRE",
                DirectiveCategory::Special,
                "Spark an inspiration (creativity, work, recruitment or surgery)",
            )
            .validation(ValidationLevel::Strict)
            .param(ParamSpec::optional("kind", ParamKind::Word)),
        })
    }
}

impl Directive<Colonist> for Inspire {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.is_active()
            && colonist.inspiration.is_none()
            && params
                .text(0)
                .map_or(true, |kind| KINDS.contains(&key(kind).as_str()))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let kind = params.text(0).map_or_else(|| KINDS[0].to_string(), key);
        let hours = ctx.settings.duration_tiers.long;
        colonist.inspiration = Some(Inspiration {
            kind: kind.clone(),
            expires_at: ctx.now.saturating_add(hours),
        });
        Ok(DirectiveEffect::new(
            format!("inspired:{kind}"),
            format!("{} feels a surge of {kind} inspiration.", colonist.name),
        ))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(QuotaPolicy::unlimited().with_daily_cap(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::testing::{allowed, run};

    #[test]
    fn inspires_with_default_kind() {
        let inspire = Inspire::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        let effect = run(&inspire, &mut colonist, &[], None).unwrap();
        assert_eq!(effect.status, "inspired:creativity");
        assert_eq!(colonist.inspiration.as_ref().unwrap().expires_at, 72);
        assert!(!allowed(&inspire, &colonist, &[]));
        colonist.expire(72);
        assert!(allowed(&inspire, &colonist, &["Work"]));
        assert!(!allowed(&inspire, &colonist, &["dancing"]));
    }
}

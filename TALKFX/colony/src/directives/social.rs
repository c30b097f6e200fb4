use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
};

use super::key;
use crate::Colonist;

/// Shifts the colonist's opinion of someone else.
pub struct ChangeOpinion {
    definition: DirectiveDefinition,
}

impl ChangeOpinion {
    /// Quota shared by every colonist.
    pub const QUOTA: QuotaPolicy = QuotaPolicy::unlimited()
        .with_cooldown(6)
        .with_magnitude_cap(40);

    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "CHANGE_OPINION",
                DirectiveCategory::Social,
                "Shift the opinion of another person (id, -20..20)",
            )
            .param(ParamSpec::required("target", ParamKind::Word))
            .param(ParamSpec::required("delta", ParamKind::Integer)),
        })
    }
}

impl Directive<Colonist> for ChangeOpinion {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && params
                .text(0)
                .map_or(true, |target| !target.eq_ignore_ascii_case(&colonist.id))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let target = key(params.text(0).unwrap_or_default());
        let delta = ctx.magnitude.unwrap_or_default();
        let opinion = colonist.opinions.entry(target.clone()).or_default();
        *opinion = opinion.saturating_add(delta).clamp(-100, 100);
        let now = *opinion;
        let feeling = match now {
            i32::MIN..=-40 => "despises",
            -39..=-10 => "dislikes",
            -9..=9 => "is indifferent to",
            10..=39 => "likes",
            _ => "adores",
        };
        Ok(DirectiveEffect::new(
            format!("opinion:{target}:{delta:+}"),
            format!("{} now {feeling} {target}.", colonist.name),
        ))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(Self::QUOTA)
    }

    fn magnitude(&self, params: &Params<'_>) -> Option<i64> {
        params.int(1)
    }
}

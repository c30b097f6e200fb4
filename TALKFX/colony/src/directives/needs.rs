use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
};

use super::{count, key};
use crate::Colonist;

const DEFAULT_AMOUNT: u32 = 30;
const MAX_AMOUNT: u32 = 100;

/// Tops up one need such as food, rest or joy.
pub struct SatisfyNeed {
    definition: DirectiveDefinition,
}

impl SatisfyNeed {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "SATISFY_NEED",
                DirectiveCategory::Needs,
                "Take care of a need such as food, rest or joy (optional amount up to 100)",
            )
            .param(ParamSpec::required("need", ParamKind::Word))
            .param(ParamSpec::optional("amount", ParamKind::Integer))
            .tag("need:any"),
        })
    }
}

impl Directive<Colonist> for SatisfyNeed {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && !colonist.needs.is_empty()
            && params
                .text(0)
                .map_or(true, |need| colonist.need(need).is_some())
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let need = key(params.text(0).unwrap_or_default());
        let amount = count(params, 1, "amount", DEFAULT_AMOUNT, MAX_AMOUNT)?;
        let level = colonist
            .needs
            .get_mut(&need)
            .ok_or_else(|| DirectiveError::AgentState(format!("untracked need {need}")))?;
        if *level >= 100 {
            return Err(DirectiveError::Rejected(format!(
                "{} has had enough {need} for now.",
                colonist.name
            )));
        }
        // amount is at most MAX_AMOUNT, well inside i32
        *level = level
            .saturating_add(i32::try_from(amount).unwrap_or(i32::MAX))
            .min(100);
        let now = *level;
        Ok(DirectiveEffect::new(
            format!("need:{need}:{now}"),
            format!("{} feels better about {need}.", colonist.name),
        ))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(QuotaPolicy::unlimited().with_cooldown(2))
    }
}

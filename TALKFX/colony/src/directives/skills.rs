use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
};

use super::{count, key};
use crate::{
    colonist::{MAX_SKILL_LEVEL, XP_PER_LEVEL},
    Colonist,
};

const DEFAULT_XP: u32 = 250;
const MAX_XP: u32 = 2000;

/// Grants experience in a skill the colonist already has.
pub struct GainXp {
    definition: DirectiveDefinition,
}

impl GainXp {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "GAIN_XP",
                DirectiveCategory::Skills,
                "Teach something useful (skill name, optional xp up to 2000)",
            )
            .param(ParamSpec::required("skill", ParamKind::Word))
            .param(ParamSpec::optional("xp", ParamKind::Integer)),
        })
    }
}

impl Directive<Colonist> for GainXp {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && !colonist.skills.is_empty()
            && params
                .text(0)
                .map_or(true, |skill| colonist.skills.contains_key(&key(skill)))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let name = key(params.text(0).unwrap_or_default());
        let xp = count(params, 1, "xp", DEFAULT_XP, MAX_XP)?;
        let skill = colonist
            .skills
            .get_mut(&name)
            .ok_or_else(|| DirectiveError::AgentState(format!("unknown skill {name}")))?;
        if skill.level >= MAX_SKILL_LEVEL {
            return Err(DirectiveError::Rejected(format!(
                "{} has nothing left to learn about {name}.",
                colonist.name
            )));
        }
        let before = skill.level;
        skill.xp = skill.xp.saturating_add(xp);
        while skill.xp >= XP_PER_LEVEL && skill.level < MAX_SKILL_LEVEL {
            skill.xp -= XP_PER_LEVEL;
            skill.level += 1;
        }
        let level = skill.level;
        let narrative = if level > before {
            format!("{} is now level {level} in {name}.", colonist.name)
        } else {
            format!("{} learned a little about {name}.", colonist.name)
        };
        Ok(DirectiveEffect::new(format!("xp:{name}:{xp}"), narrative))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(QuotaPolicy::unlimited().with_daily_cap(5))
    }
}

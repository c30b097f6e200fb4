use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, ValidationLevel,
};

use super::{clean_text, lookup_label};
use crate::Colonist;

/// Tends injuries on one body part, or the worst injury when no part is named.
pub struct Heal {
    definition: DirectiveDefinition,
}

impl Heal {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "HEAL",
                DirectiveCategory::Health,
                "Treat an injury (optionally name the body part)",
            )
            .param(ParamSpec::optional("part", ParamKind::Text))
            .tag("injury:any"),
        })
    }
}

impl Directive<Colonist> for Heal {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        if !colonist.alive || !colonist.is_injured() {
            return false;
        }
        params
            .text(0)
            .map_or(true, |part| colonist.has_injury_on(part))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let healed: Vec<_> = match params.text(0) {
            Some(part) => {
                let (healed, kept) = colonist
                    .injuries
                    .drain(..)
                    .partition(|injury| injury.part.eq_ignore_ascii_case(part));
                colonist.injuries = kept;
                healed
            }
            None => {
                let worst = colonist
                    .injuries
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, injury)| injury.severity)
                    .map(|(index, _)| index)
                    .ok_or_else(|| DirectiveError::AgentState("no injuries".into()))?;
                vec![colonist.injuries.remove(worst)]
            }
        };
        let part = healed
            .first()
            .map(|injury| injury.part.clone())
            .ok_or_else(|| DirectiveError::AgentState("no matching injury".into()))?;
        Ok(DirectiveEffect::new(
            format!("healed:{}", healed.len()),
            format!("{}'s {part} has been treated.", colonist.name),
        ))
    }
}

/// Restores a missing body part.
pub struct RegrowLimb {
    definition: DirectiveDefinition,
}

impl RegrowLimb {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "REGROW_LIMB",
                DirectiveCategory::Health,
                "Regrow a missing body part",
            )
            .validation(ValidationLevel::Strict)
            .param(ParamSpec::required("part", ParamKind::Text)),
        })
    }
}

impl Directive<Colonist> for RegrowLimb {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && params
                .text(0)
                .map_or(true, |part| colonist.is_missing(&lookup_label(part)))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let part = clean_text(params, 0, "part", ctx)?;
        let Some(restored) = colonist.restore_part(&part) else {
            return Err(DirectiveError::Rejected(format!(
                "{} is not missing a {part}.",
                colonist.name
            )));
        };
        Ok(DirectiveEffect::new(
            format!("regrown:{restored}"),
            format!("{}'s {restored} grew back.", colonist.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{colonist::Injury, directives::testing::{allowed, run}};

    fn wounded() -> Colonist {
        let mut colonist = Colonist::new("c1", "Ada");
        colonist.injuries = vec![
            Injury {
                part: "left leg".into(),
                kind: "cut".into(),
                severity: 10,
            },
            Injury {
                part: "torso".into(),
                kind: "burn".into(),
                severity: 40,
            },
            Injury {
                part: "Left Leg".into(),
                kind: "bruise".into(),
                severity: 5,
            },
        ];
        colonist
    }

    #[test]
    fn heals_named_part() {
        let heal = Heal::handle();
        let mut colonist = wounded();
        assert!(allowed(&heal, &colonist, &["left leg"]));
        assert!(!allowed(&heal, &colonist, &["head"]));
        let effect = run(&heal, &mut colonist, &["left leg"], None).unwrap();
        assert_eq!(effect.status, "healed:2");
        assert_eq!(colonist.injuries.len(), 1);
    }

    #[test]
    fn heals_worst_injury_by_default() {
        let heal = Heal::handle();
        let mut colonist = wounded();
        let effect = run(&heal, &mut colonist, &[], None).unwrap();
        assert_eq!(effect.narrative, "Ada's torso has been treated.");
        assert!(!colonist.has_injury_on("torso"));
    }

    #[test]
    fn heal_needs_an_injury() {
        let heal = Heal::handle();
        assert!(!allowed(&heal, &Colonist::new("c2", "Bo"), &[]));
    }

    #[test]
    fn regrow_requires_missing_part() {
        let regrow = RegrowLimb::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        colonist.missing_parts.push("Left Arm".into());
        assert!(allowed(&regrow, &colonist, &[]));
        assert!(allowed(&regrow, &colonist, &["\"Left arm\""]));
        assert!(!allowed(&regrow, &colonist, &["right arm"]));
        let err = run(&regrow, &mut colonist, &["right arm"], None).unwrap_err();
        assert!(matches!(err, DirectiveError::Rejected(_)));
        let effect = run(&regrow, &mut colonist, &["left arm"], None).unwrap();
        assert_eq!(effect.status, "regrown:Left Arm");
        assert!(colonist.missing_parts.is_empty());
    }
}

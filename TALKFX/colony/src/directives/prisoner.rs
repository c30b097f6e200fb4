use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
    ValidationLevel,
};

use crate::Colonist;

const DEFAULT_PERSUASION: i64 = 5;

/// Wears down a prisoner's resistance; negative amounts harden it.
pub struct ReduceResistance {
    definition: DirectiveDefinition,
}

impl ReduceResistance {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "REDUCE_RESISTANCE",
                DirectiveCategory::Prisoner,
                "Persuade a prisoner to resist less (optional amount -20..20)",
            )
            .param(ParamSpec::optional("amount", ParamKind::Integer))
            .tag("captivity"),
        })
    }
}

impl Directive<Colonist> for ReduceResistance {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, _params: &Params<'_>) -> bool {
        colonist.alive && colonist.is_captive()
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        _params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let amount = ctx.magnitude.unwrap_or_default();
        let captivity = colonist
            .captivity
            .as_mut()
            .ok_or_else(|| DirectiveError::AgentState("not a prisoner".into()))?;
        captivity.resistance = captivity.resistance.saturating_sub(amount).clamp(0, 100);
        let resistance = captivity.resistance;
        let narrative = if resistance == 0 {
            format!("{} has stopped resisting.", colonist.name)
        } else if amount < 0 {
            format!("{} grows more defiant.", colonist.name)
        } else {
            format!("{} seems a little less defiant.", colonist.name)
        };
        Ok(DirectiveEffect::new(format!("resistance:{resistance}"), narrative))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(
            QuotaPolicy::unlimited()
                .with_cooldown(2)
                .with_magnitude_cap(30),
        )
    }

    fn magnitude(&self, params: &Params<'_>) -> Option<i64> {
        Some(params.int(0).unwrap_or(DEFAULT_PERSUASION))
    }
}

/// Turns a broken, recruitable prisoner into a colonist.
pub struct Recruit {
    definition: DirectiveDefinition,
}

impl Recruit {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "RECRUIT",
                DirectiveCategory::Prisoner,
                "Welcome a prisoner who no longer resists into the colony",
            )
            .validation(ValidationLevel::Strict)
            .tag("captivity"),
        })
    }
}

impl Directive<Colonist> for Recruit {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, _params: &Params<'_>) -> bool {
        colonist.alive
            && colonist
                .captivity
                .is_some_and(|captivity| captivity.recruitable && captivity.resistance == 0)
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        _params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        colonist
            .captivity
            .take()
            .ok_or_else(|| DirectiveError::AgentState("not a prisoner".into()))?;
        Ok(DirectiveEffect::new(
            "recruited",
            format!("{} has joined the colony.", colonist.name),
        ))
    }
}

/// Sets a prisoner free.
pub struct ReleasePrisoner {
    definition: DirectiveDefinition,
}

impl ReleasePrisoner {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "RELEASE_PRISONER",
                DirectiveCategory::Prisoner,
                "Let a prisoner go",
            )
            .validation(ValidationLevel::Strict)
            .tag("captivity"),
        })
    }
}

impl Directive<Colonist> for ReleasePrisoner {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, _params: &Params<'_>) -> bool {
        colonist.alive && colonist.is_captive()
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        _params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        colonist
            .captivity
            .take()
            .ok_or_else(|| DirectiveError::AgentState("not a prisoner".into()))?;
        colonist.location = Some("outside the colony".into());
        Ok(DirectiveEffect::new(
            "released",
            format!("{} walks free.", colonist.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        colonist::Captivity,
        directives::testing::{allowed, run},
    };

    fn prisoner(resistance: i32) -> Colonist {
        let mut colonist = Colonist::new("p1", "Vex");
        colonist.captivity = Some(Captivity {
            resistance,
            recruitable: true,
        });
        colonist
    }

    #[test]
    fn resistance_goes_down_then_recruit() {
        let reduce = ReduceResistance::handle();
        let recruit = Recruit::handle();
        let mut colonist = prisoner(8);
        assert!(!allowed(&recruit, &colonist, &[]));
        assert_eq!(reduce.magnitude(&talkfx_directives::Params::empty()), Some(5));
        let effect = run(&reduce, &mut colonist, &["10"], Some(10)).unwrap();
        assert_eq!(effect.status, "resistance:0");
        assert!(allowed(&recruit, &colonist, &[]));
        run(&recruit, &mut colonist, &[], None).unwrap();
        assert!(!colonist.is_captive());
        assert!(!allowed(&reduce, &colonist, &[]));
    }

    #[test]
    fn negative_persuasion_hardens() {
        let reduce = ReduceResistance::handle();
        let mut colonist = prisoner(50);
        let effect = run(&reduce, &mut colonist, &["-10"], Some(-10)).unwrap();
        assert_eq!(effect.status, "resistance:60");
        assert_eq!(effect.narrative, "Vex grows more defiant.");
    }

    #[test]
    fn release_moves_prisoner_out() {
        let release = ReleasePrisoner::handle();
        let mut colonist = prisoner(50);
        run(&release, &mut colonist, &[], None).unwrap();
        assert!(colonist.captivity.is_none());
        assert_eq!(colonist.location.as_deref(), Some("outside the colony"));
    }
}

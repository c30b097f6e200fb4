use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params, QuotaPolicy,
    ValidationLevel,
};

use super::clean_text;
use crate::{colonist::MAX_TRAITS, Colonist};

/// Gives the colonist a new personality trait.
pub struct AddTrait {
    definition: DirectiveDefinition,
}

impl AddTrait {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "ADD_TRAIT",
                DirectiveCategory::Transform,
                "Develop a new personality trait",
            )
            .validation(ValidationLevel::Strict)
            .param(ParamSpec::required("trait", ParamKind::Text)),
        })
    }
}

impl Directive<Colonist> for AddTrait {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && colonist.traits.len() < MAX_TRAITS
            && params.text(0).map_or(true, |name| !colonist.has_trait(name))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let name = clean_text(params, 0, "trait", ctx)?;
        if colonist.has_trait(&name) {
            return Err(DirectiveError::Rejected(format!(
                "{} is already {name}.",
                colonist.name
            )));
        }
        colonist.traits.push(name.clone());
        Ok(DirectiveEffect::new(
            format!("trait_added:{name}"),
            format!("{} has become {name}.", colonist.name),
        ))
    }

    fn quota(&self) -> Option<QuotaPolicy> {
        Some(QuotaPolicy::unlimited().with_daily_cap(1))
    }
}

/// Removes a personality trait.
pub struct RemoveTrait {
    definition: DirectiveDefinition,
}

impl RemoveTrait {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "REMOVE_TRAIT",
                DirectiveCategory::Transform,
                "Outgrow a personality trait",
            )
            .validation(ValidationLevel::Strict)
            .param(ParamSpec::required("trait", ParamKind::Text)),
        })
    }
}

impl Directive<Colonist> for RemoveTrait {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && !colonist.traits.is_empty()
            && params.text(0).map_or(true, |name| colonist.has_trait(name))
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let name = params.text(0).unwrap_or_default();
        let index = colonist
            .traits
            .iter()
            .position(|t| t.eq_ignore_ascii_case(name))
            .ok_or_else(|| DirectiveError::AgentState(format!("no trait {name:?}")))?;
        let removed = colonist.traits.remove(index);
        Ok(DirectiveEffect::new(
            format!("trait_removed:{removed}"),
            format!("{} is no longer {removed}.", colonist.name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::testing::{allowed, run};

    #[test]
    fn adds_until_full() {
        let add = AddTrait::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        colonist.traits = vec!["kind".into(), "tough".into()];
        assert!(!allowed(&add, &colonist, &["Kind"]));
        let effect = run(&add, &mut colonist, &["<i>Optimist</i>"], None).unwrap();
        assert_eq!(effect.status, "trait_added:optimist");
        assert!(!allowed(&add, &colonist, &[]));
    }

    #[test]
    fn removes_existing_trait() {
        let remove = RemoveTrait::handle();
        let mut colonist = Colonist::new("c1", "Ada");
        assert!(!allowed(&remove, &colonist, &[]));
        colonist.traits.push("pessimist".into());
        assert!(!allowed(&remove, &colonist, &["kind"]));
        run(&remove, &mut colonist, &["Pessimist"], None).unwrap();
        assert!(colonist.traits.is_empty());
    }
}

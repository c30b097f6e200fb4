use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params,
};

use super::{clean_text, count, key};
use crate::Colonist;

const MAX_STACK: u32 = 75;

/// Hands items to the colonist.
pub struct GiveItem {
    definition: DirectiveDefinition,
}

impl GiveItem {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "GIVE_ITEM",
                DirectiveCategory::Inventory,
                "Hand over an item (optional count up to 75)",
            )
            .param(ParamSpec::required("item", ParamKind::Text))
            .param(ParamSpec::optional("count", ParamKind::Integer)),
        })
    }
}

impl Directive<Colonist> for GiveItem {
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
        let item = key(&clean_text(params, 0, "item", ctx)?);
        let amount = count(params, 1, "count", 1, MAX_STACK)?;
        let held = colonist.inventory.entry(item.clone()).or_default();
        *held = held.saturating_add(amount);
        Ok(DirectiveEffect::new(
            format!("given:{item}:{amount}"),
            format!("{} received {amount} x {item}.", colonist.name),
        ))
    }
}

/// Drops carried items.
pub struct DropItem {
    definition: DirectiveDefinition,
}

impl DropItem {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "DROP_ITEM",
                DirectiveCategory::Inventory,
                "Drop a carried item (optional count)",
            )
            .param(ParamSpec::required("item", ParamKind::Text))
            .param(ParamSpec::optional("count", ParamKind::Integer)),
        })
    }
}

impl Directive<Colonist> for DropItem {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, params: &Params<'_>) -> bool {
        colonist.alive
            && !colonist.inventory.is_empty()
            && params.text(0).map_or(true, |item| colonist.carried(item) > 0)
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let item = key(params.text(0).unwrap_or_default());
        let held = colonist.carried(&item);
        let amount = count(params, 1, "count", held, u32::MAX)?.min(held);
        if amount == 0 {
            return Err(DirectiveError::AgentState(format!("not carrying {item}")));
        }
        if amount == held {
            colonist.inventory.remove(&item);
        } else {
            colonist.inventory.insert(item.clone(), held - amount);
        }
        Ok(DirectiveEffect::new(
            format!("dropped:{item}:{amount}"),
            format!("{} dropped {amount} x {item}.", colonist.name),
        ))
    }
}

use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params,
};

use super::clean_text;
use crate::Colonist;

/// Sends the colonist somewhere.
pub struct GoTo {
    definition: DirectiveDefinition,
}

impl GoTo {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "GO_TO",
                DirectiveCategory::Movement,
                "Walk to a named place",
            )
            .param(ParamSpec::required("place", ParamKind::Text)),
        })
    }
}

impl Directive<Colonist> for GoTo {
    fn definition(&self) -> &DirectiveDefinition {
        &self.definition
    }

    fn can_execute(&self, colonist: &Colonist, _params: &Params<'_>) -> bool {
        colonist.is_active() && !colonist.is_captive()
    }

    fn execute(
        &self,
        colonist: &mut Colonist,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let place = clean_text(params, 0, "place", ctx)?;
        if colonist
            .location
            .as_deref()
            .is_some_and(|current| current.eq_ignore_ascii_case(&place))
        {
            return Err(DirectiveError::Rejected(format!(
                "{} is already at the {place}.",
                colonist.name
            )));
        }
        colonist.location = Some(place.clone());
        Ok(DirectiveEffect::new(
            format!("moved:{place}"),
            format!("{} heads to the {place}.", colonist.name),
        ))
    }
}

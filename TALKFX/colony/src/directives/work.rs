use std::sync::Arc;

use talkfx_directives::{
    Directive, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    DirectiveHandle, ExecutionContext, ParamKind, ParamSpec, Params,
};

use super::key;
use crate::{colonist::MAX_WORK_PRIORITY, Colonist};

/// Changes the priority of one work type; zero disables it.
pub struct SetWorkPriority {
    definition: DirectiveDefinition,
}

impl SetWorkPriority {
    /// Boxed handler for the registration table.
    #[must_use]
    pub fn handle() -> DirectiveHandle<Colonist> {
        Arc::new(Self {
            definition: DirectiveDefinition::new(
                "SET_WORK_PRIORITY",
                DirectiveCategory::Work,
                "Change how eagerly a job is done (work type, 0 = never .. 1 = first .. 4 = last)",
            )
            .param(ParamSpec::required("work", ParamKind::Word))
            .param(ParamSpec::required("priority", ParamKind::Integer)),
        })
    }
}

impl Directive<Colonist> for SetWorkPriority {
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
        _ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError> {
        let work = key(params.text(0).unwrap_or_default());
        let priority = params
            .int(1)
            .and_then(|value| u8::try_from(value).ok())
            .filter(|value| *value <= MAX_WORK_PRIORITY)
            .ok_or_else(|| DirectiveError::InvalidParameter {
                name: "priority".into(),
                detail: format!("expected 0..={MAX_WORK_PRIORITY}"),
            })?;
        let previous = colonist.work_priorities.insert(work.clone(), priority);
        if previous == Some(priority) {
            return Err(DirectiveError::Rejected(format!(
                "{} already treats {work} that way.",
                colonist.name
            )));
        }
        let narrative = if priority == 0 {
            format!("{} will no longer do {work}.", colonist.name)
        } else {
            format!("{} will do {work} at priority {priority}.", colonist.name)
        };
        Ok(DirectiveEffect::new(
            format!("priority:{work}:{priority}"),
            narrative,
        ))
    }
}

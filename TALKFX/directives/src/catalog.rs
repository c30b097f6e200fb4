use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{
    clock::Tick,
    config::SanitizeSettings,
    directive::{
        normalize_id, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
        Params,
    },
    quota::QuotaPolicy,
    sanitize::{clamp_magnitude, sanitize_text},
};

/// Identity of the agent a batch is dispatched for; everything else about the agent is
/// opaque to the engine and only read by directive and ranking code.
pub trait AgentHandle {
    /// Stable identifier used to key quota state.
    fn agent_id(&self) -> &str;
}

/// Contract implemented by every directive handler.
pub trait Directive<A>: Send + Sync {
    /// Static definition.
    fn definition(&self) -> &DirectiveDefinition;

    /// Pure eligibility predicate. Called with [`Params::empty`] to test general availability;
    /// must return `false` rather than fail on anything missing or malformed.
    fn can_execute(&self, agent: &A, params: &Params<'_>) -> bool;

    /// Applies the directive. Only called after the gate admitted the invocation.
    fn execute(
        &self,
        agent: &mut A,
        params: &Params<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<DirectiveEffect, DirectiveError>;

    /// Rate limits, if the directive needs temporal throttling.
    fn quota(&self) -> Option<QuotaPolicy> {
        None
    }

    /// Signed magnitude carried by the invocation, before clamping.
    fn magnitude(&self, _params: &Params<'_>) -> Option<i64> {
        None
    }
}

/// Per-invocation data handed to [`Directive::execute`].
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Batch tick.
    pub now: Tick,
    /// Magnitude after clamping, when the directive declares one.
    pub magnitude: Option<i32>,
    /// Text and duration settings.
    pub settings: &'a SanitizeSettings,
}

impl<'a> ExecutionContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(now: Tick, magnitude: Option<i32>, settings: &'a SanitizeSettings) -> Self {
        Self {
            now,
            magnitude,
            settings,
        }
    }

    /// Sanitizes free text with the configured length limit.
    #[must_use]
    pub fn sanitize(&self, text: &str) -> String {
        sanitize_text(text, self.settings.max_text_len)
    }

    /// Clamps an arbitrary value into the configured magnitude range.
    #[must_use]
    pub fn clamp(&self, value: i64) -> i32 {
        clamp_magnitude(value, self.settings.magnitude_limit)
    }

    /// Effect duration for `magnitude` according to the configured tiers.
    #[must_use]
    pub const fn duration_for(&self, magnitude: i32) -> Tick {
        self.settings.duration_tiers.duration_for(magnitude)
    }
}

/// Shared handler pointer stored by the catalog.
pub type DirectiveHandle<A> = Arc<dyn Directive<A>>;

/// Registry of directive handlers keyed by canonical identifier.
///
/// Registration order is kept and breaks ranking ties. Registering an identifier twice
/// replaces the earlier handler in place.
pub struct DirectiveCatalog<A> {
    handlers: IndexMap<String, DirectiveHandle<A>>,
}

impl<A> Default for DirectiveCatalog<A> {
    fn default() -> Self {
        Self {
            handlers: IndexMap::new(),
        }
    }
}

impl<A> Clone for DirectiveCatalog<A> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<A> fmt::Debug for DirectiveCatalog<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveCatalog")
            .field("directives", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<A> DirectiveCatalog<A> {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a static registration table.
    #[must_use]
    pub fn from_table(table: &[fn() -> DirectiveHandle<A>]) -> Self {
        let mut catalog = Self::new();
        for constructor in table {
            catalog.register(constructor());
        }
        catalog
    }

    /// Registers a handler under its definition's identifier. Returns the replaced handler.
    pub fn register(&mut self, handler: DirectiveHandle<A>) -> Option<DirectiveHandle<A>> {
        let id = normalize_id(&handler.definition().id);
        self.handlers.insert(id, handler)
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&DirectiveHandle<A>> {
        self.handlers.get(&normalize_id(id))
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// Handlers of `category` in registration order.
    #[must_use]
    pub fn all_by_category(&self, category: DirectiveCategory) -> Vec<&DirectiveHandle<A>> {
        self.handlers
            .values()
            .filter(|handler| handler.definition().category == category)
            .collect()
    }

    /// All handlers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DirectiveHandle<A>> {
        self.handlers.values()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.handlers.values().map(|handler| handler.definition())
    }

    /// Number of registered directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

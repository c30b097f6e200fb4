#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Directive execution engine: finds `[ACTION:ID:...]` tokens in generated text, admits each
//! invocation through schema, predicate and quota checks, applies it to the host's agent with
//! per-invocation failure isolation, and ranks the directives worth advertising next.

/// Handler trait, execution context and registry.
pub mod catalog;
/// Time sources.
pub mod clock;
/// TOML engine configuration.
pub mod config;
/// Definitions, invocations and results.
pub mod directive;
/// Batch execution.
pub mod dispatcher;
pub mod gate;
pub mod parser;
/// Cooldown, daily-cap and magnitude-cap tracking.
pub mod quota;
/// Relevance scoring and advertisements.
pub mod ranker;
pub mod sanitize;
/// Structured log sinks for the engine.
pub mod telemetry;

pub use catalog::{AgentHandle, Directive, DirectiveCatalog, DirectiveHandle, ExecutionContext};
pub use clock::{Clock, ManualClock, MonotonicClock, Tick};
pub use config::{EngineConfig, RankingSettings, SanitizeSettings, TimeSettings};
pub use directive::{
    normalize_id, DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError,
    ExecutionResult, Invocation, OutcomeKind, ParamKind, ParamSpec, Params, SchemaError,
    ValidationLevel,
};
pub use dispatcher::{DispatchReport, Dispatcher, DispatcherBuilder};
pub use gate::{Admission, Denial, Gate};
pub use parser::ParsedText;
pub use quota::{
    QuotaDenial, QuotaLedger, QuotaPolicy, QuotaRecord, QuotaSnapshot, QuotaState,
    SharedQuotaLedger,
};
pub use ranker::{
    AdvertisedCategory, AdvertisedDirective, Advertisement, FnRule, Ranker, RelevanceRule,
};
pub use sanitize::{clamp_magnitude, sanitize_text, DurationTiers};
pub use telemetry::{DirectiveTelemetry, DirectiveTelemetryBuilder};

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Reference colonist model with the standard directive set and relevance rules.

/// Colonist state read and mutated by directives.
pub mod colonist;
pub mod directives;
pub mod rules;

use talkfx_directives::{
    DirectiveCatalog, DirectiveHandle, DirectiveTelemetry, Dispatcher, EngineConfig,
};

pub use colonist::Colonist;
pub use rules::standard_rules;

use directives::{
    health, inventory, mood, movement, needs, prisoner, skills, social, special, transform, work,
};

/// Registration table of the standard directives, in advertisement tie-break order.
pub const STANDARD_DIRECTIVES: &[fn() -> DirectiveHandle<Colonist>] = &[
    health::Heal::handle,
    health::RegrowLimb::handle,
    mood::AddThought::handle,
    mood::RemoveThought::handle,
    social::ChangeOpinion::handle,
    skills::GainXp::handle,
    prisoner::ReduceResistance::handle,
    prisoner::Recruit::handle,
    prisoner::ReleasePrisoner::handle,
    work::SetWorkPriority::handle,
    needs::SatisfyNeed::handle,
    transform::AddTrait::handle,
    transform::RemoveTrait::handle,
    inventory::GiveItem::handle,
    inventory::DropItem::handle,
    movement::GoTo::handle,
    special::Inspire::handle,
];

/// Catalog holding every standard directive.
#[must_use]
pub fn standard_catalog() -> DirectiveCatalog<Colonist> {
    DirectiveCatalog::from_table(STANDARD_DIRECTIVES)
}

/// Dispatcher wired with the standard catalog and rules.
#[must_use]
pub fn bootstrap(config: EngineConfig, telemetry: Option<DirectiveTelemetry>) -> Dispatcher<Colonist> {
    let builder = standard_rules().into_iter().fold(
        Dispatcher::builder()
            .catalog(standard_catalog())
            .config(config),
        |builder, rule| builder.rule(rule),
    );
    match telemetry {
        Some(telemetry) => builder.telemetry(telemetry).build(),
        None => builder.build(),
    }
}

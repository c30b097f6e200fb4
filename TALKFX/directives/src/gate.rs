//! Admission checks run before a directive executes and when the ranker filters candidates.

use std::fmt;

use crate::{
    catalog::{AgentHandle, Directive},
    clock::Tick,
    config::EngineConfig,
    directive::{Params, SchemaError},
    quota::{QuotaDenial, QuotaLedger, QuotaPolicy},
    sanitize::clamp_magnitude,
};

/// Reason an invocation was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// Switched off in the configuration.
    Disabled,
    /// Parameters do not match the declared schema.
    InvalidParameters(SchemaError),
    /// The directive's own predicate refused.
    Precondition,
    /// A quota guard refused.
    Quota(QuotaDenial),
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::InvalidParameters(err) => write!(f, "invalid parameters: {err}"),
            Self::Precondition => f.write_str("precondition"),
            Self::Quota(denial) => write!(f, "quota: {denial}"),
        }
    }
}

/// Admitted invocation: what the dispatcher needs to execute and then record it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Clamped magnitude, when the directive declares one.
    pub magnitude: Option<i32>,
    /// Effective quota policy to record after success.
    pub policy: Option<QuotaPolicy>,
}

/// Read-only view over configuration and quota state at one tick.
#[derive(Debug, Clone, Copy)]
pub struct Gate<'a> {
    config: &'a EngineConfig,
    ledger: &'a QuotaLedger,
    now: Tick,
}

impl<'a> Gate<'a> {
    /// Creates a gate evaluated at `now`.
    #[must_use]
    pub const fn new(config: &'a EngineConfig, ledger: &'a QuotaLedger, now: Tick) -> Self {
        Self {
            config,
            ledger,
            now,
        }
    }

    /// Full admission check for an invocation: disabled flag, schema, predicate, quota.
    pub fn admit<A: AgentHandle>(
        &self,
        directive: &dyn Directive<A>,
        agent: &A,
        params: &Params<'_>,
    ) -> Result<Admission, Denial> {
        let definition = directive.definition();
        if self.config.is_disabled(&definition.id) {
            return Err(Denial::Disabled);
        }
        definition
            .validate_params(params.as_slice())
            .map_err(Denial::InvalidParameters)?;
        if !directive.can_execute(agent, params) {
            return Err(Denial::Precondition);
        }
        let magnitude = directive
            .magnitude(params)
            .map(|value| clamp_magnitude(value, self.config.sanitize.magnitude_limit));
        let policy = self.config.quota_for(&definition.id, directive.quota());
        if let Some(policy) = &policy {
            self.ledger
                .check(policy, &definition.id, agent.agent_id(), self.now, magnitude)
                .map_err(Denial::Quota)?;
        }
        Ok(Admission { magnitude, policy })
    }

    /// General availability used for advertisements: the predicate with no parameters plus
    /// the disabled flag and quota guards. Parameter schemas are not consulted.
    #[must_use]
    pub fn is_available<A: AgentHandle>(&self, directive: &dyn Directive<A>, agent: &A) -> bool {
        let definition = directive.definition();
        if self.config.is_disabled(&definition.id) || !directive.can_execute(agent, &Params::empty())
        {
            return false;
        }
        self.config
            .quota_for(&definition.id, directive.quota())
            .map_or(true, |policy| {
                self.ledger
                    .check(&policy, &definition.id, agent.agent_id(), self.now, None)
                    .is_ok()
            })
    }
}

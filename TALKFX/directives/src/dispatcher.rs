use std::{
    any::Any,
    borrow::Cow,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use serde::Serialize;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    catalog::{AgentHandle, DirectiveCatalog, DirectiveHandle, ExecutionContext},
    clock::{Clock, ManualClock, Tick},
    config::EngineConfig,
    directive::{ExecutionResult, Invocation},
    gate::Gate,
    parser,
    quota::{QuotaLedger, SharedQuotaLedger},
    ranker::{Advertisement, Ranker, RelevanceRule},
    telemetry::DirectiveTelemetry,
};

/// Builder used to configure a [`Dispatcher`].
pub struct DispatcherBuilder<A> {
    catalog: DirectiveCatalog<A>,
    replaced: Vec<String>,
    rules: Vec<Arc<dyn RelevanceRule<A>>>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    telemetry: Option<DirectiveTelemetry>,
}

impl<A> Default for DispatcherBuilder<A> {
    fn default() -> Self {
        Self {
            catalog: DirectiveCatalog::new(),
            replaced: Vec::new(),
            rules: Vec::new(),
            config: EngineConfig::default(),
            clock: Arc::new(ManualClock::default()),
            telemetry: None,
        }
    }
}

impl<A: AgentHandle> DispatcherBuilder<A> {
    /// Replaces the catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: DirectiveCatalog<A>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Registers one more handler; a handler with an existing identifier replaces it.
    #[must_use]
    pub fn register(mut self, handler: DirectiveHandle<A>) -> Self {
        let id = handler.definition().id.clone();
        if self.catalog.register(handler).is_some() {
            self.replaced.push(id);
        }
        self
    }

    /// Adds a relevance rule.
    #[must_use]
    pub fn rule(mut self, rule: Arc<dyn RelevanceRule<A>>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Overrides the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn telemetry(mut self, telemetry: DirectiveTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Finalizes the builder returning a [`Dispatcher`].
    #[must_use]
    pub fn build(self) -> Dispatcher<A> {
        let ranker = self
            .rules
            .into_iter()
            .fold(Ranker::new(self.config.ranking.per_category_limit), Ranker::rule);
        let dispatcher = Dispatcher {
            catalog: Arc::new(self.catalog),
            ranker,
            config: self.config,
            clock: self.clock,
            telemetry: self.telemetry,
        };
        for id in self.replaced {
            dispatcher.log(
                LogLevel::Warn,
                "directives.catalog.replaced",
                json!({ "directive": id }),
            );
        }
        dispatcher
    }
}

/// Outcome of one dispatched batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport<'t> {
    /// Source text with every token removed; the original text when it held none.
    pub text: Cow<'t, str>,
    /// One result per invocation, in source order.
    pub results: Vec<ExecutionResult>,
}

impl<'t> DispatchReport<'t> {
    /// Cleaned text.
    #[must_use]
    pub fn cleaned_text(&self) -> &str {
        &self.text
    }

    /// Narratives joined line by line, ready to append to the conversation.
    #[must_use]
    pub fn narration(&self) -> String {
        self.results
            .iter()
            .map(|result| result.narrative.as_str())
            .filter(|narrative| !narrative.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Results of applied directives.
    pub fn successes(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.results.iter().filter(|result| result.is_success())
    }

    /// Whether the text carried no directive at all.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.results.is_empty()
    }

    /// Detaches the report from the source text.
    #[must_use]
    pub fn into_owned(self) -> DispatchReport<'static> {
        DispatchReport {
            text: Cow::Owned(self.text.into_owned()),
            results: self.results,
        }
    }
}

/// Parses generated text and applies the directives it carries, one at a time.
///
/// Every invocation gets exactly one [`ExecutionResult`]; nothing an individual directive does
/// (unknown id, refused gate, error, panic) stops the rest of the batch.
pub struct Dispatcher<A> {
    catalog: Arc<DirectiveCatalog<A>>,
    ranker: Ranker<A>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    telemetry: Option<DirectiveTelemetry>,
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("directives", &self.catalog.len())
            .field("config", &self.config)
            .field("telemetry", &self.telemetry.is_some())
            .finish_non_exhaustive()
    }
}

impl<A: AgentHandle> Dispatcher<A> {
    /// Creates a builder with an empty catalog and default configuration.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<A> {
        DispatcherBuilder::default()
    }

    /// Registered directives.
    #[must_use]
    pub fn catalog(&self) -> &DirectiveCatalog<A> {
        &self.catalog
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current tick of the configured clock.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Empty ledger using the configured day window.
    #[must_use]
    pub fn new_ledger(&self) -> QuotaLedger {
        QuotaLedger::new(self.config.time.day_length)
    }

    /// Dispatches `text` at the clock's current tick.
    pub fn dispatch<'t>(
        &self,
        text: &'t str,
        agent: &mut A,
        ledger: &mut QuotaLedger,
    ) -> DispatchReport<'t> {
        self.dispatch_at(text, agent, ledger, self.clock.now())
    }

    /// Dispatches with the ledger locked for the whole batch.
    pub fn dispatch_shared<'t>(
        &self,
        text: &'t str,
        agent: &mut A,
        ledger: &SharedQuotaLedger,
    ) -> DispatchReport<'t> {
        let now = self.clock.now();
        let mut guard = ledger.lock();
        self.dispatch_at(text, agent, &mut guard, now)
    }

    /// Dispatches `text` with every invocation evaluated at `now`.
    pub fn dispatch_at<'t>(
        &self,
        text: &'t str,
        agent: &mut A,
        ledger: &mut QuotaLedger,
        now: Tick,
    ) -> DispatchReport<'t> {
        let parsed = parser::parse(text);
        if parsed.is_empty() {
            return DispatchReport {
                text: parsed.cleaned,
                results: Vec::new(),
            };
        }
        self.log(
            LogLevel::Debug,
            "directives.batch.parsed",
            json!({
                "agent": agent.agent_id(),
                "tick": now,
                "invocations": parsed.invocations.len(),
            }),
        );
        self.maybe_sweep(ledger, now);

        let results = parsed
            .invocations
            .iter()
            .map(|invocation| self.run(invocation, agent, ledger, now))
            .collect();
        DispatchReport {
            text: parsed.cleaned,
            results,
        }
    }

    /// Ranked advertisement at the clock's current tick.
    #[must_use]
    pub fn advertise(&self, agent: &A, ledger: &QuotaLedger) -> Advertisement {
        self.advertise_at(agent, ledger, self.clock.now())
    }

    /// Ranked advertisement at `now`.
    #[must_use]
    pub fn advertise_at(&self, agent: &A, ledger: &QuotaLedger, now: Tick) -> Advertisement {
        let gate = Gate::new(&self.config, ledger, now);
        let advertisement = self.ranker.rank(&self.catalog, agent, &gate);
        self.log(
            LogLevel::Debug,
            "directives.advertisement.built",
            json!({
                "agent": agent.agent_id(),
                "tick": now,
                "advertised": advertisement.len(),
                "categories": advertisement.categories.len(),
            }),
        );
        advertisement
    }

    fn run(
        &self,
        invocation: &Invocation,
        agent: &mut A,
        ledger: &mut QuotaLedger,
        now: Tick,
    ) -> ExecutionResult {
        let Some(handler) = self.catalog.lookup(&invocation.id) else {
            self.log(
                LogLevel::Warn,
                "directives.invocation.unknown",
                json!({ "directive": invocation.id, "offset": invocation.offset }),
            );
            return ExecutionResult::unknown(invocation);
        };

        let params = invocation.params();
        let gate = Gate::new(&self.config, ledger, now);
        let admission = match panic::catch_unwind(AssertUnwindSafe(|| {
            gate.admit(&**handler, &*agent, &params)
        })) {
            Ok(Ok(admission)) => admission,
            Ok(Err(denial)) => {
                self.log(
                    LogLevel::Info,
                    "directives.invocation.denied",
                    json!({
                        "directive": invocation.id,
                        "agent": agent.agent_id(),
                        "reason": denial.to_string(),
                    }),
                );
                return ExecutionResult::denied(invocation, denial);
            }
            Err(payload) => {
                return self.contain_panic(invocation, agent, "admission", payload.as_ref());
            }
        };

        let ctx = ExecutionContext::new(now, admission.magnitude, &self.config.sanitize);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.execute(agent, &params, &ctx)
        }));
        match outcome {
            Ok(Ok(effect)) => {
                if let Some(policy) = &admission.policy {
                    ledger.record(
                        policy,
                        &invocation.id,
                        agent.agent_id(),
                        now,
                        admission.magnitude,
                    );
                }
                self.log(
                    LogLevel::Info,
                    "directives.invocation.succeeded",
                    json!({
                        "directive": invocation.id,
                        "agent": agent.agent_id(),
                        "status": effect.status,
                        "magnitude": admission.magnitude,
                    }),
                );
                ExecutionResult::success(invocation, effect)
            }
            Ok(Err(err)) => {
                self.log(
                    LogLevel::Error,
                    "directives.invocation.failed",
                    json!({
                        "directive": invocation.id,
                        "agent": agent.agent_id(),
                        "code": err.code(),
                        "error": format!("{err:#}"),
                    }),
                );
                ExecutionResult::failed(invocation, &err)
            }
            Err(payload) => self.contain_panic(invocation, agent, "execute", payload.as_ref()),
        }
    }

    // A panic in the predicate, magnitude, quota or execute hook fails only its own invocation.
    fn contain_panic(
        &self,
        invocation: &Invocation,
        agent: &A,
        stage: &str,
        payload: &(dyn Any + Send),
    ) -> ExecutionResult {
        self.log(
            LogLevel::Error,
            "directives.invocation.failed",
            json!({
                "directive": invocation.id,
                "agent": agent.agent_id(),
                "code": "panic",
                "stage": stage,
                "error": panic_message(payload),
            }),
        );
        ExecutionResult::panicked(invocation)
    }

    fn maybe_sweep(&self, ledger: &mut QuotaLedger, now: Tick) {
        if now.saturating_sub(ledger.last_sweep()) < self.config.time.sweep_interval {
            return;
        }
        let removed = ledger.sweep(now);
        self.log(
            LogLevel::Debug,
            "directives.quota.swept",
            json!({ "tick": now, "removed": removed, "remaining": ledger.len() }),
        );
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            if let Err(err) = tel.log(level, message, metadata) {
                eprintln!("directive telemetry write failed: {err:?}");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{
            tests::{Recorder, TestAgent},
            Directive,
        },
        directive::{
            DirectiveCategory, DirectiveDefinition, DirectiveEffect, DirectiveError, OutcomeKind,
            ParamKind, ParamSpec, Params,
        },
        quota::QuotaPolicy,
    };
    use shared_logging::MemoryLogger;

    struct Cheer {
        definition: DirectiveDefinition,
    }

    impl Directive<TestAgent> for Cheer {
        fn definition(&self) -> &DirectiveDefinition {
            &self.definition
        }

        fn can_execute(&self, agent: &TestAgent, _params: &Params<'_>) -> bool {
            agent.alive
        }

        fn execute(
            &self,
            agent: &mut TestAgent,
            _params: &Params<'_>,
            ctx: &ExecutionContext<'_>,
        ) -> Result<DirectiveEffect, DirectiveError> {
            let amount = ctx.magnitude.unwrap_or_default();
            agent.mood += amount;
            Ok(DirectiveEffect::new(
                format!("mood:{amount:+}"),
                format!("Mood changed by {amount:+}."),
            ))
        }

        fn quota(&self) -> Option<QuotaPolicy> {
            Some(QuotaPolicy::unlimited().with_cooldown(3).with_daily_cap(3))
        }

        fn magnitude(&self, params: &Params<'_>) -> Option<i64> {
            params.int(0)
        }
    }

    fn cheer() -> DirectiveHandle<TestAgent> {
        Arc::new(Cheer {
            definition: DirectiveDefinition::new("CHEER", DirectiveCategory::Mood, "cheer up")
                .param(ParamSpec::required("amount", ParamKind::Integer)),
        })
    }

    fn dispatcher(memory: &Arc<MemoryLogger>) -> Dispatcher<TestAgent> {
        let telemetry = DirectiveTelemetry::builder("directives")
            .sink(memory.clone())
            .build()
            .unwrap();
        Dispatcher::builder()
            .register(Recorder::handle("A", DirectiveCategory::Special))
            .register(Recorder::handle("B", DirectiveCategory::Special))
            .register(Recorder::handle("C", DirectiveCategory::Special))
            .register(cheer())
            .telemetry(telemetry)
            .build()
    }

    fn outcomes(report: &DispatchReport<'_>) -> Vec<OutcomeKind> {
        report.results.iter().map(|r| r.outcome).collect()
    }

    #[test]
    fn plain_text_is_a_borrowed_noop() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let text = "  Just talking.  ";
        let report = dispatcher.dispatch(text, &mut agent, &mut ledger);
        assert!(report.is_noop());
        assert!(matches!(report.text, Cow::Borrowed(_)));
        assert_eq!(report.cleaned_text(), text);
        assert!(memory.snapshot().is_empty());
    }

    #[test]
    fn unknown_directive_is_isolated() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch(
            "[ACTION:A] [ACTION:FOO:1] [ACTION:B] [ACTION:C]",
            &mut agent,
            &mut ledger,
        );
        assert_eq!(report.results.len(), 4);
        assert_eq!(report.successes().count(), 3);
        assert_eq!(report.results[1].outcome, OutcomeKind::UnknownDirective);
        assert_eq!(report.results[1].narrative, "Unknown directive: FOO");
        assert_eq!(agent.log, ["A", "B", "C"]);
        assert_eq!(report.cleaned_text(), "");
        assert_eq!(memory.find("directives.invocation.unknown").len(), 1);
    }

    #[test]
    fn results_follow_source_order() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch(
            "First [ACTION:C] then [ACTION:a] and [ACTION:B].",
            &mut agent,
            &mut ledger,
        );
        let ids: Vec<_> = report.results.iter().map(|r| r.directive_id.as_str()).collect();
        assert_eq!(ids, ["C", "A", "B"]);
        assert_eq!(agent.log, ["C", "A", "B"]);
        assert_eq!(report.cleaned_text(), "First then and.");
        assert_eq!(report.narration(), "C ran\nA ran\nB ran");
    }

    #[test]
    fn gate_failure_changes_nothing() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch(
            "[ACTION:A:blocked] [ACTION:CHEER:lots]",
            &mut agent,
            &mut ledger,
        );
        assert_eq!(
            outcomes(&report),
            [OutcomeKind::PreconditionFailed, OutcomeKind::PreconditionFailed]
        );
        assert_eq!(report.results[0].narrative, "Cannot execute A");
        assert!(report.results[1].result.starts_with("invalid parameters"));
        assert!(agent.log.is_empty());
        assert_eq!(agent.mood, 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn mutation_is_visible_to_later_gates() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch("[ACTION:A:kill] [ACTION:B]", &mut agent, &mut ledger);
        assert_eq!(
            outcomes(&report),
            [OutcomeKind::Success, OutcomeKind::PreconditionFailed]
        );
    }

    #[test]
    fn errors_and_panics_are_contained() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch(
            "[ACTION:A:fail] [ACTION:B:panic] [ACTION:C:refuse] [ACTION:A]",
            &mut agent,
            &mut ledger,
        );
        assert_eq!(
            outcomes(&report),
            [
                OutcomeKind::ExecutionError,
                OutcomeKind::ExecutionError,
                OutcomeKind::ExecutionError,
                OutcomeKind::Success
            ]
        );
        assert_eq!(report.results[0].result, "error:internal");
        assert_eq!(report.results[0].narrative, "A could not be carried out");
        assert!(!report.results[0].narrative.contains("disk"));
        assert_eq!(report.results[1].result, "error:panic");
        assert_eq!(report.results[2].narrative, "Not today.");

        let failures = memory.find("directives.invocation.failed");
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0].metadata["error"], "disk on fire");
        assert_eq!(failures[1].metadata["error"], "handler bug");
        assert_eq!(failures[1].metadata["stage"], "execute");
    }

    #[test]
    fn panicking_predicate_fails_only_its_invocation() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch(
            "[ACTION:A] [ACTION:B:sulk] [ACTION:C]",
            &mut agent,
            &mut ledger,
        );
        assert_eq!(
            outcomes(&report),
            [
                OutcomeKind::Success,
                OutcomeKind::ExecutionError,
                OutcomeKind::Success
            ]
        );
        assert_eq!(report.results[1].result, "error:panic");
        assert_eq!(report.results[1].narrative, "B could not be carried out");
        assert_eq!(agent.log, ["A", "C"]);

        let failures = memory.find("directives.invocation.failed");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].metadata["stage"], "admission");
        assert_eq!(failures[0].metadata["error"], "predicate bug");
    }

    #[test]
    fn quota_applies_within_and_across_batches() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();

        let report = dispatcher.dispatch_at(
            "[ACTION:CHEER:50] [ACTION:CHEER:5]",
            &mut agent,
            &mut ledger,
            100,
        );
        assert_eq!(
            outcomes(&report),
            [OutcomeKind::Success, OutcomeKind::PreconditionFailed]
        );
        // clamped to the default magnitude limit
        assert_eq!(agent.mood, 20);
        assert!(report.results[1].result.starts_with("quota: cooldown"));

        let state = ledger.state("CHEER", "pawn").unwrap();
        assert_eq!(state.count_today, 1);
        assert_eq!(state.positive_magnitude_today, 20);

        let later = dispatcher.dispatch_at("[ACTION:CHEER:-5]", &mut agent, &mut ledger, 104);
        assert!(later.results[0].is_success());
        assert_eq!(agent.mood, 15);
    }

    #[test]
    fn sweeps_opportunistically() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        dispatcher.dispatch_at("[ACTION:CHEER:1]", &mut agent, &mut ledger, 1);
        assert_eq!(ledger.len(), 1);
        dispatcher.dispatch_at("[ACTION:A]", &mut agent, &mut ledger, 200);
        assert!(ledger.is_empty());
        assert_eq!(ledger.last_sweep(), 200);
        let swept = memory.find("directives.quota.swept");
        assert_eq!(swept.last().unwrap().metadata["removed"], 1);
    }

    #[test]
    fn shared_ledger_dispatch_records_quota() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let shared = SharedQuotaLedger::new(dispatcher.new_ledger());
        let report = dispatcher.dispatch_shared("[ACTION:CHEER:3]", &mut agent, &shared);
        assert!(report.results[0].is_success());
        assert_eq!(shared.snapshot().entries.len(), 1);
    }

    #[test]
    fn disabled_directive_is_denied_and_hidden() {
        let config = EngineConfig::from_toml_str("disabled = [\"a\"]").unwrap();
        let dispatcher = Dispatcher::builder()
            .register(Recorder::handle("A", DirectiveCategory::Special))
            .register(Recorder::handle("B", DirectiveCategory::Special))
            .config(config)
            .build();
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = dispatcher.dispatch("[ACTION:A]", &mut agent, &mut ledger);
        assert_eq!(report.results[0].result, "disabled");
        let advertisement = dispatcher.advertise(&agent, &ledger);
        assert_eq!(advertisement.score_of("A"), None);
        assert_eq!(advertisement.score_of("B"), Some(0));
    }

    #[test]
    fn replaced_registration_is_logged() {
        let memory = Arc::new(MemoryLogger::default());
        let telemetry = DirectiveTelemetry::builder("directives")
            .sink(memory.clone())
            .build()
            .unwrap();
        let dispatcher = Dispatcher::<TestAgent>::builder()
            .register(Recorder::handle("A", DirectiveCategory::Special))
            .register(Recorder::handle("a", DirectiveCategory::Mood))
            .telemetry(telemetry)
            .build();
        assert_eq!(dispatcher.catalog().len(), 1);
        assert_eq!(memory.find("directives.catalog.replaced").len(), 1);
    }

    #[test]
    fn report_can_outlive_source_text() {
        let memory = Arc::new(MemoryLogger::default());
        let dispatcher = dispatcher(&memory);
        let mut agent = TestAgent::named("pawn");
        let mut ledger = dispatcher.new_ledger();
        let report = {
            let text = String::from("Done [ACTION:A]");
            dispatcher
                .dispatch(&text, &mut agent, &mut ledger)
                .into_owned()
        };
        assert_eq!(report.cleaned_text(), "Done");
    }
}

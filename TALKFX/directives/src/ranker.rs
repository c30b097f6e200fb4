use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::{
    catalog::{AgentHandle, DirectiveCatalog},
    directive::{DirectiveCategory, DirectiveDefinition},
    gate::Gate,
};

/// Additive scoring heuristic. Rules are independent; a directive's score is the sum.
pub trait RelevanceRule<A>: Send + Sync {
    /// Rule name for diagnostics.
    fn name(&self) -> &str;

    /// Bonus for advertising `definition` to `agent`; zero when the rule does not apply.
    fn score(&self, agent: &A, definition: &DirectiveDefinition) -> i32;
}

/// Rule backed by a plain function.
pub struct FnRule<A> {
    name: &'static str,
    score: fn(&A, &DirectiveDefinition) -> i32,
}

impl<A> FnRule<A> {
    /// Wraps `score` under `name`.
    #[must_use]
    pub const fn new(name: &'static str, score: fn(&A, &DirectiveDefinition) -> i32) -> Self {
        Self { name, score }
    }
}

impl<A> RelevanceRule<A> for FnRule<A> {
    fn name(&self) -> &str {
        self.name
    }

    fn score(&self, agent: &A, definition: &DirectiveDefinition) -> i32 {
        (self.score)(agent, definition)
    }
}

/// One advertised directive.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdvertisedDirective {
    /// Canonical identifier.
    pub id: String,
    /// Advertised description.
    pub description: String,
    /// Token template.
    pub usage: String,
    /// Relevance score.
    pub score: i32,
}

/// Ranked directives of one category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AdvertisedCategory {
    /// Category.
    pub category: DirectiveCategory,
    /// Kept entries, best first.
    pub entries: Vec<AdvertisedDirective>,
    /// Eligible directives cut by the per-category limit.
    pub omitted: usize,
}

/// Ranked advertisement grouped by category in declaration order. Empty categories are left out.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Advertisement {
    /// Non-empty categories.
    pub categories: Vec<AdvertisedCategory>,
}

impl Advertisement {
    /// Number of advertised directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.iter().map(|group| group.entries.len()).sum()
    }

    /// Whether nothing is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Entries of `category`, if any are advertised.
    #[must_use]
    pub fn category(&self, category: DirectiveCategory) -> Option<&AdvertisedCategory> {
        self.categories.iter().find(|group| group.category == category)
    }

    /// Score of an advertised directive.
    #[must_use]
    pub fn score_of(&self, id: &str) -> Option<i32> {
        self.categories
            .iter()
            .flat_map(|group| &group.entries)
            .find(|entry| entry.id.eq_ignore_ascii_case(id))
            .map(|entry| entry.score)
    }
}

impl fmt::Display for Advertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Available actions (append [ACTION:ID:param:...] to your reply to use one):"
        )?;
        for group in &self.categories {
            writeln!(f, "{}:", group.category)?;
            for entry in &group.entries {
                writeln!(f, "- {}: {} {}", entry.id, entry.description, entry.usage)?;
            }
            if group.omitted > 0 {
                writeln!(f, "\u{2026}and {} more available.", group.omitted)?;
            }
        }
        Ok(())
    }
}

/// Scores eligible directives and keeps the best per category.
pub struct Ranker<A> {
    rules: Vec<Arc<dyn RelevanceRule<A>>>,
    per_category_limit: usize,
}

impl<A> Clone for Ranker<A> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            per_category_limit: self.per_category_limit,
        }
    }
}

impl<A> fmt::Debug for Ranker<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranker")
            .field(
                "rules",
                &self.rules.iter().map(|rule| rule.name()).collect::<Vec<_>>(),
            )
            .field("per_category_limit", &self.per_category_limit)
            .finish()
    }
}

impl<A: AgentHandle> Ranker<A> {
    /// Creates a ranker without rules; every eligible directive scores zero.
    #[must_use]
    pub fn new(per_category_limit: usize) -> Self {
        Self {
            rules: Vec::new(),
            per_category_limit: per_category_limit.max(1),
        }
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule(mut self, rule: Arc<dyn RelevanceRule<A>>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Per-category limit.
    #[must_use]
    pub const fn per_category_limit(&self) -> usize {
        self.per_category_limit
    }

    /// Sum of every rule's bonus.
    #[must_use]
    pub fn score(&self, agent: &A, definition: &DirectiveDefinition) -> i32 {
        self.rules
            .iter()
            .map(|rule| rule.score(agent, definition))
            .fold(0_i32, i32::saturating_add)
    }

    /// Builds the advertisement for `agent`.
    #[must_use]
    pub fn rank(&self, catalog: &DirectiveCatalog<A>, agent: &A, gate: &Gate<'_>) -> Advertisement {
        let mut categories = Vec::new();
        for category in DirectiveCategory::ALL {
            let mut scored: Vec<AdvertisedDirective> = catalog
                .all_by_category(category)
                .into_iter()
                .filter(|&handler| gate.is_available(&**handler, agent))
                .map(|handler| {
                    let definition = handler.definition();
                    AdvertisedDirective {
                        id: definition.id.clone(),
                        description: definition.description.clone(),
                        usage: definition.usage(),
                        score: self.score(agent, definition),
                    }
                })
                .collect();
            if scored.is_empty() {
                continue;
            }
            // stable: equal scores keep registration order
            scored.sort_by(|a, b| b.score.cmp(&a.score));
            let omitted = scored.len().saturating_sub(self.per_category_limit);
            scored.truncate(self.per_category_limit);
            categories.push(AdvertisedCategory {
                category,
                entries: scored,
                omitted,
            });
        }
        Advertisement { categories }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::tests::{Recorder, TestAgent},
        config::EngineConfig,
        quota::QuotaLedger,
    };

    fn catalog() -> DirectiveCatalog<TestAgent> {
        let mut catalog = DirectiveCatalog::new();
        for id in ["A", "B", "C", "D"] {
            catalog.register(Recorder::handle(id, DirectiveCategory::Mood));
        }
        catalog.register(Recorder::handle("HEAL", DirectiveCategory::Health));
        catalog
    }

    fn favour_c(_: &TestAgent, definition: &DirectiveDefinition) -> i32 {
        if definition.id == "C" {
            10
        } else {
            0
        }
    }

    #[test]
    fn ranking_is_deterministic_and_stable() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let ledger = QuotaLedger::new(24);
        let gate = Gate::new(&config, &ledger, 0);
        let agent = TestAgent::named("pawn");
        let ranker = Ranker::new(3).rule(Arc::new(FnRule::new("favour_c", favour_c)));

        let first = ranker.rank(&catalog, &agent, &gate);
        let second = ranker.rank(&catalog, &agent, &gate);
        assert_eq!(first, second);

        // categories in declaration order
        let order: Vec<_> = first.categories.iter().map(|g| g.category).collect();
        assert_eq!(order, [DirectiveCategory::Health, DirectiveCategory::Mood]);

        let mood = first.category(DirectiveCategory::Mood).unwrap();
        let ids: Vec<_> = mood.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["C", "A", "B"]);
        assert_eq!(mood.omitted, 1);
        assert_eq!(first.score_of("c"), Some(10));
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn unavailable_directives_are_not_advertised() {
        let catalog = catalog();
        let config = EngineConfig::from_toml_str("disabled = [\"HEAL\"]").unwrap();
        let ledger = QuotaLedger::new(24);
        let gate = Gate::new(&config, &ledger, 0);
        let mut agent = TestAgent::named("pawn");
        let ranker = Ranker::new(8);
        assert!(ranker
            .rank(&catalog, &agent, &gate)
            .category(DirectiveCategory::Health)
            .is_none());

        agent.alive = false;
        assert!(ranker.rank(&catalog, &agent, &gate).is_empty());
    }

    #[test]
    fn renders_prompt_block_with_overflow() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let ledger = QuotaLedger::new(24);
        let gate = Gate::new(&config, &ledger, 0);
        let rendered = Ranker::new(2)
            .rank(&catalog, &TestAgent::named("pawn"), &gate)
            .to_string();
        assert!(rendered.contains("Health:\n- HEAL: records HEAL [ACTION:HEAL:mode?]"));
        assert!(rendered.contains("\u{2026}and 2 more available."));
    }
}

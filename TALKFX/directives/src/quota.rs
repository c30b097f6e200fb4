use std::{collections::HashMap, fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::Tick;

/// Per-directive rate limits. Each guard is independent and optional.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuotaPolicy {
    /// Minimum ticks between two granted invocations.
    pub cooldown: Option<Tick>,
    /// Maximum granted invocations per day window.
    pub daily_cap: Option<u32>,
    /// Maximum positive magnitude accumulated per day window.
    pub magnitude_cap: Option<i32>,
}

impl QuotaPolicy {
    /// Policy with every guard disabled.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            cooldown: None,
            daily_cap: None,
            magnitude_cap: None,
        }
    }

    /// Sets the cooldown window.
    #[must_use]
    pub const fn with_cooldown(mut self, ticks: Tick) -> Self {
        self.cooldown = Some(ticks);
        self
    }

    /// Sets the daily cap.
    #[must_use]
    pub const fn with_daily_cap(mut self, cap: u32) -> Self {
        self.daily_cap = Some(cap);
        self
    }

    /// Sets the cumulative magnitude cap.
    #[must_use]
    pub const fn with_magnitude_cap(mut self, cap: i32) -> Self {
        self.magnitude_cap = Some(cap);
        self
    }

    /// Replaces the guards that `overrides` sets.
    #[must_use]
    pub const fn merged(mut self, overrides: &Self) -> Self {
        if overrides.cooldown.is_some() {
            self.cooldown = overrides.cooldown;
        }
        if overrides.daily_cap.is_some() {
            self.daily_cap = overrides.daily_cap;
        }
        if overrides.magnitude_cap.is_some() {
            self.magnitude_cap = overrides.magnitude_cap;
        }
        self
    }

    /// Whether any guard is active.
    #[must_use]
    pub const fn is_limited(&self) -> bool {
        self.cooldown.is_some() || self.daily_cap.is_some() || self.magnitude_cap.is_some()
    }
}

/// Reason a quota check refused an invocation. The entry is left untouched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotaDenial {
    /// Cooldown window not elapsed.
    #[error("cooldown: {remaining} tick(s) remaining")]
    Cooldown {
        /// Ticks until the window closes.
        remaining: Tick,
    },
    /// Daily count exhausted.
    #[error("daily cap of {cap} reached")]
    DailyCap {
        /// Configured cap.
        cap: u32,
    },
    /// Positive magnitude budget exhausted.
    #[error("magnitude cap: {accumulated} + {requested} exceeds {cap}")]
    MagnitudeCap {
        /// Configured cap.
        cap: i32,
        /// Positive magnitude already applied today.
        accumulated: i32,
        /// Magnitude of the refused invocation.
        requested: i32,
    },
}

/// Tracking state of one (directive, agent) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    /// Tick of the last granted invocation.
    pub last_invoked: Tick,
    /// Day window the counters below belong to.
    pub day: u64,
    /// Granted invocations in `day`.
    pub count_today: u32,
    /// Sum of positive magnitudes applied in `day`; the capped quantity.
    pub positive_magnitude_today: i32,
    /// Signed sum of all magnitudes applied in `day`.
    pub net_magnitude_today: i32,
    /// Ticks after `last_invoked` during which the entry survives a sweep.
    pub retain_for: Tick,
}

impl QuotaState {
    fn counters_for(&self, day: u64) -> (u32, i32) {
        if self.day == day {
            (self.count_today, self.positive_magnitude_today)
        } else {
            (0, 0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct QuotaKey {
    directive: String,
    agent: String,
}

impl QuotaKey {
    fn new(directive: &str, agent: &str) -> Self {
        Self {
            directive: directive.to_string(),
            agent: agent.to_string(),
        }
    }
}

/// Serializable image of a ledger, handed to the host's persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaSnapshot {
    /// Day window length the counters were recorded with.
    pub day_length: Tick,
    /// Tick of the last sweep.
    pub last_sweep: Tick,
    /// One record per tracked pair.
    pub entries: Vec<QuotaRecord>,
}

/// Entry of a [`QuotaSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaRecord {
    /// Directive identifier.
    pub directive: String,
    /// Agent identifier.
    pub agent: String,
    /// Tracked state.
    pub state: QuotaState,
}

/// Cooldown, daily-cap and magnitude-cap tracker keyed by (directive id, agent id).
///
/// Entries are created lazily on the first granted invocation and removed only by
/// [`QuotaLedger::sweep`].
#[derive(Debug, Clone)]
pub struct QuotaLedger {
    day_length: Tick,
    last_sweep: Tick,
    entries: HashMap<QuotaKey, QuotaState>,
}

impl QuotaLedger {
    /// Creates an empty ledger with the given day window (at least one tick).
    #[must_use]
    pub fn new(day_length: Tick) -> Self {
        Self {
            day_length: day_length.max(1),
            last_sweep: 0,
            entries: HashMap::new(),
        }
    }

    /// Day window length.
    #[must_use]
    pub const fn day_length(&self) -> Tick {
        self.day_length
    }

    /// Index of the day window containing `tick`.
    #[must_use]
    pub const fn day_of(&self, tick: Tick) -> u64 {
        tick / self.day_length
    }

    /// Number of tracked pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State tracked for a pair, if any.
    #[must_use]
    pub fn state(&self, directive: &str, agent: &str) -> Option<&QuotaState> {
        self.entries.get(&QuotaKey::new(directive, agent))
    }

    /// Evaluates the three guards without mutating anything.
    pub fn check(
        &self,
        policy: &QuotaPolicy,
        directive: &str,
        agent: &str,
        now: Tick,
        magnitude: Option<i32>,
    ) -> Result<(), QuotaDenial> {
        let Some(state) = self.state(directive, agent) else {
            return Self::check_fresh(policy, magnitude);
        };

        if let Some(cooldown) = policy.cooldown {
            let elapsed = now.saturating_sub(state.last_invoked);
            if elapsed < cooldown {
                return Err(QuotaDenial::Cooldown {
                    remaining: cooldown - elapsed,
                });
            }
        }

        let (count, accumulated) = state.counters_for(self.day_of(now));
        if let Some(cap) = policy.daily_cap {
            if count >= cap {
                return Err(QuotaDenial::DailyCap { cap });
            }
        }
        Self::check_magnitude(policy, accumulated, magnitude)
    }

    fn check_fresh(policy: &QuotaPolicy, magnitude: Option<i32>) -> Result<(), QuotaDenial> {
        if policy.daily_cap == Some(0) {
            return Err(QuotaDenial::DailyCap { cap: 0 });
        }
        Self::check_magnitude(policy, 0, magnitude)
    }

    fn check_magnitude(
        policy: &QuotaPolicy,
        accumulated: i32,
        magnitude: Option<i32>,
    ) -> Result<(), QuotaDenial> {
        match (policy.magnitude_cap, magnitude) {
            (Some(cap), Some(requested))
                if requested > 0 && accumulated.saturating_add(requested) > cap =>
            {
                Err(QuotaDenial::MagnitudeCap {
                    cap,
                    accumulated,
                    requested,
                })
            }
            _ => Ok(()),
        }
    }

    /// Records a granted invocation.
    pub fn record(
        &mut self,
        policy: &QuotaPolicy,
        directive: &str,
        agent: &str,
        now: Tick,
        magnitude: Option<i32>,
    ) {
        let day = self.day_of(now);
        let retain_for = self.retention(policy);
        let state = self
            .entries
            .entry(QuotaKey::new(directive, agent))
            .or_insert(QuotaState {
                last_invoked: now,
                day,
                count_today: 0,
                positive_magnitude_today: 0,
                net_magnitude_today: 0,
                retain_for,
            });
        if state.day != day {
            state.day = day;
            state.count_today = 0;
            state.positive_magnitude_today = 0;
            state.net_magnitude_today = 0;
        }
        state.last_invoked = now;
        state.retain_for = retain_for;
        state.count_today = state.count_today.saturating_add(1);
        if let Some(value) = magnitude {
            if value > 0 {
                state.positive_magnitude_today = state.positive_magnitude_today.saturating_add(value);
            }
            state.net_magnitude_today = state.net_magnitude_today.saturating_add(value);
        }
    }

    /// Checks and, when granted, records in one step.
    pub fn try_acquire(
        &mut self,
        policy: &QuotaPolicy,
        directive: &str,
        agent: &str,
        now: Tick,
        magnitude: Option<i32>,
    ) -> Result<(), QuotaDenial> {
        self.check(policy, directive, agent, now, magnitude)?;
        self.record(policy, directive, agent, now, magnitude);
        Ok(())
    }

    // Twice the cooldown; without a cooldown, twice the day window.
    const fn retention(&self, policy: &QuotaPolicy) -> Tick {
        match policy.cooldown {
            Some(cooldown) if cooldown > 0 => cooldown.saturating_mul(2),
            _ => self.day_length.saturating_mul(2),
        }
    }

    /// Drops entries idle for longer than their retention window. Entries whose day window is
    /// still current are kept so that daily counters survive short cooldowns.
    /// Returns the number of removed entries.
    pub fn sweep(&mut self, now: Tick) -> usize {
        let today = self.day_of(now);
        let before = self.entries.len();
        self.entries.retain(|_, state| {
            now.saturating_sub(state.last_invoked) <= state.retain_for || state.day == today
        });
        self.last_sweep = now;
        before - self.entries.len()
    }

    /// Tick of the last sweep.
    #[must_use]
    pub const fn last_sweep(&self) -> Tick {
        self.last_sweep
    }

    /// Forgets every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.last_sweep = 0;
    }

    /// Exports the ledger for persistence. Records are sorted for stable output.
    #[must_use]
    pub fn snapshot(&self) -> QuotaSnapshot {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(key, state)| QuotaRecord {
                directive: key.directive.clone(),
                agent: key.agent.clone(),
                state: *state,
            })
            .collect();
        entries.sort_by(|a, b| (&a.directive, &a.agent).cmp(&(&b.directive, &b.agent)));
        QuotaSnapshot {
            day_length: self.day_length,
            last_sweep: self.last_sweep,
            entries,
        }
    }

    /// Rebuilds a ledger from a snapshot.
    #[must_use]
    pub fn restore(snapshot: QuotaSnapshot) -> Self {
        let mut ledger = Self::new(snapshot.day_length);
        ledger.last_sweep = snapshot.last_sweep;
        ledger.entries = snapshot
            .entries
            .into_iter()
            .map(|record| (QuotaKey::new(&record.directive, &record.agent), record.state))
            .collect();
        ledger
    }

    /// Writes the snapshot as pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&self.snapshot())?;
        fs::write(path, body).with_context(|| format!("writing quota state {}", path.display()))
    }

    /// Loads a ledger saved by [`QuotaLedger::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading quota state {}", path.display()))?;
        let snapshot: QuotaSnapshot =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Self::restore(snapshot))
    }
}

/// Lock-guarded ledger handle for hosts that dispatch from several threads.
#[derive(Debug, Clone)]
pub struct SharedQuotaLedger {
    inner: Arc<Mutex<QuotaLedger>>,
}

impl SharedQuotaLedger {
    /// Wraps a ledger.
    #[must_use]
    pub fn new(ledger: QuotaLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Locks the ledger for a read-modify-write sequence.
    pub fn lock(&self) -> MutexGuard<'_, QuotaLedger> {
        self.inner.lock()
    }

    /// Exports a snapshot under the lock.
    #[must_use]
    pub fn snapshot(&self) -> QuotaSnapshot {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Tick = 24;

    fn mood_policy() -> QuotaPolicy {
        QuotaPolicy::unlimited()
            .with_cooldown(3)
            .with_daily_cap(3)
            .with_magnitude_cap(30)
    }

    #[test]
    fn cooldown_denies_inside_window_and_allows_after() {
        let policy = QuotaPolicy::unlimited().with_cooldown(4);
        let mut ledger = QuotaLedger::new(DAY);
        assert!(ledger.try_acquire(&policy, "ADD_THOUGHT", "pawn-1", 100, None).is_ok());
        assert_eq!(
            ledger.check(&policy, "ADD_THOUGHT", "pawn-1", 102, None),
            Err(QuotaDenial::Cooldown { remaining: 2 })
        );
        assert!(ledger.check(&policy, "ADD_THOUGHT", "pawn-1", 105, None).is_ok());
        // other agents are tracked separately
        assert!(ledger.check(&policy, "ADD_THOUGHT", "pawn-2", 101, None).is_ok());
    }

    #[test]
    fn daily_cap_allows_exactly_k() {
        let policy = QuotaPolicy::unlimited().with_cooldown(1).with_daily_cap(3);
        let mut ledger = QuotaLedger::new(DAY);
        for tick in [0, 2, 4] {
            assert!(ledger.try_acquire(&policy, "INSPIRE", "a", tick, None).is_ok());
        }
        assert_eq!(
            ledger.try_acquire(&policy, "INSPIRE", "a", 10, None),
            Err(QuotaDenial::DailyCap { cap: 3 })
        );
        assert_eq!(ledger.state("INSPIRE", "a").unwrap().count_today, 3);
        // the next day window starts fresh
        assert!(ledger.try_acquire(&policy, "INSPIRE", "a", DAY, None).is_ok());
        assert_eq!(ledger.state("INSPIRE", "a").unwrap().count_today, 1);
    }

    #[test]
    fn magnitude_cap_only_limits_positive_values() {
        let policy = QuotaPolicy::unlimited().with_magnitude_cap(30);
        let mut ledger = QuotaLedger::new(DAY);
        assert!(ledger.try_acquire(&policy, "ADD_THOUGHT", "a", 1, Some(20)).is_ok());
        assert_eq!(
            ledger.check(&policy, "ADD_THOUGHT", "a", 2, Some(15)),
            Err(QuotaDenial::MagnitudeCap {
                cap: 30,
                accumulated: 20,
                requested: 15
            })
        );
        assert!(ledger.try_acquire(&policy, "ADD_THOUGHT", "a", 2, Some(10)).is_ok());
        for tick in 3..40 {
            assert!(ledger.try_acquire(&policy, "ADD_THOUGHT", "a", tick, Some(-20)).is_ok());
        }
    }

    #[test]
    fn negative_magnitudes_do_not_free_positive_budget() {
        let policy = QuotaPolicy::unlimited().with_magnitude_cap(10);
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&policy, "X", "a", 0, Some(10));
        ledger.record(&policy, "X", "a", 1, Some(-10));
        let state = ledger.state("X", "a").unwrap();
        assert_eq!(state.positive_magnitude_today, 10);
        assert_eq!(state.net_magnitude_today, 0);
        assert!(ledger.check(&policy, "X", "a", 2, Some(1)).is_err());
    }

    #[test]
    fn denial_leaves_entry_unchanged() {
        let policy = mood_policy();
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&policy, "ADD_THOUGHT", "a", 5, Some(8));
        let before = *ledger.state("ADD_THOUGHT", "a").unwrap();
        assert!(ledger.try_acquire(&policy, "ADD_THOUGHT", "a", 6, Some(8)).is_err());
        assert_eq!(*ledger.state("ADD_THOUGHT", "a").unwrap(), before);
    }

    #[test]
    fn sweep_removes_stale_entries_only() {
        let policy = QuotaPolicy::unlimited().with_cooldown(3);
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&policy, "A", "x", 0, None);
        ledger.record(&policy, "B", "x", 27, None);
        // A is 30 ticks old, past 2 * cooldown and in an earlier day window
        assert_eq!(ledger.sweep(30), 1);
        assert!(ledger.state("A", "x").is_none());
        assert!(ledger.state("B", "x").is_some());
        assert_eq!(ledger.last_sweep(), 30);
    }

    #[test]
    fn sweep_keeps_current_day_counters() {
        let policy = QuotaPolicy::unlimited().with_cooldown(1).with_daily_cap(2);
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&policy, "A", "x", 0, None);
        ledger.record(&policy, "A", "x", 1, None);
        assert_eq!(ledger.sweep(20), 0);
        assert!(ledger.check(&policy, "A", "x", 21, None).is_err());
    }

    #[test]
    fn reset_forgets_everything() {
        let policy = QuotaPolicy::unlimited().with_cooldown(5).with_daily_cap(1);
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&policy, "A", "x", 10, None);
        assert_eq!(ledger.sweep(10), 0);
        assert!(ledger.check(&policy, "A", "x", 11, None).is_err());

        ledger.reset();
        assert!(ledger.is_empty());
        assert_eq!(ledger.last_sweep(), 0);
        assert!(ledger.check(&policy, "A", "x", 11, None).is_ok());
    }

    #[test]
    fn snapshot_round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quota.json");
        let mut ledger = QuotaLedger::new(DAY);
        ledger.record(&mood_policy(), "ADD_THOUGHT", "a", 7, Some(8));
        ledger.save_json(&path).unwrap();
        let restored = QuotaLedger::load_json(&path).unwrap();
        assert_eq!(restored.snapshot(), ledger.snapshot());
        assert!(restored
            .check(&mood_policy(), "ADD_THOUGHT", "a", 8, Some(1))
            .is_err());
    }

    #[test]
    fn zero_daily_cap_blocks_first_use() {
        let policy = QuotaPolicy::unlimited().with_daily_cap(0);
        let ledger = QuotaLedger::new(DAY);
        assert_eq!(
            ledger.check(&policy, "A", "x", 0, None),
            Err(QuotaDenial::DailyCap { cap: 0 })
        );
    }

    #[test]
    fn merged_overrides_only_set_guards() {
        let base = mood_policy();
        let overrides = QuotaPolicy {
            daily_cap: Some(5),
            ..QuotaPolicy::unlimited()
        };
        let merged = base.merged(&overrides);
        assert_eq!(merged.cooldown, Some(3));
        assert_eq!(merged.daily_cap, Some(5));
        assert_eq!(merged.magnitude_cap, Some(30));
    }
}

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::{clock::Tick, directive::normalize_id, quota::QuotaPolicy, sanitize::DurationTiers};

/// Engine settings, usually loaded from a TOML document.
///
/// ```toml
/// disabled = ["GO_TO"]
///
/// [ranking]
/// per_category_limit = 5
///
/// [time]
/// day_length = 24
///
/// [quota.ADD_THOUGHT]
/// cooldown = 6
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Advertisement settings.
    #[serde(default)]
    pub ranking: RankingSettings,
    /// Day window and sweep cadence.
    #[serde(default)]
    pub time: TimeSettings,
    /// Text cleanup, magnitude clamping and duration tiers.
    #[serde(default)]
    pub sanitize: SanitizeSettings,
    /// Directive identifiers whose gate always fails.
    #[serde(default)]
    pub disabled: IndexSet<String>,
    /// Per-directive quota overrides; only the guards that are set replace the built-in ones.
    #[serde(default)]
    pub quota: IndexMap<String, QuotaPolicy>,
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    fn normalize(&mut self) {
        self.disabled = self.disabled.iter().map(|id| normalize_id(id)).collect();
        self.quota = self
            .quota
            .drain(..)
            .map(|(id, policy)| (normalize_id(&id), policy))
            .collect();
    }

    fn validate(&self) -> Result<()> {
        if self.ranking.per_category_limit == 0 {
            bail!("ranking.per_category_limit must be at least 1");
        }
        if self.time.day_length == 0 {
            bail!("time.day_length must be at least 1 tick");
        }
        if self.sanitize.max_text_len < 4 {
            bail!("sanitize.max_text_len must leave room for an ellipsis");
        }
        if self.sanitize.magnitude_limit <= 0 {
            bail!("sanitize.magnitude_limit must be positive");
        }
        let tiers = &self.sanitize.duration_tiers;
        if tiers.medium_at > tiers.long_at {
            bail!("invalid duration tiers: medium_at > long_at");
        }
        Ok(())
    }

    /// Whether `id` is switched off.
    #[must_use]
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.contains(&normalize_id(id))
    }

    /// Effective quota for `id`, combining the directive's own policy with any override.
    #[must_use]
    pub fn quota_for(&self, id: &str, builtin: Option<QuotaPolicy>) -> Option<QuotaPolicy> {
        match (builtin, self.quota.get(&normalize_id(id))) {
            (Some(policy), Some(overrides)) => Some(policy.merged(overrides)),
            (None, Some(overrides)) => Some(QuotaPolicy::unlimited().merged(overrides)),
            (policy, None) => policy,
        }
        .filter(QuotaPolicy::is_limited)
    }
}

/// Advertisement settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RankingSettings {
    /// Directives kept per category.
    #[serde(default = "default_per_category_limit")]
    pub per_category_limit: usize,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            per_category_limit: default_per_category_limit(),
        }
    }
}

/// Day window and sweep cadence, in ticks.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSettings {
    /// Length of the daily-cap window.
    #[serde(default = "default_day_length")]
    pub day_length: Tick,
    /// Minimum ticks between two opportunistic quota sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Tick,
}

impl Default for TimeSettings {
    fn default() -> Self {
        Self {
            day_length: default_day_length(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Text and magnitude settings handed to directives.
#[derive(Debug, Clone, Deserialize)]
pub struct SanitizeSettings {
    /// Maximum characters of sanitized free text, ellipsis included.
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
    /// Magnitudes are clamped into `[-limit, limit]` before cap math.
    #[serde(default = "default_magnitude_limit")]
    pub magnitude_limit: i32,
    /// |magnitude| to duration mapping.
    #[serde(default)]
    pub duration_tiers: DurationTiers,
}

impl Default for SanitizeSettings {
    fn default() -> Self {
        Self {
            max_text_len: default_max_text_len(),
            magnitude_limit: default_magnitude_limit(),
            duration_tiers: DurationTiers::default(),
        }
    }
}

const fn default_per_category_limit() -> usize {
    8
}

const fn default_day_length() -> Tick {
    24
}

const fn default_sweep_interval() -> Tick {
    24
}

const fn default_max_text_len() -> usize {
    80
}

const fn default_magnitude_limit() -> i32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.ranking.per_category_limit, 8);
        assert_eq!(config.time.day_length, 24);
        assert_eq!(config.sanitize.max_text_len, 80);
        assert_eq!(config.sanitize.magnitude_limit, 20);
        assert_eq!(config.sanitize.duration_tiers, DurationTiers::default());
        assert!(config.disabled.is_empty());
    }

    #[test]
    fn normalizes_ids_and_merges_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            disabled = ["go_to"]

            [quota.add_thought]
            cooldown = 6

            [quota.GO_TO]
            daily_cap = 2
            "#,
        )
        .unwrap();
        assert!(config.is_disabled("GO_TO"));
        assert!(config.is_disabled("Go_To"));

        let builtin = QuotaPolicy::unlimited().with_cooldown(3).with_daily_cap(3);
        let merged = config.quota_for("ADD_THOUGHT", Some(builtin)).unwrap();
        assert_eq!(merged.cooldown, Some(6));
        assert_eq!(merged.daily_cap, Some(3));

        let added = config.quota_for("go_to", None).unwrap();
        assert_eq!(added.daily_cap, Some(2));
        assert_eq!(added.cooldown, None);

        assert_eq!(config.quota_for("HEAL", None), None);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(EngineConfig::from_toml_str("[ranking]\nper_category_limit = 0").is_err());
        assert!(EngineConfig::from_toml_str("[time]\nday_length = 0").is_err());
        assert!(EngineConfig::from_toml_str("[sanitize]\nmax_text_len = 2").is_err());
        assert!(EngineConfig::from_toml_str(
            "[sanitize.duration_tiers]\nlong_at = 5\nmedium_at = 10"
        )
        .is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[sanitize]\nmagnitude_limit = 15").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.sanitize.magnitude_limit, 15);
    }
}

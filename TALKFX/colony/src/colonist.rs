use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use talkfx_directives::{AgentHandle, Tick};

/// Mood below which mood directives become more relevant.
pub const LOW_MOOD: i32 = 30;
/// Need level below which a need counts as unmet.
pub const LOW_NEED: i32 = 30;
/// Experience required per skill level.
pub const XP_PER_LEVEL: u32 = 1000;
/// Highest skill level.
pub const MAX_SKILL_LEVEL: u8 = 20;
/// Highest work priority; zero disables the work type.
pub const MAX_WORK_PRIORITY: u8 = 4;
/// Traits a colonist can carry at once.
pub const MAX_TRAITS: usize = 3;

/// Damage to one body part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Injury {
    /// Body part, e.g. `left leg`.
    pub part: String,
    /// Injury kind, e.g. `cut` or `burn`.
    pub kind: String,
    /// 1 (scratch) to 100 (destroyed).
    pub severity: u8,
}

/// Timed mood modifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thought {
    /// Short description, e.g. `praised`.
    pub label: String,
    /// Signed mood offset.
    pub mood_offset: i32,
    /// Tick at which the thought fades.
    pub expires_at: Tick,
}

/// Skill level and progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Skill {
    /// 0 to [`MAX_SKILL_LEVEL`].
    pub level: u8,
    /// Progress towards the next level.
    pub xp: u32,
}

/// Prisoner state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Captivity {
    /// 0 (broken) to 100.
    pub resistance: i32,
    /// Whether the prisoner can join at all.
    pub recruitable: bool,
}

/// Active inspiration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Inspiration {
    /// Inspiration kind, e.g. `creativity`.
    pub kind: String,
    /// Tick at which it fades.
    pub expires_at: Tick,
}

/// Reference agent: one colonist of a simulated settlement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Colonist {
    /// Stable identifier.
    pub id: String,
    /// Display name used in narratives.
    pub name: String,
    /// Whether the colonist is alive.
    #[serde(default = "default_alive")]
    pub alive: bool,
    /// Whether the colonist is incapacitated.
    #[serde(default)]
    pub downed: bool,
    /// Current injuries.
    #[serde(default)]
    pub injuries: Vec<Injury>,
    /// Body parts that are gone.
    #[serde(default)]
    pub missing_parts: Vec<String>,
    /// Mood before thoughts, 0 to 100.
    #[serde(default = "default_base_mood")]
    pub base_mood: i32,
    /// Active thoughts.
    #[serde(default)]
    pub thoughts: Vec<Thought>,
    /// Opinion of others by id, -100 to 100.
    #[serde(default)]
    pub opinions: BTreeMap<String, i32>,
    /// Skills by lower-case name.
    #[serde(default)]
    pub skills: BTreeMap<String, Skill>,
    /// Present while the colonist is held prisoner.
    #[serde(default)]
    pub captivity: Option<Captivity>,
    /// Work priorities by lower-case work type.
    #[serde(default)]
    pub work_priorities: BTreeMap<String, u8>,
    /// Need levels by lower-case name, 0 (starving) to 100 (satisfied).
    #[serde(default)]
    pub needs: BTreeMap<String, i32>,
    /// Personality traits.
    #[serde(default)]
    pub traits: Vec<String>,
    /// Carried items and counts.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    /// Current location.
    #[serde(default)]
    pub location: Option<String>,
    /// Active inspiration.
    #[serde(default)]
    pub inspiration: Option<Inspiration>,
}

const fn default_alive() -> bool {
    true
}

const fn default_base_mood() -> i32 {
    50
}

impl Colonist {
    /// Healthy, free colonist with neutral mood.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            alive: true,
            downed: false,
            injuries: Vec::new(),
            missing_parts: Vec::new(),
            base_mood: default_base_mood(),
            thoughts: Vec::new(),
            opinions: BTreeMap::new(),
            skills: BTreeMap::new(),
            captivity: None,
            work_priorities: BTreeMap::new(),
            needs: BTreeMap::new(),
            traits: Vec::new(),
            inventory: BTreeMap::new(),
            location: None,
            inspiration: None,
        }
    }

    /// Loads a colonist from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading colonist {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Writes the colonist as pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let body = serde_json::to_string_pretty(self)?;
        fs::write(path, body).with_context(|| format!("writing colonist {}", path.display()))
    }

    /// Whether the colonist can act and be acted upon.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.alive && !self.downed
    }

    /// Whether the colonist is held prisoner.
    #[must_use]
    pub const fn is_captive(&self) -> bool {
        self.captivity.is_some()
    }

    /// Whether any injury is present.
    #[must_use]
    pub fn is_injured(&self) -> bool {
        !self.injuries.is_empty()
    }

    /// Whether `part` carries an injury.
    #[must_use]
    pub fn has_injury_on(&self, part: &str) -> bool {
        self.injuries
            .iter()
            .any(|injury| injury.part.eq_ignore_ascii_case(part))
    }

    /// Whether `part` is missing.
    #[must_use]
    pub fn is_missing(&self, part: &str) -> bool {
        self.missing_parts
            .iter()
            .any(|missing| missing.eq_ignore_ascii_case(part))
    }

    /// Removes `part` from the missing list, returning the name as it was stored.
    pub fn restore_part(&mut self, part: &str) -> Option<String> {
        let index = self
            .missing_parts
            .iter()
            .position(|missing| missing.eq_ignore_ascii_case(part))?;
        Some(self.missing_parts.remove(index))
    }

    /// Mood including active thoughts, clamped to 0..=100.
    #[must_use]
    pub fn mood(&self) -> i32 {
        self.thoughts
            .iter()
            .map(|thought| thought.mood_offset)
            .fold(self.base_mood, i32::saturating_add)
            .clamp(0, 100)
    }

    /// Index of the thought labelled `label`, ignoring case.
    #[must_use]
    pub fn thought_index(&self, label: &str) -> Option<usize> {
        self.thoughts
            .iter()
            .position(|thought| thought.label.eq_ignore_ascii_case(label))
    }

    /// Drops faded thoughts and inspiration. Returns the number of removed thoughts.
    pub fn expire(&mut self, now: Tick) -> usize {
        let before = self.thoughts.len();
        self.thoughts.retain(|thought| thought.expires_at > now);
        if self
            .inspiration
            .as_ref()
            .is_some_and(|inspiration| inspiration.expires_at <= now)
        {
            self.inspiration = None;
        }
        before - self.thoughts.len()
    }

    /// Level of a need, if tracked.
    #[must_use]
    pub fn need(&self, name: &str) -> Option<i32> {
        self.needs.get(&name.to_ascii_lowercase()).copied()
    }

    /// Whether `name` is unmet; `any` checks every need.
    #[must_use]
    pub fn need_is_low(&self, name: &str) -> bool {
        if name == "any" {
            self.needs.values().any(|level| *level < LOW_NEED)
        } else {
            self.need(name).is_some_and(|level| level < LOW_NEED)
        }
    }

    /// Whether the colonist has `name`, ignoring case.
    #[must_use]
    pub fn has_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| t.eq_ignore_ascii_case(name))
    }

    /// Carried count of `item`, ignoring case.
    #[must_use]
    pub fn carried(&self, item: &str) -> u32 {
        self.inventory
            .get(&item.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }
}

impl AgentHandle for Colonist {
    fn agent_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_sums_thoughts_and_clamps() {
        let mut colonist = Colonist::new("c1", "Ada");
        colonist.thoughts.push(Thought {
            label: "praised".into(),
            mood_offset: 8,
            expires_at: 10,
        });
        assert_eq!(colonist.mood(), 58);
        colonist.thoughts.push(Thought {
            label: "ate without table".into(),
            mood_offset: -90,
            expires_at: 5,
        });
        assert_eq!(colonist.mood(), 0);
        assert_eq!(colonist.expire(5), 1);
        assert_eq!(colonist.mood(), 58);
    }

    #[test]
    fn json_defaults_fill_missing_fields() {
        let colonist: Colonist =
            serde_json::from_str(r#"{ "id": "c2", "name": "Bo", "needs": { "food": 12 } }"#)
                .unwrap();
        assert!(colonist.alive);
        assert_eq!(colonist.base_mood, 50);
        assert!(colonist.need_is_low("food"));
        assert!(colonist.need_is_low("any"));
        assert!(!colonist.need_is_low("rest"));
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colonist.json");
        let mut colonist = Colonist::new("c3", "Cy");
        colonist.inventory.insert("steel".into(), 5);
        colonist.save_json(&path).unwrap();
        assert_eq!(Colonist::load_json(&path).unwrap(), colonist);
    }
}

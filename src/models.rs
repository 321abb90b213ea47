//! Data models for scraped hero records and scrape runs.
//!
//! This module defines the structures that flow through the pipeline:
//! - [`ComprehensiveHeroData`]: everything one page scrape produces for a hero
//! - Facets: [`HeroBasicInfo`], [`HeroStats`], [`HeroAbility`], [`HeroLore`],
//!   [`HeroPatch`], [`HeroEsportsStats`]
//! - [`ScrapeRun`]: the persisted envelope of one pipeline execution
//!
//! Hero records use snake_case field names; the run envelope uses camelCase
//! (`totalHeroes`, ...) so files written by earlier tooling still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a hero as scraped from its page.
///
/// The unique key for reconciliation is the normalized name (see
/// [`hero_key`]); `slug` is derived from the name and names the per-hero
/// inspection file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroBasicInfo {
    pub name: String,
    /// Never absent: falls back to `"Unknown"` when no selector hits.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Numeric attribute snapshot at a level baseline.
///
/// `None` means "not extracted", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroStats {
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magic_defense: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regen_hp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regen_mana: Option<String>,
}

fn default_level() -> u32 {
    1
}

impl Default for HeroStats {
    fn default() -> Self {
        Self {
            level: default_level(),
            hp: None,
            mana: None,
            attack: None,
            defense: None,
            magic_defense: None,
            move_speed: None,
            attack_speed: None,
            crit_rate: None,
            regen_hp: None,
            regen_mana: None,
        }
    }
}

impl HeroStats {
    /// True when no numeric or regen field was extracted.
    pub fn is_empty(&self) -> bool {
        self.hp.is_none()
            && self.mana.is_none()
            && self.attack.is_none()
            && self.defense.is_none()
            && self.magic_defense.is_none()
            && self.move_speed.is_none()
            && self.attack_speed.is_none()
            && self.crit_rate.is_none()
            && self.regen_hp.is_none()
            && self.regen_mana.is_none()
    }
}

/// The fixed ability slots, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityType {
    Passive,
    Skill1,
    Skill2,
    Ultimate,
}

impl AbilityType {
    pub const ORDER: [AbilityType; 4] = [
        AbilityType::Passive,
        AbilityType::Skill1,
        AbilityType::Skill2,
        AbilityType::Ultimate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityType::Passive => "Passive",
            AbilityType::Skill1 => "Skill1",
            AbilityType::Skill2 => "Skill2",
            AbilityType::Ultimate => "Ultimate",
        }
    }

    /// Header text used on hero pages ("Skill 1" rather than "Skill1").
    pub fn header_label(&self) -> &'static str {
        match self {
            AbilityType::Passive => "Passive",
            AbilityType::Skill1 => "Skill 1",
            AbilityType::Skill2 => "Skill 2",
            AbilityType::Ultimate => "Ultimate",
        }
    }

    /// Slot for a zero-based container position, `None` past the fourth.
    pub fn from_position(index: usize) -> Option<Self> {
        Self::ORDER.get(index).copied()
    }

    /// Recognize a type label such as `"Skill 2"`, `"skill2"`, `"S1"` or
    /// `"Ult"` anywhere in `label`.
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        if compact.is_empty() {
            return None;
        }
        if compact.contains("passive") {
            Some(AbilityType::Passive)
        } else if compact.contains("ultimate") || compact == "ult" || compact == "ulti" {
            Some(AbilityType::Ultimate)
        } else if compact.contains("skill1") || compact == "s1" || compact.contains("firstskill") {
            Some(AbilityType::Skill1)
        } else if compact.contains("skill2") || compact == "s2" || compact.contains("secondskill") {
            Some(AbilityType::Skill2)
        } else {
            None
        }
    }
}

impl fmt::Display for AbilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroAbility {
    pub ability_type: AbilityType,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_cost: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_scaling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_scaling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_scaling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_effects: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl HeroAbility {
    pub fn new(ability_type: AbilityType, name: String, description: String) -> Self {
        Self {
            ability_type,
            name,
            description,
            cooldown: None,
            mana_cost: None,
            damage_scaling: None,
            ap_scaling: None,
            ad_scaling: None,
            range_value: None,
            area_effect: None,
            additional_effects: None,
            icon_url: None,
        }
    }
}

/// Story text and related lists. At most one per hero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroLore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_story: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trivia: Vec<String>,
}

impl HeroLore {
    pub fn is_empty(&self) -> bool {
        self.background.is_none()
            && self.detailed_story.is_none()
            && self.relationships.is_empty()
            && self.quotes.is_empty()
            && self.trivia.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Buff,
    Nerf,
    Rework,
    New,
    Other,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Buff => "buff",
            ChangeType::Nerf => "nerf",
            ChangeType::Rework => "rework",
            ChangeType::New => "new",
            ChangeType::Other => "other",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One patch-history line for a hero.
///
/// Older scrape files call these fields `change_summary` / `change_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroPatch {
    pub patch_version: String,
    pub change_type: ChangeType,
    #[serde(alias = "change_summary")]
    pub description: String,
    #[serde(default, alias = "change_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroEsportsStats {
    #[serde(default, alias = "tournament_name")]
    pub tournament: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pick_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_games: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Everything one hero page scrape produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveHeroData {
    pub basic_info: HeroBasicInfo,
    #[serde(default)]
    pub stats: HeroStats,
    #[serde(default)]
    pub abilities: Vec<HeroAbility>,
    #[serde(default)]
    pub lore: HeroLore,
    #[serde(default)]
    pub patches: Vec<HeroPatch>,
    #[serde(default)]
    pub esports_stats: Vec<HeroEsportsStats>,
}

/// Outcome of a single discovery or page scrape, stamped with where and when.
#[derive(Debug)]
pub struct ScrapeResult<T, E> {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: Result<T, E>,
}

impl<T, E> ScrapeResult<T, E> {
    pub fn new(url: impl Into<String>, outcome: Result<T, E>) -> Self {
        Self {
            url: url.into(),
            timestamp: Utc::now(),
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// A hero that could not be scraped in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeFailure {
    pub hero: String,
    pub error: String,
}

/// Persisted envelope of one pipeline execution.
///
/// Owned and mutated only by the batch orchestrator; re-written after every
/// batch so a crash loses at most one batch of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRun {
    pub timestamp: DateTime<Utc>,
    pub total_heroes: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(default)]
    pub heroes: Vec<ComprehensiveHeroData>,
    #[serde(default)]
    pub errors: Vec<ScrapeFailure>,
}

impl ScrapeRun {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            total_heroes: 0,
            successful: 0,
            failed: 0,
            heroes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Percentage of successful heroes, `0.0` when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        success_rate(self.successful, self.failed)
    }

    pub fn record_success(&mut self, hero: ComprehensiveHeroData) {
        self.total_heroes += 1;
        self.successful += 1;
        self.heroes.push(hero);
    }

    pub fn record_failure(&mut self, hero: impl Into<String>, error: impl Into<String>) {
        self.total_heroes += 1;
        self.failed += 1;
        self.errors.push(ScrapeFailure {
            hero: hero.into(),
            error: error.into(),
        });
    }
}

impl Default for ScrapeRun {
    fn default() -> Self {
        Self::new()
    }
}

/// `successful / (successful + failed)` as a percentage, guarding the empty case.
pub fn success_rate(successful: usize, failed: usize) -> f64 {
    let attempted = successful + failed;
    if attempted == 0 {
        0.0
    } else {
        successful as f64 / attempted as f64 * 100.0
    }
}

/// Normalized reconciliation key: lowercase, underscores read as spaces.
///
/// Page identifiers (`Yi_Sun-shin`) and display names (`Yi Sun-shin`) map to
/// the same key.
pub fn hero_key(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_guards_zero() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert!(!success_rate(0, 0).is_nan());
    }

    #[test]
    fn test_success_rate_seventy_percent() {
        assert!((success_rate(7, 3) - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_bookkeeping() {
        let mut run = ScrapeRun::new();
        run.record_failure("Miya", "HTTP 500");
        run.record_success(ComprehensiveHeroData {
            basic_info: HeroBasicInfo {
                name: "Layla".to_string(),
                role: "Marksman".to_string(),
                slug: "layla".to_string(),
                ..Default::default()
            },
            stats: HeroStats::default(),
            abilities: vec![],
            lore: HeroLore::default(),
            patches: vec![],
            esports_stats: vec![],
        });

        assert_eq!(run.total_heroes, 2);
        assert_eq!(run.successful, 1);
        assert_eq!(run.failed, 1);
        assert_eq!(run.errors[0].hero, "Miya");
        assert!((run.success_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_serializes_camel_case_envelope() {
        let run = ScrapeRun::new();
        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"totalHeroes\":0"));
        assert!(json.contains("\"heroes\":[]"));
        assert!(json.contains("\"errors\":[]"));
    }

    #[test]
    fn test_legacy_patch_fields_deserialize() {
        let json = r#"{
            "patch_version": "1.8.32",
            "change_type": "buff",
            "change_summary": "Increased damage"
        }"#;
        let patch: HeroPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.change_type, ChangeType::Buff);
        assert_eq!(patch.description, "Increased damage");
        assert_eq!(patch.date, None);
    }

    #[test]
    fn test_hero_record_defaults_missing_facets() {
        let json = r#"{"basic_info": {"name": "Miya", "role": "Marksman", "slug": "miya"}}"#;
        let hero: ComprehensiveHeroData = serde_json::from_str(json).unwrap();
        assert_eq!(hero.stats.level, 1);
        assert!(hero.abilities.is_empty());
        assert!(hero.lore.is_empty());
    }

    #[test]
    fn test_ability_type_labels() {
        assert_eq!(AbilityType::from_label("Passive"), Some(AbilityType::Passive));
        assert_eq!(AbilityType::from_label("Skill 1"), Some(AbilityType::Skill1));
        assert_eq!(AbilityType::from_label("skill2"), Some(AbilityType::Skill2));
        assert_eq!(AbilityType::from_label("Ultimate:"), Some(AbilityType::Ultimate));
        assert_eq!(AbilityType::from_label("Ult"), Some(AbilityType::Ultimate));
        assert_eq!(AbilityType::from_label("Moonlight Waltz"), None);
        assert_eq!(AbilityType::from_position(4), None);
    }

    #[test]
    fn test_hero_key_normalizes_identifiers() {
        assert_eq!(hero_key("Yi_Sun-shin"), hero_key("Yi Sun-shin"));
        assert_eq!(hero_key("MIYA"), "miya");
    }
}

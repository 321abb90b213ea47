//! SQL text for identity and facet upserts.
//!
//! Statements are plain strings because the D1 channel only accepts SQL
//! text. Every string value goes through [`quote`]; absent values become
//! `NULL`, except the esports `tournament`/`date` pair, which is part of a
//! unique key and uses `''` so re-uploads still conflict.

use crate::models::{
    ComprehensiveHeroData, HeroAbility, HeroBasicInfo, HeroEsportsStats, HeroLore, HeroPatch,
    HeroStats,
};
use std::fmt;

/// How a facet row points at its hero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeroRef<'a> {
    /// Resolved row id from the id map.
    Id(i64),
    /// Resolved inside the statement (`SELECT id FROM heroes WHERE name = ...`).
    Name(&'a str),
}

impl HeroRef<'_> {
    fn sql(&self) -> String {
        match self {
            HeroRef::Id(id) => id.to_string(),
            HeroRef::Name(name) => format!("(SELECT id FROM heroes WHERE name = {})", quote(name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Ability,
    Stats,
    Lore,
    Patch,
    Esports,
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Facet::Ability => "ability",
            Facet::Stats => "stats",
            Facet::Lore => "lore",
            Facet::Patch => "patch",
            Facet::Esports => "esports",
        })
    }
}

/// One facet row ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetStatement {
    pub facet: Facet,
    /// What the row is, for logs (`"Moon Arrow"`, `"1.8.32"`, ...).
    pub label: String,
    pub sql: String,
}

/// Single-quoted SQL string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn text(value: Option<&str>) -> String {
    value.map(quote).unwrap_or_else(|| "NULL".to_string())
}

fn real(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => "NULL".to_string(),
    }
}

fn json_list(items: &[String]) -> String {
    quote(&serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string()))
}

/// Role stored for a hero: scraped `Unknown` becomes `default_role`.
pub fn stored_role<'a>(role: &'a str, default_role: &'a str) -> &'a str {
    if role.is_empty() || role.eq_ignore_ascii_case("unknown") {
        default_role
    } else {
        role
    }
}

/// Identity upsert keyed on name. Existing rows are updated in place so
/// their ids (and every facet row pointing at them) stay valid.
pub fn hero_identity(info: &HeroBasicInfo, default_role: &str) -> String {
    format!(
        "INSERT INTO heroes (name, role, lane, region, release_date, slug, image_url, thumbnail_url) \
         VALUES ({}, {}, {}, {}, {}, {}, {}, {}) \
         ON CONFLICT(name) DO UPDATE SET role = excluded.role, lane = excluded.lane, \
         region = excluded.region, release_date = excluded.release_date, slug = excluded.slug, \
         image_url = excluded.image_url, thumbnail_url = excluded.thumbnail_url;",
        quote(&info.name),
        quote(stored_role(&info.role, default_role)),
        text(info.lane.as_deref()),
        text(info.region.as_deref()),
        text(info.release_date.as_deref()),
        quote(&info.slug),
        text(info.image_url.as_deref()),
        text(info.thumbnail_url.as_deref()),
    )
}

pub fn ability(hero: HeroRef, a: &HeroAbility) -> String {
    format!(
        "INSERT OR REPLACE INTO abilities (hero_id, ability_type, name, description, cooldown, \
         mana_cost, damage_scaling, ap_scaling, ad_scaling, range_value, area_effect, \
         additional_effects, icon_url) VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {});",
        hero.sql(),
        quote(a.ability_type.as_str()),
        quote(&a.name),
        quote(&a.description),
        text(a.cooldown.as_deref()),
        text(a.mana_cost.as_deref()),
        text(a.damage_scaling.as_deref()),
        text(a.ap_scaling.as_deref()),
        text(a.ad_scaling.as_deref()),
        text(a.range_value.as_deref()),
        text(a.area_effect.as_deref()),
        text(a.additional_effects.as_deref()),
        text(a.icon_url.as_deref()),
    )
}

pub fn base_stats(hero: HeroRef, s: &HeroStats) -> String {
    format!(
        "INSERT OR REPLACE INTO base_stats (hero_id, level, hp, mana, attack, defense, \
         magic_defense, move_speed, attack_speed, crit_rate, regen_hp, regen_mana) \
         VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {});",
        hero.sql(),
        s.level,
        real(s.hp),
        real(s.mana),
        real(s.attack),
        real(s.defense),
        real(s.magic_defense),
        real(s.move_speed),
        real(s.attack_speed),
        real(s.crit_rate),
        text(s.regen_hp.as_deref()),
        text(s.regen_mana.as_deref()),
    )
}

pub fn lore(hero: HeroRef, l: &HeroLore) -> String {
    format!(
        "INSERT OR REPLACE INTO lore (hero_id, background, detailed_story, relationships, quotes, trivia) \
         VALUES ({}, {}, {}, {}, {}, {});",
        hero.sql(),
        text(l.background.as_deref()),
        text(l.detailed_story.as_deref()),
        json_list(&l.relationships),
        json_list(&l.quotes),
        json_list(&l.trivia),
    )
}

pub fn patch(hero: HeroRef, p: &HeroPatch) -> String {
    format!(
        "INSERT OR REPLACE INTO patches (hero_id, patch_version, change_type, description, date) \
         VALUES ({}, {}, {}, {}, {});",
        hero.sql(),
        quote(&p.patch_version),
        quote(p.change_type.as_str()),
        quote(&p.description),
        text(p.date.as_deref()),
    )
}

pub fn esports(hero: HeroRef, e: &HeroEsportsStats) -> String {
    format!(
        "INSERT OR REPLACE INTO esports_stats (hero_id, tournament, pick_rate, ban_rate, win_rate, date) \
         VALUES ({}, {}, {}, {}, {}, {});",
        hero.sql(),
        quote(&e.tournament),
        real(e.pick_rate),
        real(e.ban_rate),
        real(e.win_rate),
        quote(e.date.as_deref().unwrap_or_default()),
    )
}

/// Every facet row of one hero. Empty stats and lore produce no row.
pub fn facet_statements(hero: HeroRef, data: &ComprehensiveHeroData) -> Vec<FacetStatement> {
    let mut out = Vec::new();

    for a in &data.abilities {
        out.push(FacetStatement {
            facet: Facet::Ability,
            label: a.name.clone(),
            sql: ability(hero, a),
        });
    }
    if !data.stats.is_empty() {
        out.push(FacetStatement {
            facet: Facet::Stats,
            label: format!("level {}", data.stats.level),
            sql: base_stats(hero, &data.stats),
        });
    }
    if !data.lore.is_empty() {
        out.push(FacetStatement {
            facet: Facet::Lore,
            label: "lore".to_string(),
            sql: lore(hero, &data.lore),
        });
    }
    for p in &data.patches {
        out.push(FacetStatement {
            facet: Facet::Patch,
            label: p.patch_version.clone(),
            sql: patch(hero, p),
        });
    }
    for e in &data.esports_stats {
        out.push(FacetStatement {
            facet: Facet::Esports,
            label: e.tournament.clone(),
            sql: esports(hero, e),
        });
    }
    out
}

//! Liquipedia hero page scraper.
//!
//! One page fetch per hero. Each facet (basic info, stats, abilities, lore,
//! patches, esports) has its own extraction function built from declarative
//! selector chains; a facet whose selectors all miss comes back empty and
//! the scrape still succeeds. Only a failed page fetch fails the hero.

use crate::extract::{
    create_slug, element_lines, element_text, extract_number, first_element, first_match_in,
    is_heading_wrapper, next_element, normalize_text, parse_selector, parse_stat_value,
    resolve_url, section_nodes, section_text, select_within,
};
use crate::fetch::{FetchAsync, FetchError};
use crate::models::{
    AbilityType, ChangeType, ComprehensiveHeroData, HeroAbility, HeroBasicInfo,
    HeroEsportsStats, HeroLore, HeroPatch, HeroStats, ScrapeResult,
};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// One step in a field's fallback chain.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// Text of the first non-empty match of a CSS selector.
    Css(&'static str),
    /// Value cell next to an infobox label.
    Infobox(&'static str),
}

const NAME: &[Lookup] = &[Lookup::Css("h1"), Lookup::Css(".page-title"), Lookup::Css(".hero-name")];

const ROLE: &[Lookup] = &[
    Lookup::Css(".infobox .role"),
    Lookup::Css(".hero-role"),
    Lookup::Css("[data-role]"),
    Lookup::Infobox("Role"),
    Lookup::Infobox("Class"),
];

const LANE: &[Lookup] = &[Lookup::Infobox("Lane"), Lookup::Infobox("Position")];

const REGION: &[Lookup] = &[Lookup::Infobox("Region"), Lookup::Infobox("Origin")];

const RELEASE_DATE: &[Lookup] = &[Lookup::Infobox("Release Date"), Lookup::Infobox("Released")];

/// Cells that may hold an infobox label, each followed by its value cell.
const INFOBOX_LABEL_CELLS: &[&str] = &[
    ".infobox td, .infobox th",
    ".infobox-label",
    ".infobox-description",
];

const HERO_IMAGE: &[&str] = &[".infobox img", ".infobox-image img", ".hero-image img"];

const STAT_SECTIONS: &[&str] = &[".stats-table", ".hero-stats", ".statistics", ".infobox"];

const STAT_LABEL_CELLS: &str = "td, th, .infobox-description, .infobox-label";

#[derive(Debug, Clone, Copy)]
enum StatField {
    Hp,
    Mana,
    Attack,
    Defense,
    MagicDefense,
    MoveSpeed,
    AttackSpeed,
    CritRate,
    RegenHp,
    RegenMana,
}

/// Label → field, most specific first; the first label that hits wins.
const STAT_LABELS: &[(&str, StatField)] = &[
    ("HP Regen", StatField::RegenHp),
    ("Mana Regen", StatField::RegenMana),
    ("HP", StatField::Hp),
    ("Health", StatField::Hp),
    ("Mana", StatField::Mana),
    ("MP", StatField::Mana),
    ("Physical Attack", StatField::Attack),
    ("Attack Speed", StatField::AttackSpeed),
    ("Attack", StatField::Attack),
    ("ATK", StatField::Attack),
    ("Magic Defense", StatField::MagicDefense),
    ("Magic Resist", StatField::MagicDefense),
    ("Physical Defense", StatField::Defense),
    ("Defense", StatField::Defense),
    ("DEF", StatField::Defense),
    ("Movement Speed", StatField::MoveSpeed),
    ("Move Speed", StatField::MoveSpeed),
    ("Speed", StatField::MoveSpeed),
    ("AS", StatField::AttackSpeed),
    ("Critical Rate", StatField::CritRate),
    ("Crit Rate", StatField::CritRate),
];

const ABILITY_SECTIONS: &[&str] = &[
    ".abilities",
    ".skills",
    ".hero-abilities",
    ".skill-section",
    "#Abilities",
    "#Skills",
];
const ABILITY_CONTAINERS: &str = ".ability, .skill";
const ABILITY_NAME: &[&str] = &[".ability-name", ".skill-name", "h3", "h4"];
const ABILITY_DESCRIPTION: &[&str] = &[".ability-description", ".skill-description", "p"];
const ABILITY_TYPE_TEXT: &[&str] = &[".ability-type", ".skill-type"];
const ABILITY_TYPE_ATTRS: &[&str] = &["data-ability-type", "data-skill-type", "data-type"];
const ABILITY_HEADERS: &str = "h3, h4, .ability-header";

#[derive(Debug, Clone, Copy)]
enum AbilityProp {
    Cooldown,
    ManaCost,
    Damage,
    Range,
    Area,
}

const ABILITY_PROPS: &[(&str, AbilityProp)] = &[
    ("Cooldown", AbilityProp::Cooldown),
    ("Mana Cost", AbilityProp::ManaCost),
    ("Cost", AbilityProp::ManaCost),
    ("Damage", AbilityProp::Damage),
    ("Range", AbilityProp::Range),
    ("Area", AbilityProp::Area),
];

const LORE_BACKGROUND: &[&str] = &["#Lore", "#Background", "#Story", ".lore", ".background", ".story"];
const LORE_DETAILED: &[&str] = &["#Detailed_Story", "#Full_Story", ".detailed-story", ".full-story"];
const LORE_RELATIONSHIPS: &[&str] = &["#Relationships", ".relationships"];
const LORE_QUOTES: &[&str] = &["#Quotes", ".quotes"];
const LORE_TRIVIA: &[&str] = &["#Trivia", ".trivia"];

const PATCH_SECTIONS: &[&str] = &[
    "#Patch_History",
    "#Version_History",
    "#Updates",
    ".patch-history",
    ".version-history",
];
const PATCH_ENTRIES: &str = "li, .patch-entry";

const ESPORTS_SECTIONS: &[&str] = &[
    "#Competitive",
    "#Esports",
    "#Tournament",
    ".competitive",
    ".esports",
    ".tournament-stats",
];

/// Keyword rules for patch classification; first match wins.
const CHANGE_RULES: &[(&[&str], ChangeType)] = &[
    (&["buff", "increase"], ChangeType::Buff),
    (&["nerf", "decrease"], ChangeType::Nerf),
    (&["rework", "redesign"], ChangeType::Rework),
];

static PATCH_VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:patch|version|v)\.?\s*(\d+\.\d+(?:\.\d+)*)").expect("patch version regex")
});

static DOTTED_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+(?:\.\d+)?)").expect("dotted version regex"));

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("iso date regex"));

/// Scrapes one hero page per call through a shared fetch client.
#[derive(Debug)]
pub struct HeroScraper<'a, F> {
    client: &'a F,
    base_url: &'a str,
}

impl<'a, F> HeroScraper<'a, F>
where
    F: FetchAsync,
{
    pub fn new(client: &'a F, base_url: &'a str) -> Self {
        Self { client, base_url }
    }

    pub fn hero_url(&self, hero_id: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(hero_id)
        )
    }

    /// Fetch and parse one hero. Fails only when the page fetch fails.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, hero_id: &str) -> ScrapeResult<ComprehensiveHeroData, FetchError> {
        let url = self.hero_url(hero_id);
        let outcome = match self.client.fetch(&url).await {
            Ok(body) => {
                let hero = parse_hero_page(&body, hero_id, self.base_url, &url);
                info!(
                    name = %hero.basic_info.name,
                    role = %hero.basic_info.role,
                    abilities = hero.abilities.len(),
                    patches = hero.patches.len(),
                    esports = hero.esports_stats.len(),
                    "Scraped hero"
                );
                Ok(hero)
            }
            Err(e) => {
                error!(%url, error = %e, "Hero page fetch failed");
                Err(e)
            }
        };
        ScrapeResult::new(url, outcome)
    }
}

/// Parse a fetched hero page into a full record. Never fails.
pub fn parse_hero_page(html: &str, hero_id: &str, base_url: &str, page_url: &str) -> ComprehensiveHeroData {
    let document = Html::parse_document(html);
    let root = document.root_element();

    ComprehensiveHeroData {
        basic_info: extract_basic_info(root, hero_id, base_url),
        stats: extract_stats(root),
        abilities: extract_abilities(root, base_url),
        lore: extract_lore(root),
        patches: extract_patches(root, page_url),
        esports_stats: extract_esports_stats(root),
    }
}

fn lookup(root: ElementRef, chain: &[Lookup]) -> Option<String> {
    chain.iter().find_map(|step| match step {
        Lookup::Css(selector) => first_match_in(root, &[*selector]),
        Lookup::Infobox(label) => infobox_value(root, label),
    })
}

fn label_matches(cell_text: &str, label: &str) -> bool {
    cell_text
        .trim_end_matches(':')
        .to_lowercase()
        .contains(&label.to_lowercase())
}

/// Value next to `label` in any supported infobox layout.
fn infobox_value(root: ElementRef, label: &str) -> Option<String> {
    let from_cells = INFOBOX_LABEL_CELLS.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        root.select(&selector)
            .filter(|cell| label_matches(&element_text(*cell), label))
            .filter_map(next_element)
            .map(element_text)
            .find(|value| !value.is_empty())
    });
    if from_cells.is_some() {
        return from_cells;
    }

    let data_label = format!("[data-label=\"{label}\"]");
    let class_name = format!(".{}", label.to_lowercase().replace(' ', "-"));
    first_match_in(root, &[data_label.as_str(), class_name.as_str()])
}

fn extract_basic_info(root: ElementRef, hero_id: &str, base_url: &str) -> HeroBasicInfo {
    let name = lookup(root, NAME).unwrap_or_else(|| hero_id.replace('_', " "));
    let role = lookup(root, ROLE).unwrap_or_else(|| "Unknown".to_string());

    let image_url = first_element(root, HERO_IMAGE)
        .and_then(|img| img.value().attr("src").map(str::to_string))
        .or_else(|| {
            let by_alt = format!("img[alt*=\"{}\"]", name.replace('"', ""));
            first_element(root, &[by_alt.as_str()])
                .and_then(|img| img.value().attr("src").map(str::to_string))
        })
        .map(|src| resolve_url(&src, base_url));

    HeroBasicInfo {
        slug: create_slug(&name),
        role,
        lane: lookup(root, LANE),
        region: lookup(root, REGION),
        release_date: lookup(root, RELEASE_DATE),
        thumbnail_url: image_url.clone(),
        image_url,
        name,
    }
}

fn is_stat_label(cell_text: &str, label: &str) -> bool {
    cell_text.trim_end_matches(':').eq_ignore_ascii_case(label)
}

/// Value cell for a stat label: exact label match first, then substring.
///
/// The substring pass skips `claimed` cells, so "Defense" never reads the
/// "Magic Defense" row. A cell taken by substring is claimed for later labels.
fn stat_cell(cells: &[ElementRef], label: &str, claimed: &mut [bool]) -> Option<String> {
    let value_of = |cell: &ElementRef| {
        next_element(*cell)
            .map(element_text)
            .filter(|v| !v.is_empty())
    };
    if let Some(value) = cells
        .iter()
        .filter(|c| is_stat_label(&element_text(**c), label))
        .find_map(value_of)
    {
        return Some(value);
    }

    let (index, value) = cells
        .iter()
        .enumerate()
        .filter(|(i, c)| !claimed[*i] && element_text(**c).contains(label))
        .find_map(|(i, c)| value_of(c).map(|v| (i, v)))?;
    claimed[index] = true;
    Some(value)
}

fn extract_stats(root: ElementRef) -> HeroStats {
    let mut stats = HeroStats::default();
    let Some(section) = first_element(root, STAT_SECTIONS) else {
        debug!("No stats section");
        return stats;
    };
    let Some(cell_selector) = parse_selector(STAT_LABEL_CELLS) else {
        return stats;
    };
    let cells: Vec<ElementRef> = section.select(&cell_selector).collect();
    let mut claimed: Vec<bool> = cells
        .iter()
        .map(|c| {
            let text = element_text(*c);
            STAT_LABELS.iter().any(|(label, _)| is_stat_label(&text, label))
        })
        .collect();

    for (label, field) in STAT_LABELS {
        let Some(raw) = stat_cell(&cells, label, &mut claimed) else {
            continue;
        };
        let number = || parse_stat_value(&raw).map(|v| v.base);
        match field {
            StatField::Hp => stats.hp = stats.hp.or_else(number),
            StatField::Mana => stats.mana = stats.mana.or_else(number),
            StatField::Attack => stats.attack = stats.attack.or_else(number),
            StatField::Defense => stats.defense = stats.defense.or_else(number),
            StatField::MagicDefense => stats.magic_defense = stats.magic_defense.or_else(number),
            StatField::MoveSpeed => stats.move_speed = stats.move_speed.or_else(number),
            StatField::AttackSpeed => stats.attack_speed = stats.attack_speed.or_else(number),
            StatField::CritRate => stats.crit_rate = stats.crit_rate.or_else(number),
            StatField::RegenHp => {
                stats.regen_hp.get_or_insert(raw.clone());
            }
            StatField::RegenMana => {
                stats.regen_mana.get_or_insert(raw.clone());
            }
        }
    }
    stats
}

fn extract_abilities(root: ElementRef, base_url: &str) -> Vec<HeroAbility> {
    let containers = ABILITY_SECTIONS.iter().find_map(|raw| {
        let section = first_element(root, &[*raw])?;
        let selector = parse_selector(ABILITY_CONTAINERS)?;
        let found = select_within(&section_nodes(section), &selector);
        (!found.is_empty()).then_some(found)
    });

    match containers {
        Some(containers) => abilities_from_containers(&containers, base_url),
        None => {
            debug!("No ability containers; scanning ability headers");
            abilities_from_headers(root)
        }
    }
}

/// Explicit type marker on an ability container, if any.
fn container_type_label(container: ElementRef) -> Option<AbilityType> {
    ABILITY_TYPE_ATTRS
        .iter()
        .find_map(|attr| container.value().attr(attr))
        .and_then(AbilityType::from_label)
        .or_else(|| first_match_in(container, ABILITY_TYPE_TEXT).and_then(|t| AbilityType::from_label(&t)))
}

/// One ability per slot. A container's own type label wins; unlabelled
/// containers take the slot of their position, and positions past the
/// fourth are ignored.
fn abilities_from_containers(containers: &[ElementRef], base_url: &str) -> Vec<HeroAbility> {
    let mut slots: BTreeMap<AbilityType, HeroAbility> = BTreeMap::new();

    for (index, container) in containers.iter().enumerate() {
        let Some(ability_type) =
            container_type_label(*container).or_else(|| AbilityType::from_position(index))
        else {
            debug!(index, "Ignoring ability container past the fixed slots");
            continue;
        };
        if slots.contains_key(&ability_type) {
            debug!(index, %ability_type, "Ability slot already filled");
            continue;
        }
        if let Some(ability) = parse_ability(*container, ability_type, base_url) {
            slots.insert(ability_type, ability);
        }
    }

    slots.into_values().collect()
}

fn parse_ability(container: ElementRef, ability_type: AbilityType, base_url: &str) -> Option<HeroAbility> {
    let name = first_match_in(container, ABILITY_NAME)?;
    let description = first_match_in(container, ABILITY_DESCRIPTION)?;
    let mut ability = HeroAbility::new(ability_type, name, description);

    let text = element_lines(container);
    let lines: Vec<&str> = text.lines().collect();
    for (label, prop) in ABILITY_PROPS {
        let Some(value) = labelled_property(&lines, label) else {
            continue;
        };
        let slot = match prop {
            AbilityProp::Cooldown => &mut ability.cooldown,
            AbilityProp::ManaCost => &mut ability.mana_cost,
            AbilityProp::Damage => &mut ability.damage_scaling,
            AbilityProp::Range => &mut ability.range_value,
            AbilityProp::Area => &mut ability.area_effect,
        };
        slot.get_or_insert(value);
    }

    ability.icon_url = first_element(container, &["img"])
        .and_then(|img| img.value().attr("src"))
        .map(|src| resolve_url(src, base_url));
    Some(ability)
}

/// `Label: value`, `Label value-starting-with-a-digit`, or a bare `Label`
/// line followed by its value line.
fn labelled_property(lines: &[&str], label: &str) -> Option<String> {
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim();
        let Some(head) = line.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }
        let rest = line[label.len()..].trim_start();
        let value = if let Some(after_colon) = rest.strip_prefix(':') {
            let after_colon = after_colon.trim();
            if after_colon.is_empty() {
                lines.get(i + 1).map(|l| l.trim().to_string())
            } else {
                Some(after_colon.to_string())
            }
        } else if rest.is_empty() {
            lines.get(i + 1).map(|l| l.trim().to_string())
        } else if rest.starts_with(|c: char| c.is_ascii_digit()) {
            Some(rest.to_string())
        } else {
            None
        };
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            return Some(normalize_text(&value));
        }
    }
    None
}

fn content_after_header(header: ElementRef) -> Option<ElementRef> {
    next_element(header).or_else(|| {
        header
            .parent()
            .and_then(ElementRef::wrap)
            .filter(|p| is_heading_wrapper(*p))
            .and_then(next_element)
    })
}

fn abilities_from_headers(root: ElementRef) -> Vec<HeroAbility> {
    let Some(selector) = parse_selector(ABILITY_HEADERS) else {
        return Vec::new();
    };
    let headers: Vec<ElementRef> = root.select(&selector).collect();

    AbilityType::ORDER
        .iter()
        .filter_map(|ability_type| {
            let label = ability_type.header_label();
            let header = headers.iter().find(|h| element_text(**h).contains(label))?;
            let content = content_after_header(*header)?;
            let description = element_text(content);
            if description.is_empty() {
                return None;
            }
            let name = first_match_in(content, &["strong", "b"])
                .unwrap_or_else(|| format!("{label} Ability"));
            Some(HeroAbility::new(*ability_type, name, description))
        })
        .collect()
}

/// Section text of the first selector whose section is non-empty.
fn first_section_text(root: ElementRef, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let el = first_element(root, &[*raw])?;
        let text = section_text(el);
        (!text.is_empty()).then_some(text)
    })
}

/// Normalized texts of `item_selector` hits in the first matching section.
fn section_items(root: ElementRef, sections: &[&str], item_selector: &str) -> Vec<String> {
    let Some(items) = parse_selector(item_selector) else {
        return Vec::new();
    };
    sections
        .iter()
        .find_map(|raw| first_element(root, &[*raw]))
        .map(|section| {
            select_within(&section_nodes(section), &items)
                .into_iter()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unique()
                .collect()
        })
        .unwrap_or_default()
}

fn extract_lore(root: ElementRef) -> HeroLore {
    let background = first_section_text(root, LORE_BACKGROUND);
    let detailed_story =
        first_section_text(root, LORE_DETAILED).filter(|story| Some(story) != background.as_ref());

    HeroLore {
        background,
        detailed_story,
        relationships: section_items(root, LORE_RELATIONSHIPS, "a, .hero-link"),
        quotes: section_items(root, LORE_QUOTES, "li, blockquote"),
        trivia: section_items(root, LORE_TRIVIA, "li"),
    }
}

/// Keyword classification over the entry text, case-insensitive.
pub fn classify_change(text: &str) -> ChangeType {
    let lower = text.to_lowercase();
    CHANGE_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, change)| *change)
        .unwrap_or(ChangeType::Other)
}

/// Version named by a `patch`/`version`/`v` prefix, else the first dotted number.
pub fn extract_patch_version(text: &str) -> Option<String> {
    PATCH_VERSION_RE
        .captures(text)
        .or_else(|| DOTTED_VERSION_RE.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn parse_patch_entry(text: &str, source_url: Option<&str>) -> Option<HeroPatch> {
    let text = normalize_text(text);
    if text.is_empty() {
        return None;
    }
    Some(HeroPatch {
        patch_version: extract_patch_version(&text).unwrap_or_else(|| "Unknown".to_string()),
        change_type: classify_change(&text),
        date: ISO_DATE_RE
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        source_url: source_url.map(str::to_string),
        description: text,
    })
}

fn extract_patches(root: ElementRef, page_url: &str) -> Vec<HeroPatch> {
    section_items(root, PATCH_SECTIONS, PATCH_ENTRIES)
        .iter()
        .filter_map(|entry| parse_patch_entry(entry, Some(page_url)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EsportsColumn {
    Tournament,
    Pick,
    Ban,
    Win,
    Games,
    Date,
}

fn esports_column(header: &str) -> Option<EsportsColumn> {
    let h = header.to_lowercase();
    if h.contains("tournament") || h.contains("event") {
        Some(EsportsColumn::Tournament)
    } else if h.contains("pick") {
        Some(EsportsColumn::Pick)
    } else if h.contains("ban") {
        Some(EsportsColumn::Ban)
    } else if h.contains("win") {
        Some(EsportsColumn::Win)
    } else if h.contains("game") || h.contains("played") || h.contains("match") {
        Some(EsportsColumn::Games)
    } else if h.contains("date") || h.contains("updated") {
        Some(EsportsColumn::Date)
    } else {
        None
    }
}

fn row_cells<'a>(row: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "td" | "th"))
        .collect()
}

fn extract_esports_stats(root: ElementRef) -> Vec<HeroEsportsStats> {
    let Some(section) = ESPORTS_SECTIONS.iter().find_map(|raw| first_element(root, &[*raw])) else {
        return Vec::new();
    };
    let Some(row_selector) = parse_selector("tr") else {
        return Vec::new();
    };

    let mut columns: Option<Vec<Option<EsportsColumn>>> = None;
    let mut stats = Vec::new();

    for row in select_within(&section_nodes(section), &row_selector) {
        let cells = row_cells(row);
        let is_header = !cells.is_empty() && cells.iter().all(|c| c.value().name() == "th");
        if is_header {
            if columns.is_none() {
                columns = Some(cells.iter().map(|c| esports_column(&element_text(*c))).collect());
            }
            continue;
        }
        if cells.len() < 2 {
            continue;
        }
        let texts: Vec<String> = cells.iter().map(|c| element_text(*c)).collect();
        if let Some(stat) = parse_esports_row(&texts, columns.as_deref()) {
            stats.push(stat);
        }
    }
    stats
}

fn parse_esports_row(texts: &[String], columns: Option<&[Option<EsportsColumn>]>) -> Option<HeroEsportsStats> {
    let mut stat = HeroEsportsStats::default();
    match columns.filter(|cols| cols.contains(&Some(EsportsColumn::Tournament))) {
        Some(cols) => {
            for (text, column) in texts.iter().zip(cols.iter()) {
                match column {
                    Some(EsportsColumn::Tournament) => stat.tournament = text.clone(),
                    Some(EsportsColumn::Pick) => stat.pick_rate = extract_number(text),
                    Some(EsportsColumn::Ban) => stat.ban_rate = extract_number(text),
                    Some(EsportsColumn::Win) => stat.win_rate = extract_number(text),
                    Some(EsportsColumn::Games) => {
                        stat.total_games = extract_number(text).map(|n| n as u32)
                    }
                    Some(EsportsColumn::Date) => {
                        stat.date = Some(text.clone()).filter(|d| !d.is_empty())
                    }
                    None => {}
                }
            }
        }
        None => {
            stat.tournament = texts[0].clone();
            stat.win_rate = extract_number(&texts[1]);
        }
    }
    (!stat.tournament.is_empty()).then_some(stat)
}

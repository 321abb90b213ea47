/// Local mirror of the D1 hero tables.
///
/// The unique constraints are the conflict targets the upserts rely on:
/// re-running an upload replaces rows instead of duplicating them.
pub const SCHEMA_SQL: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS heroes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    lane TEXT,
    region TEXT,
    release_date TEXT,
    slug TEXT,
    image_url TEXT,
    thumbnail_url TEXT,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS abilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id INTEGER NOT NULL REFERENCES heroes(id),
    ability_type TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    cooldown TEXT,
    mana_cost TEXT,
    damage_scaling TEXT,
    ap_scaling TEXT,
    ad_scaling TEXT,
    range_value TEXT,
    area_effect TEXT,
    additional_effects TEXT,
    icon_url TEXT,
    UNIQUE(hero_id, ability_type)
);

CREATE TABLE IF NOT EXISTS base_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id INTEGER NOT NULL REFERENCES heroes(id),
    level INTEGER NOT NULL DEFAULT 1,
    hp REAL,
    mana REAL,
    attack REAL,
    defense REAL,
    magic_defense REAL,
    move_speed REAL,
    attack_speed REAL,
    crit_rate REAL,
    regen_hp TEXT,
    regen_mana TEXT,
    UNIQUE(hero_id, level)
);

CREATE TABLE IF NOT EXISTS lore (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id INTEGER NOT NULL UNIQUE REFERENCES heroes(id),
    background TEXT,
    detailed_story TEXT,
    relationships TEXT,
    quotes TEXT,
    trivia TEXT
);

CREATE TABLE IF NOT EXISTS patches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id INTEGER NOT NULL REFERENCES heroes(id),
    patch_version TEXT NOT NULL,
    change_type TEXT NOT NULL,
    description TEXT NOT NULL,
    date TEXT,
    UNIQUE(hero_id, patch_version, description)
);

CREATE TABLE IF NOT EXISTS esports_stats (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hero_id INTEGER NOT NULL REFERENCES heroes(id),
    tournament TEXT NOT NULL,
    pick_rate REAL,
    ban_rate REAL,
    win_rate REAL,
    date TEXT NOT NULL DEFAULT '',
    UNIQUE(hero_id, tournament, date)
);
";

//! Upload and reconciliation of scraped heroes into the relational store.
//!
//! # Submodules
//!
//! - [`statements`]: SQL text for identity and facet upserts
//! - [`sink`]: the [`SqlSink`] seam with the D1 (`wrangler`) and SQLite channels
//! - [`schema`]: the local SQLite mirror of the hero tables
//! - [`api`]: the HTTP API sink
//!
//! # Flow
//!
//! 1. Identity step: upsert one `heroes` row per scraped hero (keyed on name)
//! 2. Facet step: snapshot `name -> id` once ([`HeroIdMap`]), then upsert
//!    abilities, stats, lore, patches and esports rows for every hero found in
//!    the snapshot; heroes missing from it are skipped and counted
//! 3. Verification: count rows per table
//!
//! Statements are spaced by a [`RateLimiter`] and heroes are processed in
//! batches with a pause between batches. A failing statement is logged and
//! counted; it never stops sibling rows or later heroes.

pub mod api;
pub mod schema;
pub mod sink;
pub mod statements;

pub use sink::{SinkError, SqlSink, SqliteSink, WranglerSink};

use crate::config::UploadConfig;
use crate::fetch::RateLimiter;
use crate::models::{ComprehensiveHeroData, hero_key};
use statements::{Facet, HeroRef, facet_statements, hero_identity};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Tables reported by the verification pass.
pub const VERIFY_TABLES: [&str; 6] = [
    "heroes",
    "abilities",
    "base_stats",
    "lore",
    "patches",
    "esports_stats",
];

/// Read-only `hero_key(name) -> id` snapshot taken once per upload run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeroIdMap {
    ids: HashMap<String, i64>,
}

impl HeroIdMap {
    #[instrument(level = "info", skip_all)]
    pub async fn load<S: SqlSink>(sink: &S) -> Result<Self, SinkError> {
        let rows = sink.query("SELECT id, name FROM heroes").await?;
        let map = Self::from_rows(&rows);
        info!(heroes = map.len(), "Loaded hero id map");
        Ok(map)
    }

    pub fn from_rows(rows: &[sink::Row]) -> Self {
        let ids = rows
            .iter()
            .filter_map(|row| {
                let id = row.get("id")?.as_i64()?;
                let name = row.get("name")?.as_str()?;
                Some((hero_key(name), id))
            })
            .collect();
        Self { ids }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.ids.get(&hero_key(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Number of `heroes` rows; the reachability check run before any write.
#[instrument(level = "info", skip_all)]
pub async fn hero_count<S: SqlSink>(sink: &S) -> Result<i64, SinkError> {
    let rows = sink.query("SELECT COUNT(*) AS count FROM heroes").await?;
    Ok(rows
        .first()
        .and_then(|r| r.get("count"))
        .and_then(|v| v.as_i64())
        .unwrap_or(0))
}

/// Counters for one upload run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadTotals {
    pub heroes_processed: usize,
    /// Heroes with no identity row in the id snapshot.
    pub heroes_skipped: usize,
    pub identities: usize,
    pub abilities: usize,
    pub stats: usize,
    pub lore: usize,
    pub patches: usize,
    pub esports: usize,
    /// Statements that failed.
    pub failed: usize,
}

impl UploadTotals {
    fn record(&mut self, facet: Facet) {
        match facet {
            Facet::Ability => self.abilities += 1,
            Facet::Stats => self.stats += 1,
            Facet::Lore => self.lore += 1,
            Facet::Patch => self.patches += 1,
            Facet::Esports => self.esports += 1,
        }
    }
}

impl fmt::Display for UploadTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "heroes processed: {}, skipped: {}, identities: {}, abilities: {}, stats: {}, lore: {}, patches: {}, esports: {}, failed statements: {}",
            self.heroes_processed,
            self.heroes_skipped,
            self.identities,
            self.abilities,
            self.stats,
            self.lore,
            self.patches,
            self.esports,
            self.failed
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub batch_size: usize,
    pub delay_between_batches: Duration,
    pub statement_delay: Duration,
    pub default_role: String,
}

impl UploadOptions {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            delay_between_batches: Duration::from_millis(config.delay_between_batches_ms),
            statement_delay: Duration::from_millis(config.statement_delay_ms),
            default_role: config.default_role.clone(),
        }
    }
}

/// Writes scraped heroes through a [`SqlSink`].
#[derive(Debug)]
pub struct Uploader<'a, S> {
    sink: &'a S,
    limiter: RateLimiter,
    options: UploadOptions,
}

impl<'a, S> Uploader<'a, S>
where
    S: SqlSink,
{
    pub fn new(sink: &'a S, options: UploadOptions) -> Self {
        Self {
            sink,
            limiter: RateLimiter::new(options.statement_delay),
            options,
        }
    }

    async fn execute(&self, sql: &str) -> Result<(), SinkError> {
        self.limiter.acquire().await;
        self.sink.execute(sql).await
    }

    /// Run `each` over `heroes` in batches, pausing between batches.
    async fn in_batches<'h, Fut>(
        &self,
        heroes: &'h [ComprehensiveHeroData],
        mut each: impl FnMut(&'h ComprehensiveHeroData) -> Fut,
    ) where
        Fut: Future<Output = ()>,
    {
        let batch_size = self.options.batch_size.max(1);
        let batch_count = heroes.len().div_ceil(batch_size);
        for (index, batch) in heroes.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            info!(batch = batch_no, of = batch_count, heroes = batch.len(), "Uploading batch");
            for hero in batch {
                each(hero).await;
            }
            if batch_no < batch_count && !self.options.delay_between_batches.is_zero() {
                debug!(
                    delay_ms = self.options.delay_between_batches.as_millis() as u64,
                    "Waiting before next batch"
                );
                sleep(self.options.delay_between_batches).await;
            }
        }
    }

    /// Upsert one `heroes` row per scraped hero.
    #[instrument(level = "info", skip_all, fields(heroes = heroes.len()))]
    pub async fn upload_identities(&self, heroes: &[ComprehensiveHeroData]) -> UploadTotals {
        let totals = std::cell::RefCell::new(UploadTotals::default());
        self.in_batches(heroes, |hero| {
            let totals = &totals;
            async move {
                let sql = hero_identity(&hero.basic_info, &self.options.default_role);
                let result = self.execute(&sql).await;
                let mut t = totals.borrow_mut();
                t.heroes_processed += 1;
                match result {
                    Ok(()) => t.identities += 1,
                    Err(e) => {
                        warn!(hero = %hero.basic_info.name, error = %e, "Identity upsert failed");
                        t.failed += 1;
                    }
                }
            }
        })
        .await;
        let totals = totals.into_inner();
        info!(%totals, "Identity upload complete");
        totals
    }

    /// Upsert every facet of every hero present in the id snapshot.
    ///
    /// Fails only when the id snapshot itself cannot be read.
    #[instrument(level = "info", skip_all, fields(heroes = heroes.len()))]
    pub async fn upload_facets(&self, heroes: &[ComprehensiveHeroData]) -> Result<UploadTotals, SinkError> {
        let ids = HeroIdMap::load(self.sink).await?;
        let totals = std::cell::RefCell::new(UploadTotals::default());
        self.in_batches(heroes, |hero| {
            let (ids, totals) = (&ids, &totals);
            async move {
                let name = &hero.basic_info.name;
                let Some(id) = ids.get(name) else {
                    warn!(hero = %name, "Hero not in database; skipping facets");
                    totals.borrow_mut().heroes_skipped += 1;
                    return;
                };
                self.upload_hero(hero, id, totals).await;
            }
        })
        .await;
        let totals = totals.into_inner();
        info!(%totals, "Facet upload complete");
        Ok(totals)
    }

    #[instrument(level = "info", skip_all, fields(hero = %hero.basic_info.name, id = id))]
    async fn upload_hero(
        &self,
        hero: &ComprehensiveHeroData,
        id: i64,
        totals: &std::cell::RefCell<UploadTotals>,
    ) {
        let statements = facet_statements(HeroRef::Id(id), hero);
        debug!(statements = statements.len(), "Uploading facets");
        for stmt in statements {
            let result = self.execute(&stmt.sql).await;
            let mut t = totals.borrow_mut();
            match result {
                Ok(()) => t.record(stmt.facet),
                Err(e) => {
                    warn!(facet = %stmt.facet, row = %stmt.label, error = %e, "Facet upsert failed");
                    t.failed += 1;
                }
            }
        }
        totals.borrow_mut().heroes_processed += 1;
    }

    /// Row counts per table; a table that cannot be counted reports `None`.
    #[instrument(level = "info", skip_all)]
    pub async fn verify(&self) -> Vec<(&'static str, Option<i64>)> {
        let mut counts = Vec::with_capacity(VERIFY_TABLES.len());
        for table in VERIFY_TABLES {
            let sql = format!("SELECT COUNT(*) AS count FROM {table}");
            let count = match self.sink.query(&sql).await {
                Ok(rows) => rows
                    .first()
                    .and_then(|r| r.get("count"))
                    .and_then(|v| v.as_i64()),
                Err(e) => {
                    warn!(table, error = %e, "Could not count rows");
                    None
                }
            };
            info!(table, count = ?count, "Verified table");
            counts.push((table, count));
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AbilityType, ChangeType, HeroAbility, HeroEsportsStats, HeroPatch};

    fn options() -> UploadOptions {
        UploadOptions {
            batch_size: 2,
            delay_between_batches: Duration::ZERO,
            statement_delay: Duration::ZERO,
            default_role: "Fighter".to_string(),
        }
    }

    fn hero(name: &str) -> ComprehensiveHeroData {
        let mut hero: ComprehensiveHeroData = serde_json::from_value(serde_json::json!({
            "basic_info": {"name": name, "role": "Unknown", "slug": name.to_lowercase()},
            "stats": {"level": 1, "hp": 2524.0, "regen_hp": "7.2"},
            "lore": {"background": "Elf archer", "quotes": ["For the moon!"]}
        }))
        .unwrap();
        hero.abilities = AbilityType::ORDER
            .iter()
            .map(|t| HeroAbility::new(*t, format!("{name} {t}"), "desc".to_string()))
            .collect();
        hero.patches.push(HeroPatch {
            patch_version: "1.8.32".to_string(),
            change_type: ChangeType::Buff,
            description: "Increased damage".to_string(),
            date: None,
            source_url: None,
        });
        hero.esports_stats.push(HeroEsportsStats {
            tournament: "MPL ID S12".to_string(),
            win_rate: Some(55.1),
            ..Default::default()
        });
        hero
    }

    async fn counts<S: SqlSink>(sink: &S) -> Vec<(&'static str, Option<i64>)> {
        Uploader::new(sink, options()).verify().await
    }

    /// Fails every statement containing `needle`, delegating the rest.
    struct FailingSink<'a> {
        inner: &'a SqliteSink,
        needle: &'static str,
    }

    impl SqlSink for FailingSink<'_> {
        async fn execute(&self, sql: &str) -> Result<(), SinkError> {
            if sql.contains(self.needle) {
                return Err(SinkError::Output("injected failure".to_string()));
            }
            self.inner.execute(sql).await
        }

        async fn query(&self, sql: &str) -> Result<Vec<sink::Row>, SinkError> {
            self.inner.query(sql).await
        }
    }

    #[tokio::test]
    async fn test_upload_twice_is_idempotent() {
        let sink = SqliteSink::in_memory().unwrap();
        let heroes = vec![hero("Miya"), hero("Chang'e"), hero("Layla")];
        let uploader = Uploader::new(&sink, options());

        uploader.upload_identities(&heroes).await;
        let first = uploader.upload_facets(&heroes).await.unwrap();
        let after_first = counts(&sink).await;

        uploader.upload_identities(&heroes).await;
        let second = uploader.upload_facets(&heroes).await.unwrap();
        let after_second = counts(&sink).await;

        assert_eq!(first, second);
        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second,
            vec![
                ("heroes", Some(3)),
                ("abilities", Some(12)),
                ("base_stats", Some(3)),
                ("lore", Some(3)),
                ("patches", Some(3)),
                ("esports_stats", Some(3)),
            ]
        );
        assert_eq!(first.abilities, 12);
        assert_eq!(first.failed, 0);

        let roles = sink.query("SELECT DISTINCT role FROM heroes").await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0]["role"], "Fighter");
    }

    #[tokio::test]
    async fn test_identity_ids_stay_stable() {
        let sink = SqliteSink::in_memory().unwrap();
        let uploader = Uploader::new(&sink, options());
        let heroes = vec![hero("Miya")];
        uploader.upload_identities(&heroes).await;
        let before = HeroIdMap::load(&sink).await.unwrap();
        uploader.upload_identities(&heroes).await;
        let after = HeroIdMap::load(&sink).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(after.get("MIYA"), before.get("Miya"));
    }

    #[tokio::test]
    async fn test_heroes_missing_from_snapshot_are_skipped() {
        let sink = SqliteSink::in_memory().unwrap();
        let uploader = Uploader::new(&sink, options());
        uploader.upload_identities(&[hero("Miya")]).await;

        let totals = uploader
            .upload_facets(&[hero("Miya"), hero("Layla")])
            .await
            .unwrap();

        assert_eq!(totals.heroes_processed, 1);
        assert_eq!(totals.heroes_skipped, 1);
        assert_eq!(totals.failed, 0);
        assert_eq!(counts(&sink).await[1], ("abilities", Some(4)));
    }

    #[tokio::test]
    async fn test_failed_rows_do_not_stop_siblings() {
        let inner = SqliteSink::in_memory().unwrap();
        Uploader::new(&inner, options())
            .upload_identities(&[hero("Miya"), hero("Layla")])
            .await;

        let failing = FailingSink {
            inner: &inner,
            needle: "'Skill2'",
        };
        let totals = Uploader::new(&failing, options())
            .upload_facets(&[hero("Miya"), hero("Layla")])
            .await
            .unwrap();

        assert_eq!(totals.failed, 2);
        assert_eq!(totals.abilities, 6);
        assert_eq!(totals.patches, 2);
        assert_eq!(totals.esports, 2);
        assert_eq!(totals.heroes_processed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_statements_are_spaced() {
        let sink = SqliteSink::in_memory().unwrap();
        let mut opts = options();
        opts.statement_delay = Duration::from_millis(100);
        let start = tokio::time::Instant::now();
        Uploader::new(&sink, opts)
            .upload_identities(&[hero("Miya"), hero("Layla"), hero("Nana")])
            .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300));
    }

    #[test]
    fn test_id_map_from_rows_normalizes_names() {
        let rows: Vec<sink::Row> = serde_json::from_value(serde_json::json!([
            {"id": 4, "name": "Yi Sun-shin"},
            {"id": "bad", "name": "Broken"}
        ]))
        .unwrap();
        let map = HeroIdMap::from_rows(&rows);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Yi_Sun-shin"), Some(4));
    }
}

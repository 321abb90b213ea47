//! Batch orchestration of a scrape run.
//!
//! `Discovering -> Loading-existing-progress -> Scraping(batch i) -> Saving
//! -> ... -> Finalized`. Batches run strictly one after another; inside a
//! batch every hero is scraped concurrently and the batch is joined before
//! its results are recorded and persisted. The run is saved after every
//! batch and never before the first, so a crash loses at most one batch.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fetch::FetchAsync;
use crate::models::{ScrapeRun, hero_key};
use crate::scrapers::discover::HeroDiscoverer;
use crate::scrapers::hero::HeroScraper;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Where a run's progress is persisted between batches.
pub trait RunStore {
    /// The previously persisted run, if any.
    async fn load(&self) -> Result<Option<ScrapeRun>>;
    /// Overwrite the persisted run with `run`.
    async fn save(&self, run: &ScrapeRun) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    pub max_heroes: usize,
    pub batch_size: usize,
    pub delay_between_batches: Duration,
    /// Drop heroes already present in the persisted run.
    pub skip_existing: bool,
}

impl ScrapeOptions {
    /// Settings for a `scrape` run.
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            max_heroes: config.max_heroes,
            batch_size: config.batch_size,
            delay_between_batches: Duration::from_millis(config.delay_between_batches_ms),
            skip_existing: true,
        }
    }

    /// Settings for a `continue` run: larger budget, smaller batches.
    pub fn resume(config: &PipelineConfig) -> Self {
        Self {
            max_heroes: config.resume_max_heroes,
            batch_size: config.resume_batch_size,
            delay_between_batches: Duration::from_millis(config.resume_delay_between_batches_ms),
            skip_existing: true,
        }
    }
}

/// Drives discovery, batched scraping and progress persistence.
pub struct BatchOrchestrator<'a, F, S> {
    discoverer: HeroDiscoverer<'a, F>,
    scraper: HeroScraper<'a, F>,
    store: &'a S,
}

impl<'a, F, S> BatchOrchestrator<'a, F, S>
where
    F: FetchAsync,
    S: RunStore,
{
    pub fn new(client: &'a F, base_url: &'a str, store: &'a S) -> Self {
        Self {
            discoverer: HeroDiscoverer::new(client, base_url),
            scraper: HeroScraper::new(client, base_url),
            store,
        }
    }

    /// Execute one run end to end and return the finalized run.
    ///
    /// Only persistence failures abort; a hero that cannot be scraped is
    /// recorded in the run's error list.
    #[instrument(level = "info", skip_all, fields(
        max_heroes = options.max_heroes,
        batch_size = options.batch_size,
        skip_existing = options.skip_existing
    ))]
    pub async fn run(&self, options: &ScrapeOptions) -> Result<ScrapeRun> {
        let started = std::time::Instant::now();

        let discovery = self.discoverer.discover().await;
        let Ok(discovered) = discovery.outcome;

        let mut run = ScrapeRun::new();
        if options.skip_existing {
            if let Some(previous) = self.store.load().await? {
                info!(existing = previous.heroes.len(), "Resuming from persisted run");
                run = resume_from(previous);
            }
        }

        let todo = pending_heroes(&discovered, &run, options.max_heroes);
        if todo.is_empty() {
            info!(
                discovered = discovered.len(),
                existing = run.heroes.len(),
                "All heroes already scraped; nothing to do"
            );
            return Ok(run);
        }

        let batch_size = options.batch_size.max(1);
        let batch_count = todo.len().div_ceil(batch_size);
        info!(
            discovered = discovered.len(),
            pending = todo.len(),
            batches = batch_count,
            "Starting scrape run"
        );

        for (index, batch) in todo.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            info!(batch = batch_no, of = batch_count, heroes = ?batch, "Scraping batch");

            let results: Vec<_> = stream::iter(batch.iter())
                .map(|hero_id| async move { (hero_id, self.scraper.scrape(hero_id).await) })
                .buffer_unordered(batch_size)
                .collect()
                .await;

            for (hero_id, result) in results {
                match result.outcome {
                    Ok(hero) => run.record_success(hero),
                    Err(e) => {
                        warn!(hero = %hero_id, url = %result.url, error = %e, "Hero scrape failed");
                        run.record_failure(hero_id.as_str(), e.to_string());
                    }
                }
            }

            self.store.save(&run).await?;
            info!(
                batch = batch_no,
                successful = run.successful,
                failed = run.failed,
                "Progress saved"
            );

            if batch_no < batch_count && !options.delay_between_batches.is_zero() {
                info!(
                    delay_ms = options.delay_between_batches.as_millis() as u64,
                    "Waiting before next batch"
                );
                tokio::time::sleep(options.delay_between_batches).await;
            }
        }

        info!(
            total = run.total_heroes,
            successful = run.successful,
            failed = run.failed,
            success_rate = %format!("{:.1}%", run.success_rate()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scrape run complete"
        );
        Ok(run)
    }
}

/// Carry the previous run's heroes forward; its failures are retried.
fn resume_from(previous: ScrapeRun) -> ScrapeRun {
    let successful = previous.heroes.len();
    ScrapeRun {
        timestamp: Utc::now(),
        total_heroes: successful,
        successful,
        failed: 0,
        heroes: previous.heroes,
        errors: Vec::new(),
    }
}

/// Discovered heroes not yet in `run`, compared by [`hero_key`], capped at
/// `max_heroes`. Only the first of several ids sharing a key is kept.
pub fn pending_heroes(discovered: &[String], run: &ScrapeRun, max_heroes: usize) -> Vec<String> {
    let mut seen: HashSet<String> = run
        .heroes
        .iter()
        .map(|h| hero_key(&h.basic_info.name))
        .collect();
    discovered
        .iter()
        .filter(|id| seen.insert(hero_key(id)))
        .take(max_heroes)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryFetch;
    use crate::fetch::tests::ScriptedFetch;
    use crate::models::{ComprehensiveHeroData, HeroBasicInfo};
    use std::cell::RefCell;

    const BASE: &str = "https://liquipedia.net/mobilelegends";

    #[derive(Default)]
    struct MemoryStore {
        run: RefCell<Option<ScrapeRun>>,
        saved_sizes: RefCell<Vec<usize>>,
    }

    impl RunStore for MemoryStore {
        async fn load(&self) -> Result<Option<ScrapeRun>> {
            Ok(self.run.borrow().clone())
        }

        async fn save(&self, run: &ScrapeRun) -> Result<()> {
            self.saved_sizes.borrow_mut().push(run.total_heroes);
            *self.run.borrow_mut() = Some(run.clone());
            Ok(())
        }
    }

    fn options(batch_size: usize, delay: Duration) -> ScrapeOptions {
        ScrapeOptions {
            max_heroes: 50,
            batch_size,
            delay_between_batches: delay,
            skip_existing: true,
        }
    }

    fn hero_url(id: &str) -> String {
        format!("{BASE}/{}", urlencoding::encode(id))
    }

    /// Category page listing `heroes`; every hero page answers with its name.
    fn site(heroes: &[&str]) -> ScriptedFetch {
        let fetch = ScriptedFetch::default();
        let links: String = heroes
            .iter()
            .map(|h| format!(r#"<a href="/mobilelegends/{h}">{}</a>"#, h.replace('_', " ")))
            .collect();
        let category = format!(r#"<div id="mw-pages">{links}</div>"#);
        fetch.push(&format!("{BASE}/Category:Heroes"), Ok(category.as_str()));
        for h in heroes {
            let page = format!("<h1>{}</h1>", h.replace('_', " "));
            fetch.push(&hero_url(h), Ok(page.as_str()));
        }
        fetch
    }

    fn scraped(name: &str) -> ComprehensiveHeroData {
        serde_json::from_value(serde_json::json!({
            "basic_info": {"name": name, "role": "Mage", "slug": name.to_lowercase()}
        }))
        .unwrap()
    }

    const TEN: [&str; 10] = [
        "Alucard", "Miya", "Eudora", "Tigreal", "Saber", "Alice", "Nana", "Fanny", "Layla",
        "Rafaela",
    ];

    #[tokio::test]
    async fn test_ten_heroes_batch_three_saves_four_times() {
        let fetch = site(&TEN);
        let store = MemoryStore::default();
        let run = BatchOrchestrator::new(&fetch, BASE, &store)
            .run(&options(3, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(*store.saved_sizes.borrow(), vec![3, 6, 9, 10]);
        assert_eq!(run.successful, 10);
        assert_eq!(run.failed, 0);
        assert!((run.success_rate() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_resume_skips_existing_case_insensitively() {
        let fetch = site(&["Miya", "Yi_Sun-shin", "Layla"]);
        let store = MemoryStore::default();
        let mut previous = ScrapeRun::new();
        previous.record_success(scraped("MIYA"));
        previous.record_success(scraped("Yi Sun-shin"));
        previous.record_failure("Layla", "HTTP 500");
        *store.run.borrow_mut() = Some(previous);

        let run = BatchOrchestrator::new(&fetch, BASE, &store)
            .run(&options(5, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(fetch.call_count(&hero_url("Miya")), 0);
        assert_eq!(fetch.call_count(&hero_url("Yi_Sun-shin")), 0);
        assert_eq!(fetch.call_count(&hero_url("Layla")), 1);
        assert_eq!(run.heroes.len(), 3);
        assert_eq!(run.successful, 3);
        assert_eq!(run.failed, 0);
        assert!(run.errors.is_empty());
    }

    #[tokio::test]
    async fn test_fresh_run_ignores_persisted_heroes() {
        let fetch = site(&["Miya", "Layla"]);
        let store = MemoryStore::default();
        let mut previous = ScrapeRun::new();
        previous.record_success(scraped("Miya"));
        *store.run.borrow_mut() = Some(previous);

        let mut opts = options(5, Duration::ZERO);
        opts.skip_existing = false;
        let run = BatchOrchestrator::new(&fetch, BASE, &store).run(&opts).await.unwrap();

        assert_eq!(fetch.call_count(&hero_url("Miya")), 1);
        assert_eq!(run.heroes.len(), 2);
    }

    #[tokio::test]
    async fn test_nothing_pending_does_not_save() {
        let fetch = site(&["Miya"]);
        let store = MemoryStore::default();
        let mut previous = ScrapeRun::new();
        previous.record_success(scraped("Miya"));
        *store.run.borrow_mut() = Some(previous);

        let run = BatchOrchestrator::new(&fetch, BASE, &store)
            .run(&options(5, Duration::ZERO))
            .await
            .unwrap();

        assert!(store.saved_sizes.borrow().is_empty());
        assert_eq!(run.successful, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_hero_fails_once_and_batch_continues() {
        let inner = ScriptedFetch::default();
        let links = r#"<div id="mw-pages">
            <a href="/mobilelegends/Miya">Miya</a>
            <a href="/mobilelegends/Layla">Layla</a>
            <a href="/mobilelegends/Tigreal">Tigreal</a></div>"#;
        inner.push(&format!("{BASE}/Category:Heroes"), Ok(links));
        inner.push(&hero_url("Miya"), Ok("<h1>Miya</h1>"));
        inner.push(&hero_url("Tigreal"), Ok("<h1>Tigreal</h1>"));
        for _ in 0..3 {
            inner.push(&hero_url("Layla"), Err(500));
        }
        let client = RetryFetch::new(inner, 3, Duration::ZERO);
        let store = MemoryStore::default();

        let run = BatchOrchestrator::new(&client, BASE, &store)
            .run(&options(3, Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(run.failed, 1);
        assert_eq!(run.successful, 2);
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].hero, "Layla");
        assert!(run.errors[0].error.contains("500"));
        assert_eq!(*store.saved_sizes.borrow(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_batches() {
        let fetch = site(&["Miya", "Layla", "Tigreal"]);
        let store = MemoryStore::default();
        let start = tokio::time::Instant::now();

        BatchOrchestrator::new(&fetch, BASE, &store)
            .run(&options(1, Duration::from_secs(10)))
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(20));
        assert!(elapsed < Duration::from_secs(21));
    }

    #[test]
    fn test_pending_heroes_caps_after_filtering() {
        let discovered: Vec<String> = ["Miya", "Layla", "Tigreal", "Saber"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut run = ScrapeRun::new();
        run.record_success(ComprehensiveHeroData {
            basic_info: HeroBasicInfo {
                name: "layla".to_string(),
                ..Default::default()
            },
            ..scraped("x")
        });
        assert_eq!(pending_heroes(&discovered, &run, 2), vec!["Miya", "Tigreal"]);
        assert_eq!(pending_heroes(&discovered, &run, 10).len(), 3);
    }

    #[test]
    fn test_pending_heroes_drop_key_variants() {
        let discovered: Vec<String> = ["Miya", "miya", "Yi_Sun-shin", "Yi Sun-shin", "Layla"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let run = ScrapeRun::new();
        assert_eq!(
            pending_heroes(&discovered, &run, 10),
            vec!["Miya", "Yi_Sun-shin", "Layla"]
        );
        assert_eq!(pending_heroes(&discovered, &run, 2), vec!["Miya", "Yi_Sun-shin"]);
    }
}

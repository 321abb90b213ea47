//! JSON persistence of scrape runs.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── heroes-data.json          # the whole run, re-written after every batch
//! └── individual-heroes/
//!     ├── miya.json             # one record per hero, named by slug
//!     └── yi-sun-shin.json
//! ```
//!
//! `heroes-data.json` is written to a sibling temp file and renamed into
//! place, so an interrupted save leaves the previous snapshot intact.

use crate::error::{PipelineError, Result};
use crate::models::ScrapeRun;
use crate::orchestrator::RunStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

pub const RUN_FILE: &str = "heroes-data.json";
pub const HEROES_DIR: &str = "individual-heroes";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PipelineError + '_ {
    move |source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn json_error(path: &Path) -> impl FnOnce(serde_json::Error) -> PipelineError + '_ {
    move |source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// [`RunStore`] backed by files under one output directory.
#[derive(Debug, Clone)]
pub struct JsonRunStore {
    dir: PathBuf,
}

impl JsonRunStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn run_path(&self) -> PathBuf {
        self.dir.join(RUN_FILE)
    }

    pub fn hero_path(&self, slug: &str) -> PathBuf {
        self.dir.join(HEROES_DIR).join(format!("{slug}.json"))
    }

    /// The persisted run; a missing file is [`PipelineError::NoScrapedData`].
    pub async fn load_required(&self) -> Result<ScrapeRun> {
        self.load()
            .await?
            .ok_or_else(|| PipelineError::NoScrapedData(self.run_path()))
    }
}

impl RunStore for JsonRunStore {
    #[instrument(level = "info", skip_all, fields(path = %self.run_path().display()))]
    async fn load(&self) -> Result<Option<ScrapeRun>> {
        let path = self.run_path();
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted run");
                return Ok(None);
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        let run: ScrapeRun = serde_json::from_str(&raw).map_err(json_error(&path))?;
        info!(heroes = run.heroes.len(), "Loaded persisted run");
        Ok(Some(run))
    }

    #[instrument(level = "info", skip_all, fields(dir = %self.dir.display(), heroes = run.heroes.len()))]
    async fn save(&self, run: &ScrapeRun) -> Result<()> {
        let heroes_dir = self.dir.join(HEROES_DIR);
        fs::create_dir_all(&heroes_dir)
            .await
            .map_err(io_error(&heroes_dir))?;

        let path = self.run_path();
        let json = serde_json::to_string_pretty(run).map_err(json_error(&path))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).await.map_err(io_error(&path))?;

        for hero in &run.heroes {
            let hero_path = self.hero_path(&hero.basic_info.slug);
            let json = serde_json::to_string_pretty(hero).map_err(json_error(&hero_path))?;
            fs::write(&hero_path, json).await.map_err(io_error(&hero_path))?;
        }

        info!(path = %path.display(), "Saved run");
        Ok(())
    }
}

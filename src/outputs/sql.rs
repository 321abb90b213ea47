//! Standalone SQL import script.
//!
//! `heroes-import.sql` can be fed to `wrangler d1 execute --file` or
//! `sqlite3` by hand. Identity upserts come first; every facet row then
//! finds its hero through a name subselect, so the script needs no id map.

use crate::error::{PipelineError, Result};
use crate::models::ScrapeRun;
use crate::upload::statements::{HeroRef, facet_statements, hero_identity};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const IMPORT_FILE: &str = "heroes-import.sql";

fn write_script(
    out: &mut String,
    run: &ScrapeRun,
    default_role: &str,
    generated_at: DateTime<Utc>,
) -> fmt::Result {
    writeln!(out, "-- MLBB hero data import")?;
    writeln!(out, "-- Generated: {}", generated_at.to_rfc3339())?;
    writeln!(out, "-- Scraped: {}", run.timestamp.to_rfc3339())?;
    writeln!(out, "-- Heroes: {}", run.heroes.len())?;

    writeln!(out, "\n-- Hero identities")?;
    for hero in &run.heroes {
        writeln!(out, "{}", hero_identity(&hero.basic_info, default_role))?;
    }

    for hero in &run.heroes {
        let statements = facet_statements(HeroRef::Name(&hero.basic_info.name), hero);
        if statements.is_empty() {
            continue;
        }
        writeln!(out, "\n-- {}", hero.basic_info.name)?;
        for statement in statements {
            writeln!(out, "{}", statement.sql)?;
        }
    }
    Ok(())
}

pub fn render_import_sql(run: &ScrapeRun, default_role: &str, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = write_script(&mut out, run, default_role, generated_at);
    out
}

/// Write `{dir}/heroes-import.sql` for `run`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), heroes = run.heroes.len()))]
pub async fn write_import_sql(dir: &Path, run: &ScrapeRun, default_role: &str) -> Result<PathBuf> {
    let script = render_import_sql(run, default_role, Utc::now());
    let path = dir.join(IMPORT_FILE);
    fs::write(&path, &script)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), bytes = script.len(), "Wrote SQL import script");
    Ok(path)
}

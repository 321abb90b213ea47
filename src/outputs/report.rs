//! Markdown summary of a persisted run.
//!
//! The report covers run freshness, success rate, how heroes spread over
//! roles and lanes, and how many records carry each optional facet.

use crate::error::{PipelineError, Result};
use crate::models::{ComprehensiveHeroData, ScrapeRun, success_rate};
use itertools::Itertools;
use std::fmt::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const REPORT_FILE: &str = "report.md";

/// `(label, count)` pairs, most frequent first, ties alphabetical.
fn distribution<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    labels
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

fn completeness_line(
    out: &mut String,
    label: &str,
    heroes: &[ComprehensiveHeroData],
    has: impl Fn(&ComprehensiveHeroData) -> bool,
) -> fmt::Result {
    let total = heroes.len();
    let with = heroes.iter().filter(|h| has(h)).count();
    let pct = if total == 0 {
        0.0
    } else {
        with as f64 / total as f64 * 100.0
    };
    writeln!(out, "- Heroes with {label}: {with}/{total} ({pct:.1}%)")
}

fn write_report(out: &mut String, run: &ScrapeRun) -> fmt::Result {
    writeln!(out, "# MLBB Hero Data Summary\n")?;
    writeln!(
        out,
        "- Last updated: {}",
        run.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "- Total heroes: {}", run.heroes.len())?;
    writeln!(
        out,
        "- Success rate: {:.1}%",
        success_rate(run.successful, run.failed)
    )?;

    writeln!(out, "\n## Heroes by Role\n")?;
    let roles = run.heroes.iter().map(|h| match h.basic_info.role.as_str() {
        "" => "Unknown",
        role => role,
    });
    for (role, count) in distribution(roles) {
        writeln!(out, "- {role}: {count}")?;
    }

    writeln!(out, "\n## Heroes by Lane\n")?;
    let lanes = run
        .heroes
        .iter()
        .map(|h| h.basic_info.lane.as_deref().filter(|l| !l.is_empty()).unwrap_or("Unknown"));
    for (lane, count) in distribution(lanes) {
        writeln!(out, "- {lane}: {count}")?;
    }

    writeln!(out, "\n## Data Completeness\n")?;
    completeness_line(out, "images", &run.heroes, |h| h.basic_info.image_url.is_some())?;
    completeness_line(out, "abilities", &run.heroes, |h| !h.abilities.is_empty())?;
    completeness_line(out, "lore", &run.heroes, |h| h.lore.background.is_some())?;
    completeness_line(out, "patch data", &run.heroes, |h| !h.patches.is_empty())?;

    if !run.errors.is_empty() {
        writeln!(out, "\n## Failed Heroes ({})\n", run.errors.len())?;
        for failure in &run.errors {
            writeln!(out, "- {}: {}", failure.hero, failure.error)?;
        }
    }
    Ok(())
}

/// Render the summary for `run` as Markdown.
pub fn render_report(run: &ScrapeRun) -> String {
    let mut out = String::new();
    // Writing into a String only fails if a Display impl does.
    let _ = write_report(&mut out, run);
    out
}

/// Write `{dir}/report.md` and return its path.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn save_report(dir: &Path, report: &str) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE);
    fs::write(&path, report)
        .await
        .map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), "Wrote report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(name: &str, role: &str, lane: Option<&str>) -> ComprehensiveHeroData {
        serde_json::from_value(serde_json::json!({
            "basic_info": {"name": name, "role": role, "lane": lane, "slug": name.to_lowercase()}
        }))
        .unwrap()
    }

    #[test]
    fn test_report_distributions_and_failures() {
        let mut run = ScrapeRun::new();
        run.record_success(hero("Miya", "Marksman", Some("Gold Lane")));
        run.record_success(hero("Layla", "Marksman", Some("Gold Lane")));
        run.record_success(hero("Tigreal", "Tank", None));
        let mut eudora = hero("Eudora", "Mage", Some("Mid Lane"));
        eudora.basic_info.image_url = Some("https://img/eudora.png".to_string());
        run.record_success(eudora);
        run.record_failure("Chang'e", "HTTP 500");

        let report = render_report(&run);
        assert!(report.contains("- Total heroes: 4"));
        assert!(report.contains("- Success rate: 80.0%"));

        let roles = report.split("## Heroes by Role").nth(1).unwrap();
        let marksman = roles.find("- Marksman: 2").unwrap();
        let mage = roles.find("- Mage: 1").unwrap();
        let tank = roles.find("- Tank: 1").unwrap();
        assert!(marksman < mage && mage < tank);

        assert!(report.contains("- Unknown: 1"));
        assert!(report.contains("- Heroes with images: 1/4 (25.0%)"));
        assert!(report.contains("## Failed Heroes (1)"));
        assert!(report.contains("- Chang'e: HTTP 500"));
    }

    #[test]
    fn test_empty_run_reports_zero_percent() {
        let report = render_report(&ScrapeRun::new());
        assert!(report.contains("- Success rate: 0.0%"));
        assert!(report.contains("- Heroes with abilities: 0/0 (0.0%)"));
        assert!(!report.contains("NaN"));
        assert!(!report.contains("Failed Heroes"));
    }

    #[tokio::test]
    async fn test_save_report_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report(dir.path(), "# report\n").await.unwrap();
        assert_eq!(path, dir.path().join(REPORT_FILE));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# report\n");
    }
}

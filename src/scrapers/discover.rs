//! Hero discovery from the Liquipedia `Category:Heroes` index.
//!
//! Links under `#mw-pages` whose path sits directly below the wiki's base
//! path are hero pages; namespaced pages (categories, templates, files) and
//! implausible labels are dropped. When nothing survives, because the page
//! layout changed, the request was blocked or the site is down, discovery
//! answers with a built-in list of known heroes instead.

use crate::extract::parse_selector;
use crate::fetch::FetchAsync;
use crate::models::ScrapeResult;
use itertools::Itertools;
use scraper::Html;
use std::convert::Infallible;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Heroes known at the time of writing, used when the index yields nothing.
pub const KNOWN_HEROES: &[&str] = &[
    "Alucard", "Miya", "Eudora", "Tigreal", "Saber", "Alice", "Nana", "Fanny", "Layla",
    "Rafaela", "Balmond", "Franco", "Bane", "Bruno", "Clint", "Kagura", "Chou", "Sun", "Alpha",
    "Ruby", "Yi_Sun-shin", "Moskov", "Johnson", "Cyclops", "Estes", "Hilda", "Aurora",
    "Lapu-Lapu", "Vexana", "Roger", "Karrie", "Harley", "Irithel", "Grock", "Argus", "Odette",
    "Lancelot", "Diggie", "Hylos", "Zhask", "Helcurt", "Pharsa", "Lesley", "Angela", "Gusion",
    "Valir", "Martis", "Uranus", "Hanabi", "Chang'e", "Kaja", "Selena", "Aldous", "Claude",
    "Vale", "Leomord", "Lunox", "Hanzo", "Belerick", "Kimmy", "Thamuz", "Harith", "Minsitthar",
    "Kadita", "Faramis", "Badang", "Khufra", "Granger", "Guinevere", "Esmeralda", "Terizla",
    "X.Borg", "Ling", "Wan_Wan", "Silvanna", "Cecilion", "Carmilla", "Atlas", "Popol_and_Kupa",
    "Yu_Zhong", "Luo_Yi", "Benedetta", "Yve", "Mathilda", "Paquito", "Gloo", "Phoveus",
    "Natan", "Aulus", "Aamon", "Floryn", "Valentina", "Edith", "Yin", "Melissa", "Xavier",
    "Julian", "Joy", "Fredrinn", "Novaria", "Ixia", "Nolan", "Arlott", "Zhuxin", "Chip",
    "Cici",
];

const EXCLUDED_NAMESPACES: &[&str] = &["Category", "Template", "File"];

/// Produces the ordered, deduplicated list of hero page identifiers.
#[derive(Debug)]
pub struct HeroDiscoverer<'a, F> {
    client: &'a F,
    base_url: &'a str,
}

impl<'a, F> HeroDiscoverer<'a, F>
where
    F: FetchAsync,
{
    pub fn new(client: &'a F, base_url: &'a str) -> Self {
        Self { client, base_url }
    }

    pub fn category_url(&self) -> String {
        format!("{}/Category:Heroes", self.base_url.trim_end_matches('/'))
    }

    /// Enumerate hero identifiers. Never fails; falls back to [`KNOWN_HEROES`].
    #[instrument(level = "info", skip_all, fields(base_url = %self.base_url))]
    pub async fn discover(&self) -> ScrapeResult<Vec<String>, Infallible> {
        let url = self.category_url();
        let mut heroes = match self.client.fetch(&url).await {
            Ok(body) => parse_category_page(&body, self.base_url),
            Err(e) => {
                warn!(%url, error = %e, "Hero index unavailable");
                Vec::new()
            }
        };

        if heroes.is_empty() {
            info!(count = KNOWN_HEROES.len(), "No heroes found on index page; using known heroes");
            heroes = fallback_heroes();
        }

        info!(count = heroes.len(), "Discovered heroes");
        ScrapeResult::new(url, Ok(heroes))
    }
}

pub fn fallback_heroes() -> Vec<String> {
    KNOWN_HEROES.iter().map(|h| h.to_string()).collect()
}

/// Extract hero identifiers from a category page.
pub fn parse_category_page(html: &str, base_url: &str) -> Vec<String> {
    let Some(link_selector) = parse_selector("#mw-pages a[href]") else {
        return Vec::new();
    };
    let (origin, prefix) = match Url::parse(base_url) {
        Ok(u) => (
            u.origin().ascii_serialization(),
            format!("{}/", u.path().trim_end_matches('/')),
        ),
        Err(_) => (String::new(), "/".to_string()),
    };

    let document = Html::parse_document(html);
    document
        .select(&link_selector)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let label = a.text().collect::<String>();
            let id = hero_id_from_href(href, &origin, &prefix)?;
            if is_plausible_hero(&id, label.trim()) {
                Some(id)
            } else {
                debug!(href, "Skipping non-hero link");
                None
            }
        })
        .unique()
        .collect()
}

fn hero_id_from_href(href: &str, origin: &str, prefix: &str) -> Option<String> {
    // Absolute (`https://host/..`) and protocol-relative (`//host/..`) links.
    let scheme_relative = origin.split_once(':').map_or("", |(_, rest)| rest);
    let path = if !origin.is_empty() {
        href.strip_prefix(origin)
            .or_else(|| href.strip_prefix(scheme_relative))
            .unwrap_or(href)
    } else {
        href
    };
    let raw = path.strip_prefix(prefix)?;
    let raw = raw.split(['#', '?']).next().unwrap_or_default();
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    urlencoding::decode(raw).ok().map(|s| s.into_owned())
}

fn is_plausible_hero(id: &str, label: &str) -> bool {
    let label_len = label.chars().count();
    !id.contains(':')
        && !EXCLUDED_NAMESPACES.iter().any(|ns| id.contains(ns))
        && label_len > 2
        && label_len < 30
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::ScriptedFetch;

    const BASE: &str = "https://liquipedia.net/mobilelegends";

    const CATEGORY_PAGE: &str = r#"
        <div id="mw-subcategories"><a href="/mobilelegends/Category:Mages">Mages</a></div>
        <div id="mw-pages">
            <a href="/mobilelegends/Miya">Miya</a>
            <a href="/mobilelegends/Yi_Sun-shin">Yi Sun-shin</a>
            <a href="/mobilelegends/Chang%27e">Chang'e</a>
            <a href="/mobilelegends/Miya#Abilities">Miya</a>
            <a href="/mobilelegends/Template:Hero">Template:Hero</a>
            <a href="/mobilelegends/Category:Heroes">Category:Heroes</a>
            <a href="/mobilelegends/File:Miya.png">File:Miya.png</a>
            <a href="/mobilelegends/Al">Al</a>
            <a href="/commons/Miya">Miya elsewhere</a>
            <a href="https://liquipedia.net/mobilelegends/Layla">Layla</a>
        </div>"#;

    #[test]
    fn test_parse_category_filters_and_dedupes() {
        let heroes = parse_category_page(CATEGORY_PAGE, BASE);
        assert_eq!(heroes, vec!["Miya", "Yi_Sun-shin", "Chang'e", "Layla"]);
    }

    #[test]
    fn test_parse_category_protocol_relative_links() {
        let page = r#"<div id="mw-pages">
            <a href="//liquipedia.net/mobilelegends/Tigreal">Tigreal</a>
            <a href="//liquipedia.net/commons/Tigreal">Tigreal elsewhere</a>
            <a href="//example.org/mobilelegends/Saber">Saber</a>
        </div>"#;
        assert_eq!(parse_category_page(page, BASE), vec!["Tigreal"]);
    }

    #[test]
    fn test_known_heroes_are_unique() {
        let unique = KNOWN_HEROES.iter().unique().count();
        assert_eq!(unique, KNOWN_HEROES.len());
        assert_eq!(KNOWN_HEROES.len(), 106);
    }

    #[tokio::test]
    async fn test_discover_uses_index_page() {
        let fetch = ScriptedFetch::default();
        fetch.push(&format!("{BASE}/Category:Heroes"), Ok(CATEGORY_PAGE));
        let result = HeroDiscoverer::new(&fetch, BASE).discover().await;
        assert!(result.is_success());
        assert_eq!(result.outcome.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_discover_falls_back_on_fetch_failure() {
        let fetch = ScriptedFetch::default();
        fetch.push(&format!("{BASE}/Category:Heroes"), Err(403));
        let result = HeroDiscoverer::new(&fetch, BASE).discover().await;
        let heroes = result.outcome.unwrap();
        assert_eq!(heroes.len(), KNOWN_HEROES.len());
        assert_eq!(heroes[0], "Alucard");
    }

    #[tokio::test]
    async fn test_discover_falls_back_on_empty_index() {
        let fetch = ScriptedFetch::default();
        fetch.push(&format!("{BASE}/Category:Heroes"), Ok("<html><body>moved</body></html>"));
        let heroes = HeroDiscoverer::new(&fetch, BASE).discover().await.outcome.unwrap();
        assert_eq!(heroes, fallback_heroes());
    }
}

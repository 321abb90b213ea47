//! Tolerant field extraction over parsed hero pages.
//!
//! Hero pages are not uniformly structured, so every lookup here is
//! best-effort: helpers return `Option`/`Vec` and never fail. The central
//! pattern is the ordered fallback ([`first_match_in`]): try each selector in
//! priority order and keep the first non-empty hit.
//!
//! MediaWiki pages mark sections with an anchor inside the heading
//! (`<h2><span id="Lore">Lore</span></h2>`), so a selector like `#Lore` hits
//! the heading, not the content. [`section_nodes`] expands such a hit into the
//! sibling nodes that make up the section body.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{CaseSensitivity, ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("number regex"));

static GROWTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*\(\+(\d+(?:\.\d+)?)\)").expect("growth regex")
});

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:→|->)\s*(\d+(?:\.\d+)?)").expect("range regex")
});

/// A stat cell such as `"2500 (+120)"`, `"100 → 200"` or `"260"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatValue {
    pub base: f64,
    pub growth: Option<f64>,
    pub max: Option<f64>,
}

/// Collapse all whitespace runs (newlines included) to single spaces and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First decimal number in `text`.
pub fn extract_number(text: &str) -> Option<f64> {
    NUMBER_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Recognize `"N (+G)"`, `"N → M"` (or `->`) and a bare number, in that order.
pub fn parse_stat_value(text: &str) -> Option<StatValue> {
    let num = |c: &regex::Captures, i| c.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

    if let Some(c) = GROWTH_RE.captures(text) {
        if let (Some(base), Some(growth)) = (num(&c, 1), num(&c, 2)) {
            return Some(StatValue {
                base,
                growth: Some(growth),
                max: None,
            });
        }
    }
    if let Some(c) = RANGE_RE.captures(text) {
        if let (Some(base), Some(max)) = (num(&c, 1), num(&c, 2)) {
            return Some(StatValue {
                base,
                growth: None,
                max: Some(max),
            });
        }
    }
    extract_number(text).map(|base| StatValue {
        base,
        growth: None,
        max: None,
    })
}

/// Expand protocol-relative, root-relative and bare-path URLs against `base`.
///
/// `base` is treated as a directory (`https://site/wiki` resolves `x.png` to
/// `https://site/wiki/x.png`). Unresolvable input is returned unchanged.
pub fn resolve_url(url: &str, base: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("//") {
        return format!("https://{rest}");
    }

    let Ok(mut base) = Url::parse(base) else {
        return url.to_string();
    };
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// URL-safe slug: lowercase, `[a-z0-9-]` only, single dashes between words.
pub fn create_slug(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();
    let dashed = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    let mut slug = String::with_capacity(dashed.len());
    for c in dashed.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// Parse a selector, logging and skipping invalid ones.
pub fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!(selector, error = %e, "Skipping invalid selector");
            None
        }
    }
}

/// Normalized text content of an element.
pub fn element_text(el: ElementRef) -> String {
    normalize_text(&el.text().collect::<Vec<_>>().join(" "))
}

/// Text nodes of an element, one per line, for `Label: value` scans.
pub fn element_lines(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ordered fallback over the whole document.
pub fn extract_first_match(doc: &Html, selectors: &[&str]) -> Option<String> {
    first_match_in(doc.root_element(), selectors)
}

/// Try each selector in order under `scope`; return the first non-empty
/// normalized text.
pub fn first_match_in(scope: ElementRef, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        scope
            .select(&selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// First element matched by any selector, trying selectors in order.
pub fn first_element<'a>(scope: ElementRef<'a>, selectors: &[&str]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        scope.select(&selector).next()
    })
}

/// Next sibling that is an element.
pub fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Elements matching `selector` among `nodes` and their descendants, in
/// document order, without duplicates.
pub fn select_within<'a>(nodes: &[ElementRef<'a>], selector: &Selector) -> Vec<ElementRef<'a>> {
    let mut found: Vec<ElementRef<'a>> = Vec::new();
    for node in nodes {
        if selector.matches(node) && !found.contains(node) {
            found.push(*node);
        }
        for hit in node.select(selector) {
            if !found.contains(&hit) {
                found.push(hit);
            }
        }
    }
    found
}

fn heading_level(el: ElementRef) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// MediaWiki 1.43+ wraps headings in `<div class="mw-heading">`.
pub fn is_heading_wrapper(el: ElementRef) -> bool {
    el.value()
        .has_class("mw-heading", CaseSensitivity::AsciiCaseInsensitive)
}

/// Level at which `el` starts a new section, if it does.
fn section_break_level(el: ElementRef) -> Option<u8> {
    heading_level(el).or_else(|| {
        if is_heading_wrapper(el) {
            el.children()
                .filter_map(ElementRef::wrap)
                .find_map(heading_level)
        } else {
            None
        }
    })
}

/// Body of the section `el` belongs to.
///
/// A heading (or an anchor directly inside one) expands to the following
/// siblings up to the next heading of the same or higher level. Any other
/// element is its own section.
pub fn section_nodes<'a>(el: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let heading = if heading_level(el).is_some() {
        Some(el)
    } else {
        el.parent()
            .and_then(ElementRef::wrap)
            .filter(|p| heading_level(*p).is_some())
    };
    let Some(heading) = heading else {
        return vec![el];
    };
    let level = heading_level(heading).unwrap_or(6);

    let anchor = heading
        .parent()
        .and_then(ElementRef::wrap)
        .filter(|p| is_heading_wrapper(*p))
        .unwrap_or(heading);

    anchor
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|sib| section_break_level(*sib).is_none_or(|l| l > level))
        .collect()
}

/// Normalized text of a whole section.
pub fn section_text(el: ElementRef) -> String {
    let text = section_nodes(el)
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Moonlight \n\n  Waltz\t "), "Moonlight Waltz");
        assert_eq!(normalize_text(" \n "), "");
    }

    #[test]
    fn test_extract_number() {
        assert_eq!(extract_number("Win rate: 54.3%"), Some(54.3));
        assert_eq!(extract_number("Cooldown 12s"), Some(12.0));
        assert_eq!(extract_number("none"), None);
    }

    #[test]
    fn test_parse_stat_value_growth() {
        let v = parse_stat_value("2500 (+120)").unwrap();
        assert_eq!(v.base, 2500.0);
        assert_eq!(v.growth, Some(120.0));
        assert_eq!(v.max, None);
    }

    #[test]
    fn test_parse_stat_value_range() {
        let v = parse_stat_value("100 → 200").unwrap();
        assert_eq!(v.base, 100.0);
        assert_eq!(v.max, Some(200.0));
        assert_eq!(v.growth, None);

        let ascii = parse_stat_value("1.5->2.25").unwrap();
        assert_eq!(ascii.max, Some(2.25));
    }

    #[test]
    fn test_parse_stat_value_bare_and_none() {
        assert_eq!(
            parse_stat_value("260"),
            Some(StatValue {
                base: 260.0,
                growth: None,
                max: None
            })
        );
        assert_eq!(parse_stat_value("N/A"), None);
        assert_eq!(parse_stat_value(""), None);
    }

    #[test]
    fn test_resolve_url_shapes() {
        let base = "https://liquipedia.net/mobilelegends";
        assert_eq!(
            resolve_url("https://cdn.test/a.png", base),
            "https://cdn.test/a.png"
        );
        assert_eq!(
            resolve_url("//liquipedia.net/commons/a.png", base),
            "https://liquipedia.net/commons/a.png"
        );
        assert_eq!(
            resolve_url("/commons/images/a.png", base),
            "https://liquipedia.net/commons/images/a.png"
        );
        assert_eq!(
            resolve_url("Miya.png", base),
            "https://liquipedia.net/mobilelegends/Miya.png"
        );
    }

    #[test]
    fn test_create_slug() {
        assert_eq!(create_slug("Yi Sun-shin"), "yi-sun-shin");
        assert_eq!(create_slug("Chang'e"), "change");
        assert_eq!(create_slug("X.Borg"), "xborg");
        assert_eq!(create_slug("Popol and  Kupa"), "popol-and-kupa");
        assert_eq!(create_slug("- Lapu -- Lapu -"), "lapu-lapu");
    }

    #[test]
    fn test_first_match_falls_through_empty_hits() {
        let doc = Html::parse_document(
            r#"<div class="hero-role">   </div><table class="infobox"><tr><td class="role">Mage</td></tr></table>"#,
        );
        let found = extract_first_match(&doc, &[".missing", ".hero-role", ".infobox .role"]);
        assert_eq!(found.as_deref(), Some("Mage"));
        assert_eq!(extract_first_match(&doc, &["[[invalid", ".nothing"]), None);
    }

    #[test]
    fn test_section_nodes_expand_mediawiki_heading() {
        let doc = Html::parse_document(
            r#"<div>
                <h2><span class="mw-headline" id="Lore">Lore</span></h2>
                <p>Born under the moon.</p>
                <h3>Early life</h3>
                <p>Trained as an archer.</p>
                <h2><span id="Trivia">Trivia</span></h2>
                <ul><li>Fact</li></ul>
            </div>"#,
        );
        let anchor = first_element(doc.root_element(), &["#Lore"]).unwrap();
        assert_eq!(
            section_text(anchor),
            "Born under the moon. Early life Trained as an archer."
        );
    }

    #[test]
    fn test_section_nodes_plain_element_is_own_section() {
        let doc = Html::parse_document(r#"<div class="lore"><p>Story</p></div><p>After</p>"#);
        let el = first_element(doc.root_element(), &[".lore"]).unwrap();
        assert_eq!(section_nodes(el).len(), 1);
        assert_eq!(section_text(el), "Story");
    }

    #[test]
    fn test_select_within_includes_roots_once() {
        let doc = Html::parse_document(r#"<ul class="a"><li>1</li><li>2</li></ul>"#);
        let ul = first_element(doc.root_element(), &["ul"]).unwrap();
        let li = Selector::parse("li, ul").unwrap();
        let hits = select_within(&[ul], &li);
        assert_eq!(hits.len(), 3);
    }
}

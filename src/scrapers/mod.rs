//! Liquipedia scrapers for Mobile Legends hero data.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Discovery**: enumerate hero page identifiers from the category index
//! 2. **Page scraping**: fetch each hero page and extract every facet from it
//!
//! | Phase | Module | Source page |
//! |-------|--------|-------------|
//! | Discovery | [`discover`] | `{base}/Category:Heroes` |
//! | Page scraping | [`hero`] | `{base}/{hero}` |
//!
//! Both take a [`FetchAsync`](crate::fetch::FetchAsync) client by reference,
//! so the rate limit and retry policy live in one place and tests substitute
//! a scripted fetcher. Parsing is synchronous; no parsed document is held
//! across an await.

pub mod discover;
pub mod hero;

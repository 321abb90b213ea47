//! HTTP API upload sink (`{api_url}/heroes`).
//!
//! The API accepts whole heroes with their abilities in one batch request;
//! it does not take stats, lore, patches or esports rows.

use super::sink::SinkError;
use super::statements::stored_role;
use crate::models::ComprehensiveHeroData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    action: &'static str,
    heroes: Vec<ApiHero<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ApiHero<'a> {
    pub name: &'a str,
    pub role: &'a str,
    pub image_url: &'a str,
    pub abilities: Vec<ApiAbility<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct ApiAbility<'a> {
    pub name: &'a str,
    /// Lowercase ability type (`"skill1"`).
    #[serde(rename = "type")]
    pub kind: String,
    pub description: &'a str,
    pub cooldown: Option<&'a str>,
    pub mana_cost: Option<&'a str>,
}

/// Batch response; every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUploadResponse {
    #[serde(default)]
    pub successful: Option<usize>,
    #[serde(default)]
    pub failed: Option<usize>,
    #[serde(default)]
    pub failed_heroes: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ApiTotals {
    pub successful: usize,
    pub failed: usize,
    pub failed_heroes: Vec<String>,
}

pub fn to_api_hero<'a>(hero: &'a ComprehensiveHeroData, default_role: &'a str) -> ApiHero<'a> {
    let info = &hero.basic_info;
    ApiHero {
        name: &info.name,
        role: stored_role(&info.role, default_role),
        image_url: info.image_url.as_deref().unwrap_or_default(),
        abilities: hero
            .abilities
            .iter()
            .map(|a| ApiAbility {
                name: &a.name,
                kind: a.ability_type.as_str().to_lowercase(),
                description: &a.description,
                cooldown: a.cooldown.as_deref(),
                mana_cost: a.mana_cost.as_deref(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    default_role: String,
}

impl ApiClient {
    pub fn new(base_url: &str, default_role: &str, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Api {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_role: default_role.to_string(),
        })
    }

    pub fn heroes_url(&self) -> String {
        format!("{}/heroes", self.base_url)
    }

    fn api_error(&self, reason: impl ToString) -> SinkError {
        SinkError::Api {
            url: self.heroes_url(),
            reason: reason.to_string(),
        }
    }

    /// GET the heroes endpoint; returns how many heroes it lists.
    #[instrument(level = "info", skip_all, fields(url = %self.heroes_url()))]
    pub async fn test_connection(&self) -> Result<usize, SinkError> {
        let resp = self
            .client
            .get(self.heroes_url())
            .send()
            .await
            .map_err(|e| self.api_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.api_error(format!("HTTP {status}: {body}")));
        }
        let body: Value = resp.json().await.map_err(|e| self.api_error(e))?;
        let count = match &body {
            Value::Array(items) => items.len(),
            other => other.get("length").and_then(Value::as_u64).unwrap_or(0) as usize,
        };
        info!(count, "API reachable");
        Ok(count)
    }

    /// POST one batch. Missing response counts fall back to "all succeeded".
    pub async fn upload_batch(&self, heroes: &[ComprehensiveHeroData]) -> Result<ApiTotals, SinkError> {
        let request = UploadRequest {
            action: "upload",
            heroes: heroes.iter().map(|h| to_api_hero(h, &self.default_role)).collect(),
        };
        let resp = self
            .client
            .post(self.heroes_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.api_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(self.api_error(format!("HTTP {status}: {body}")));
        }
        let parsed: ApiUploadResponse = resp.json().await.map_err(|e| self.api_error(e))?;
        Ok(ApiTotals {
            successful: parsed.successful.unwrap_or(heroes.len()),
            failed: parsed.failed.unwrap_or(0),
            failed_heroes: parsed.failed_heroes,
        })
    }

    /// Upload every hero in batches. A batch that fails as a whole counts
    /// all its heroes as failed; later batches still run.
    #[instrument(level = "info", skip_all, fields(heroes = heroes.len(), batch_size = batch_size))]
    pub async fn upload_all(
        &self,
        heroes: &[ComprehensiveHeroData],
        batch_size: usize,
        delay_between_batches: Duration,
    ) -> ApiTotals {
        let batch_size = batch_size.max(1);
        let batch_count = heroes.len().div_ceil(batch_size);
        let mut totals = ApiTotals::default();

        for (index, batch) in heroes.chunks(batch_size).enumerate() {
            let batch_no = index + 1;
            info!(batch = batch_no, of = batch_count, heroes = batch.len(), "Uploading batch");
            match self.upload_batch(batch).await {
                Ok(result) => {
                    info!(
                        batch = batch_no,
                        successful = result.successful,
                        failed = result.failed,
                        "Batch uploaded"
                    );
                    totals.successful += result.successful;
                    totals.failed += result.failed;
                    totals.failed_heroes.extend(result.failed_heroes);
                }
                Err(e) => {
                    error!(batch = batch_no, error = %e, "Batch upload failed");
                    totals.failed += batch.len();
                    totals
                        .failed_heroes
                        .extend(batch.iter().map(|h| h.basic_info.name.clone()));
                }
            }
            if batch_no < batch_count && !delay_between_batches.is_zero() {
                sleep(delay_between_batches).await;
            }
        }

        if totals.failed > 0 {
            warn!(failed = totals.failed, heroes = ?totals.failed_heroes, "Some heroes failed to upload");
        }
        totals
    }
}

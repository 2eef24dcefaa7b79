use crate::core::currency::{Currency, RateSnapshot, RateSource};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, instrument};

// Known layouts: {"rates": {...}}, {"conversion_rates": {...}}, {"usd": {...}}
const RATE_TABLE_KEYS: [&str; 3] = ["rates", "conversion_rates", "usd"];

/// A public USD-based exchange rate endpoint returning JSON.
pub struct ExchangeApiSource {
    url: String,
    client: reqwest::Client,
}

impl ExchangeApiSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("audioquote/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ExchangeApiSource {
            url: url.to_string(),
            client,
        })
    }
}

fn find_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Extracts the UAH and EUR rates from a response body. Keys match
/// case-insensitively, so both `UAH` and `uah` are accepted.
pub fn parse_rates(body: &Value) -> Result<RateSnapshot> {
    let root = body
        .as_object()
        .ok_or_else(|| anyhow!("Expected a JSON object"))?;
    let table = RATE_TABLE_KEYS
        .iter()
        .find_map(|key| find_key(root, key).and_then(Value::as_object))
        .ok_or_else(|| anyhow!("No rate table in response"))?;

    let rate = |currency: Currency| {
        find_key(table, currency.code())
            .and_then(Value::as_f64)
            .filter(|r| r.is_finite() && *r > 0.0)
    };
    let snapshot = RateSnapshot {
        uah: rate(Currency::Uah),
        eur: rate(Currency::Eur),
    };
    if snapshot.is_empty() {
        bail!("No usable UAH or EUR rate in response");
    }
    Ok(snapshot)
}

#[async_trait]
impl RateSource for ExchangeApiSource {
    fn name(&self) -> &str {
        &self.url
    }

    #[instrument(name = "ExchangeRateFetch", skip(self), fields(url = %self.url))]
    async fn fetch_rates(&self) -> Result<RateSnapshot> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, self.url))?;

        if !response.status().is_success() {
            bail!("HTTP error: {} for URL: {}", response.status(), self.url);
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", self.url, e))?;

        let snapshot = parse_rates(&body)?;
        debug!(uah = ?snapshot.uah, eur = ?snapshot.eur, "Parsed exchange rates");
        Ok(snapshot)
    }
}

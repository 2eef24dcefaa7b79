pub mod exchange_api;

use crate::core::config::RatesConfig;
use crate::core::currency::RateSource;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

/// Builds the ordered source list from the configured endpoints.
pub fn sources_from_config(config: &RatesConfig) -> Result<Vec<Arc<dyn RateSource>>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    config
        .endpoints
        .iter()
        .map(|url| {
            exchange_api::ExchangeApiSource::new(url, timeout)
                .map(|source| Arc::new(source) as Arc<dyn RateSource>)
        })
        .collect()
}

//! Secondary source: the JSON stock API
//!
//! Three independent endpoints are queried concurrently. A failing endpoint
//! only empties its own categories; the others still contribute. The API has
//! no weather data, so `weather` is always empty.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;

use super::loader::{classify_reqwest_error, random_user_agent};
use super::StockSource;
use crate::config::Config;
use crate::models::{Category, RawItem, RawStock, SourceKind};
use crate::utils::error::FetchError;

/// Endpoint URLs of the stock API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Returns `{"gear": [...], "seeds": [...]}`
    pub gear_seeds: String,
    /// Returns `{"egg": [...]}`
    pub egg: String,
    /// Returns `{"honey": [...]}`
    pub honey: String,
}

impl ApiEndpoints {
    /// Endpoints rooted at `base`, using the production paths
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            gear_seeds: format!("{base}/api/stock?type=gear-seeds"),
            egg: format!("{base}/api/stock?type=egg"),
            honey: format!("{base}/api/special-stock?type=honey"),
        }
    }

    /// Health-check keys paired with their URLs
    pub fn named(&self) -> [(&'static str, &str); 3] {
        [
            ("gear_seeds", self.gear_seeds.as_str()),
            ("egg", self.egg.as_str()),
            ("honey", self.honey.as_str()),
        ]
    }
}

impl From<&Config> for ApiEndpoints {
    fn from(config: &Config) -> Self {
        Self {
            gear_seeds: config.sources.gear_seeds_url.clone(),
            egg: config.sources.egg_url.clone(),
            honey: config.sources.honey_url.clone(),
        }
    }
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct GearSeedsPayload {
    #[serde(default, deserialize_with = "lenient_items")]
    gear: Vec<RawItem>,
    #[serde(default, deserialize_with = "lenient_items")]
    seeds: Vec<RawItem>,
}

#[derive(Debug, Default, Deserialize)]
struct EggPayload {
    #[serde(default, deserialize_with = "lenient_items")]
    egg: Vec<RawItem>,
}

#[derive(Debug, Default, Deserialize)]
struct HoneyPayload {
    #[serde(default, deserialize_with = "lenient_items")]
    honey: Vec<RawItem>,
}

/// A list of items; anything that is not an array reads as empty
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<RawItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(values) => values
            .into_iter()
            .map(|v| serde_json::from_value(v.clone()).unwrap_or(RawItem::Other(v)))
            .collect(),
        _ => Vec::new(),
    })
}

// ============================================================================
// Source
// ============================================================================

/// Client for the stock API
pub struct SecondarySource {
    client: Client,
    endpoints: ApiEndpoints,
    timeout: Duration,
    health_timeout: Duration,
}

impl SecondarySource {
    /// Create a source with 10s request and 5s health-check timeouts
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(endpoints: ApiEndpoints) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .gzip(true)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            timeout: Duration::from_secs(10),
            health_timeout: Duration::from_secs(5),
        })
    }

    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Ok(Self::new(ApiEndpoints::from(config))?
            .with_timeouts(config.timeouts.api(), config.timeouts.health()))
    }

    pub fn with_timeouts(mut self, timeout: Duration, health_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.health_timeout = health_timeout;
        self
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// GET and decode one endpoint
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(classify_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Fetch one endpoint, degrading to an empty payload
    async fn get_or_default<T: DeserializeOwned + Default>(&self, name: &str, url: &str) -> T {
        match self.get_json(url).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(endpoint = name, error = %e, "API endpoint failed, using empty data");
                T::default()
            }
        }
    }

    /// Probe each endpoint; healthy means HTTP 200 within the health timeout
    pub async fn check_health(&self) -> BTreeMap<String, bool> {
        let probes = self.endpoints.named().map(|(name, url)| async move {
            let healthy = match self
                .client
                .get(url)
                .timeout(self.health_timeout)
                .send()
                .await
            {
                Ok(response) => response.status() == reqwest::StatusCode::OK,
                Err(e) => {
                    tracing::debug!(endpoint = name, error = %e, "Health probe failed");
                    false
                }
            };
            (name.to_string(), healthy)
        });

        futures::future::join_all(probes).await.into_iter().collect()
    }
}

#[async_trait]
impl StockSource for SecondarySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Secondary
    }

    async fn fetch(&self) -> RawStock {
        let (gear_seeds, egg, honey) = futures::join!(
            self.get_or_default::<GearSeedsPayload>("gear_seeds", &self.endpoints.gear_seeds),
            self.get_or_default::<EggPayload>("egg", &self.endpoints.egg),
            self.get_or_default::<HoneyPayload>("honey", &self.endpoints.honey),
        );

        let mut stock = RawStock::empty();
        stock.set(Category::Seeds, gear_seeds.seeds);
        stock.set(Category::Gears, gear_seeds.gear);
        stock.set(Category::Eggs, egg.egg);
        stock.set(Category::EventShop, honey.honey);

        tracing::info!(items = stock.total_items(), "Secondary fetch complete");
        stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_with_base_url() {
        let endpoints = ApiEndpoints::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(
            endpoints.gear_seeds,
            "http://127.0.0.1:9000/api/stock?type=gear-seeds"
        );
        assert_eq!(endpoints.egg, "http://127.0.0.1:9000/api/stock?type=egg");
        assert_eq!(
            endpoints.honey,
            "http://127.0.0.1:9000/api/special-stock?type=honey"
        );
    }

    #[test]
    fn test_endpoints_from_default_config() {
        let endpoints = ApiEndpoints::from(&Config::default());
        assert_eq!(
            endpoints.gear_seeds,
            "https://growagardenstock.com/api/stock?type=gear-seeds"
        );
    }

    #[test]
    fn test_payload_tolerates_missing_and_malformed_lists() {
        let payload: GearSeedsPayload =
            serde_json::from_str(r#"{"seeds": ["Carrot", {"name": "Corn"}], "gear": null}"#)
                .unwrap();
        assert_eq!(payload.seeds.len(), 2);
        assert!(payload.gear.is_empty());

        let payload: EggPayload = serde_json::from_str(r#"{"egg": "none"}"#).unwrap();
        assert!(payload.egg.is_empty());

        let payload: HoneyPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.honey.is_empty());
    }
}

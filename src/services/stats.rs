//! Stats collector client
//!
//! This service talks to the statistics microservice over HTTP: it records
//! page-view hits and queries aggregated view counts. All calls are
//! best-effort from the caller's perspective and carry a short timeout.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::settings::StatsConfig;
use crate::utils::errors::{Result, StatsError, StatsResult};

/// URI prefix under which event pages are tracked
pub const EVENTS_ENDPOINT: &str = "/events";

/// Tracking URI of a single event page
pub fn event_uri(event_id: i64) -> String {
    format!("{EVENTS_ENDPOINT}/{event_id}")
}

/// Recover an event id from a tracking URI produced by [`event_uri`]
pub fn parse_event_uri(uri: &str) -> Option<i64> {
    uri.strip_prefix(EVENTS_ENDPOINT)
        .and_then(|rest| rest.strip_prefix('/'))
        .and_then(|id| id.parse().ok())
}

/// One recorded page view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointHit {
    pub app: String,
    pub uri: String,
    pub ip: String,
    #[serde(with = "stats_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Aggregated hit count for one (app, uri) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewStats {
    pub app: String,
    pub uri: String,
    pub hits: i64,
}

/// Wire format for stats timestamps: `yyyy-MM-dd HH:mm:ss`, UTC
pub mod stats_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        timestamp: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

/// HTTP client for the stats collector service
#[derive(Debug, Clone)]
pub struct StatsClient {
    client: Client,
    base_url: String,
    app_name: String,
}

impl StatsClient {
    /// Create a new StatsClient instance
    pub fn new(config: &StatsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("afisha/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            app_name: config.app_name.clone(),
        })
    }

    /// Record one page view
    pub async fn hit(&self, uri: &str, ip: &str) -> StatsResult<()> {
        let hit = EndpointHit {
            app: self.app_name.clone(),
            uri: uri.to_string(),
            ip: ip.to_string(),
            timestamp: Utc::now(),
        };

        debug!(uri = uri, ip = ip, "Recording hit");

        let response = self
            .client
            .post(format!("{}/hit", self.base_url))
            .json(&hit)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(StatsError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Query aggregated view counts over a time range.
    ///
    /// An empty `uris` slice queries all tracked URIs. With `unique` set,
    /// only distinct IPs are counted per (app, uri).
    pub async fn get_stats(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        uris: &[String],
        unique: bool,
    ) -> StatsResult<Vec<ViewStats>> {
        let mut query: Vec<(&str, String)> = vec![
            ("start", start.format(stats_timestamp::FORMAT).to_string()),
            ("end", end.format(stats_timestamp::FORMAT).to_string()),
            ("unique", unique.to_string()),
        ];
        for uri in uris {
            query.push(("uris", uri.clone()));
        }

        debug!(uri_count = uris.len(), unique = unique, "Querying view stats");

        let response = self
            .client
            .get(format!("{}/stats", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(StatsError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<Vec<ViewStats>>()
            .await
            .map_err(|e| StatsError::InvalidResponse(e.to_string()))
    }
}

fn map_transport_error(error: reqwest::Error) -> StatsError {
    if error.is_timeout() {
        StatsError::Timeout
    } else if error.is_connect() {
        StatsError::ServiceUnavailable
    } else {
        StatsError::RequestFailed(error.to_string())
    }
}

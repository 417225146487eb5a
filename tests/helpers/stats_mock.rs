//! Mock stats collector for testing
//!
//! A wiremock-backed stand-in for the statistics microservice, speaking the
//! same wire contract as the real collector.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use afisha::services::ViewStats;

/// Mock stats collector server
pub struct StatsMockServer {
    pub server: MockServer,
}

impl StatsMockServer {
    /// Start a fresh mock collector
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Accept hit recordings
    pub async fn mock_hit_ok(&self) {
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&self.server)
            .await;
    }

    /// Fail hit recordings with a server error
    pub async fn mock_hit_failure(&self) {
        Mock::given(method("POST"))
            .and(path("/hit"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    /// Serve the given aggregated stats for any query
    pub async fn mock_stats(&self, stats: Vec<ViewStats>) {
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(stats)))
            .mount(&self.server)
            .await;
    }

    /// Fail stats queries with a server error
    pub async fn mock_stats_error(&self) {
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&self.server)
            .await;
    }

    /// Serve stats after a delay, for timeout scenarios
    pub async fn mock_stats_delay(&self, stats: Vec<ViewStats>, delay_ms: u64) {
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!(stats))
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .mount(&self.server)
            .await;
    }
}

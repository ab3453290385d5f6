use serde::Deserialize;
use std::sync::Arc;

use crate::api::http::HttpClient;

/// Aggregate figures from `GET /stats/public`, shown as rotating social proof.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PublicStats {
    pub analyses_completed: u64,
    pub hours_saved_per_week: u64,
    pub avg_response_seconds: f64,
}

impl Default for PublicStats {
    /// Figures shown until (or unless) the stats endpoint answers.
    fn default() -> Self {
        Self {
            analyses_completed: 150,
            hours_saved_per_week: 400,
            avg_response_seconds: 3.0,
        }
    }
}

impl PublicStats {
    pub fn social_proof_lines(&self) -> Vec<String> {
        vec![
            format!("{}+ automation audits delivered", self.analyses_completed),
            format!("{}+ hours saved every week", self.hours_saved_per_week),
            format!("AI analysis in about {:.0} seconds", self.avg_response_seconds.max(1.0)),
        ]
    }
}

pub struct StatsClient {
    http: Arc<dyn HttpClient>,
    url: String,
}

impl StatsClient {
    pub fn new(http: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Never fails: anything but a parseable 2xx yields the built-in figures.
    pub async fn fetch(&self) -> PublicStats {
        let response = match self.http.get(&self.url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::debug!("Stats endpoint returned {}, using fallback figures", response.status);
                return PublicStats::default();
            }
            Err(e) => {
                tracing::debug!("Stats endpoint unreachable ({}), using fallback figures", e);
                return PublicStats::default();
            }
        };
        response.json::<PublicStats>().unwrap_or_else(|e| {
            tracing::debug!("Stats response unreadable ({}), using fallback figures", e);
            PublicStats::default()
        })
    }
}

/// Cycles through the social-proof lines.
#[derive(Debug, Clone)]
pub struct SocialProof {
    lines: Vec<String>,
    index: usize,
}

impl SocialProof {
    pub fn new(stats: &PublicStats) -> Self {
        Self {
            lines: stats.social_proof_lines(),
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.lines[self.index]
    }

    pub fn next_line(&mut self) -> &str {
        self.index = (self.index + 1) % self.lines.len();
        &self.lines[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::{HttpResponse, MockHttpClient};
    use crate::error::HttpError;

    fn client_with(result: Result<HttpResponse, HttpError>) -> StatsClient {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url| url.ends_with("/stats/public"))
            .times(1)
            .return_once(move |_| result);
        StatsClient::new(Arc::new(http), "http://api.test/stats/public")
    }

    #[tokio::test]
    async fn uses_server_figures_and_defaults_missing_ones() {
        let stats = client_with(Ok(HttpResponse::new(200, r#"{"analyses_completed": 321}"#)))
            .fetch()
            .await;
        assert_eq!(stats.analyses_completed, 321);
        assert_eq!(stats.hours_saved_per_week, PublicStats::default().hours_saved_per_week);
    }

    #[tokio::test]
    async fn falls_back_on_any_failure() {
        for result in [
            Ok(HttpResponse::new(503, "")),
            Ok(HttpResponse::new(200, "not json")),
            Err(HttpError::Transport("dns".into())),
        ] {
            assert_eq!(client_with(result).fetch().await, PublicStats::default());
        }
    }

    #[test]
    fn social_proof_rotates() {
        let mut proof = SocialProof::new(&PublicStats::default());
        let first = proof.current().to_string();
        assert_eq!(first, "150+ automation audits delivered");
        assert_eq!(proof.next_line(), "400+ hours saved every week");
        proof.next_line();
        assert_eq!(proof.next_line(), first);
    }
}

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::http::{HttpClient, HttpResponse, NetworkStatus};
use crate::error::{RejectionReason, SubmissionError};
use crate::models::contact_models::{
    ContactRequest, ContactResponse, ErrorBody, FormFields, SubmissionOutcome,
};

/// One attempt against the contact endpoint. Every failure comes back as a
/// `SubmissionOutcome`; nothing from the transport escapes.
pub struct SubmissionClient {
    http: Arc<dyn HttpClient>,
    network: Arc<dyn NetworkStatus>,
    contact_url: String,
}

impl SubmissionClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        network: Arc<dyn NetworkStatus>,
        contact_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            network,
            contact_url: contact_url.into(),
        }
    }

    pub async fn submit(&self, fields: &FormFields, cancel: &CancellationToken) -> SubmissionOutcome {
        if cancel.is_cancelled() {
            return SubmissionOutcome::TerminalFailure(SubmissionError::Timeout);
        }
        if !self.network.is_online() {
            tracing::warn!("Browser reports no connectivity, not sending contact request");
            return SubmissionOutcome::TerminalFailure(SubmissionError::Offline);
        }

        let body = match serde_json::to_value(ContactRequest::from(fields)) {
            Ok(body) => body,
            Err(e) => {
                return SubmissionOutcome::TerminalFailure(SubmissionError::Transport(format!(
                    "Failed to encode contact request: {}",
                    e
                )))
            }
        };

        tracing::debug!(
            "Posting contact form to {} (name {} chars, need {} chars)",
            self.contact_url,
            fields.name.chars().count(),
            fields.automation_need.chars().count()
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::warn!("Contact request to {} cancelled before a response arrived", self.contact_url);
                return SubmissionOutcome::TerminalFailure(SubmissionError::Timeout);
            }
            result = self.http.post_json(&self.contact_url, &body) => result,
        };

        match result {
            Ok(response) => classify_response(&response),
            Err(e) => {
                tracing::error!("Contact request failed: {}", e);
                SubmissionOutcome::failure(SubmissionError::Transport(e.to_string()))
            }
        }
    }
}

/// Turns a raw contact-endpoint response into an outcome.
pub fn classify_response(response: &HttpResponse) -> SubmissionOutcome {
    if response.is_success() {
        return match response.json::<ContactResponse>() {
            Ok(body) if body.success => SubmissionOutcome::Success(body),
            Ok(body) => {
                tracing::warn!(
                    "Backend answered {} without success: {:?}",
                    response.status,
                    body.message
                );
                SubmissionOutcome::failure(SubmissionError::Rejected {
                    message: body.message,
                })
            }
            Err(e) => {
                tracing::error!("Failed to parse contact response: {}", e);
                SubmissionOutcome::failure(SubmissionError::Decode(e.to_string()))
            }
        };
    }

    let detail = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|body| body.detail_text());
    let error = match response.status {
        500 => SubmissionError::Server { status: 500 },
        400 => SubmissionError::ClientRejection {
            reason: RejectionReason::classify(detail.as_deref()),
            detail,
        },
        429 => SubmissionError::RateLimited,
        status => SubmissionError::Http { status, detail },
    };
    tracing::warn!("Contact endpoint returned {}: {}", response.status, error);
    SubmissionOutcome::failure(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::{MockHttpClient, MockNetworkStatus};
    use crate::models::contact_models::FlexibleValue;
    use crate::error::HttpError;
    use async_trait::async_trait;
    use serde_json::json;

    fn fields() -> FormFields {
        FormFields {
            name: "Sarah Johnson".into(),
            email: "sarah@company.com".into(),
            automation_need: "Leads from ads have to be typed into the CRM".into(),
            honeypot: String::new(),
        }
    }

    fn online() -> Arc<MockNetworkStatus> {
        let mut network = MockNetworkStatus::new();
        network.expect_is_online().return_const(true);
        Arc::new(network)
    }

    fn client_returning(status: u16, body: serde_json::Value) -> SubmissionClient {
        let mut http = MockHttpClient::new();
        http.expect_post_json()
            .times(1)
            .returning(move |_, _| Ok(HttpResponse::new(status, body.to_string())));
        SubmissionClient::new(Arc::new(http), online(), "http://api.test/contact")
    }

    struct NeverResponds;

    #[async_trait]
    impl HttpClient for NeverResponds {
        async fn get(&self, _url: &str) -> Result<HttpResponse, HttpError> {
            futures::future::pending().await
        }

        async fn post_json(&self, _url: &str, _body: &serde_json::Value) -> Result<HttpResponse, HttpError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn sends_expected_body_and_parses_success() {
        let mut http = MockHttpClient::new();
        http.expect_post_json()
            .withf(|url, body| {
                url.ends_with("/contact")
                    && body["need"] == "Leads from ads have to be typed into the CRM"
                    && body["honeypot"] == ""
            })
            .times(1)
            .returning(|_, _| {
                Ok(HttpResponse::new(
                    200,
                    json!({"success": true, "lead_id": "lead-7", "analysis": {"complexity": "Low"}})
                        .to_string(),
                ))
            });
        let client = SubmissionClient::new(Arc::new(http), online(), "http://api.test/contact");

        match client.submit(&fields(), &CancellationToken::new()).await {
            SubmissionOutcome::Success(body) => {
                assert_eq!(body.lead_id().as_deref(), Some("lead-7"));
                assert_eq!(
                    body.analysis.unwrap().complexity,
                    Some(FlexibleValue::Text("Low".into()))
                );
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn offline_short_circuits_without_request() {
        let mut network = MockNetworkStatus::new();
        network.expect_is_online().return_const(false);
        let mut http = MockHttpClient::new();
        http.expect_post_json().never();
        let client = SubmissionClient::new(Arc::new(http), Arc::new(network), "http://api.test/contact");

        assert_eq!(
            client.submit(&fields(), &CancellationToken::new()).await,
            SubmissionOutcome::TerminalFailure(SubmissionError::Offline)
        );
    }

    #[tokio::test]
    async fn classifies_error_statuses() {
        let outcome = client_returning(500, json!({"detail": "boom"}))
            .submit(&fields(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            SubmissionOutcome::RetryableFailure(SubmissionError::Server { status: 500 })
        );

        let outcome = client_returning(400, json!({"detail": "Disposable email not allowed"}))
            .submit(&fields(), &CancellationToken::new())
            .await;
        assert!(matches!(
            outcome,
            SubmissionOutcome::TerminalFailure(SubmissionError::ClientRejection {
                reason: RejectionReason::DisposableEmail,
                ..
            })
        ));

        let outcome = client_returning(429, json!({}))
            .submit(&fields(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            SubmissionOutcome::TerminalFailure(SubmissionError::RateLimited)
        );

        let outcome = client_returning(503, json!({"detail": "maintenance"}))
            .submit(&fields(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            SubmissionOutcome::RetryableFailure(SubmissionError::Http {
                status: 503,
                detail: Some("maintenance".into())
            })
        );
    }

    #[tokio::test]
    async fn falsy_success_uses_backend_message() {
        let outcome = client_returning(200, json!({"success": false, "message": "Try later"}))
            .submit(&fields(), &CancellationToken::new())
            .await;
        assert_eq!(
            outcome,
            SubmissionOutcome::RetryableFailure(SubmissionError::Rejected {
                message: Some("Try later".into())
            })
        );
    }

    #[test]
    fn non_json_error_body_still_classifies() {
        let response = HttpResponse::new(400, "<html>Bad Request</html>");
        assert_eq!(
            classify_response(&response),
            SubmissionOutcome::TerminalFailure(SubmissionError::ClientRejection {
                reason: RejectionReason::Other,
                detail: None
            })
        );
    }

    #[tokio::test]
    async fn cancellation_resolves_pending_request_as_timeout() {
        let client = SubmissionClient::new(Arc::new(NeverResponds), online(), "http://api.test/contact");
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        assert_eq!(
            client.submit(&fields(), &cancel).await,
            SubmissionOutcome::TerminalFailure(SubmissionError::Timeout)
        );
    }
}

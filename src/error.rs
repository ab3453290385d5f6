use thiserror::Error;

/// Why the backend refused a submission with HTTP 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Honeypot tripped or the payload was otherwise marked invalid.
    InvalidSubmission,
    DisposableEmail,
    InappropriateContent,
    Other,
}

impl RejectionReason {
    /// Maps the backend `detail` text onto a known rejection.
    pub fn classify(detail: Option<&str>) -> Self {
        let Some(detail) = detail else {
            return RejectionReason::Other;
        };
        if detail.contains("honeypot") || detail.contains("Invalid submission") {
            RejectionReason::InvalidSubmission
        } else if detail.contains("Disposable email") {
            RejectionReason::DisposableEmail
        } else if detail.contains("inappropriate content") {
            RejectionReason::InappropriateContent
        } else {
            RejectionReason::Other
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("No network connection")]
    Offline,
    #[error("Request timed out")]
    Timeout,
    #[error("Submission rejected: {}", detail.as_deref().unwrap_or("no detail"))]
    ClientRejection {
        reason: RejectionReason,
        detail: Option<String>,
    },
    #[error("Rate limited by backend")]
    RateLimited,
    #[error("Server error ({status})")]
    Server { status: u16 },
    #[error("Unexpected status {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },
    #[error("Backend declined submission: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl SubmissionError {
    /// Whether another attempt may change the result.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SubmissionError::Offline
                | SubmissionError::Timeout
                | SubmissionError::ClientRejection { .. }
                | SubmissionError::RateLimited
        )
    }

    /// Text shown to the visitor next to the manual retry and e-mail actions.
    pub fn user_message(&self, fallback_email: &str) -> String {
        match self {
            SubmissionError::Offline => {
                "No internet connection. Please check your connection and try again.".to_string()
            }
            SubmissionError::Timeout => "Request timed out after 30 seconds. Your submission may have been saved. \
                 Please check your email or try again."
                .to_string(),
            SubmissionError::ClientRejection { reason, detail } => match reason {
                RejectionReason::InvalidSubmission => {
                    "Invalid submission. Please refresh the page and try again.".to_string()
                }
                RejectionReason::DisposableEmail => {
                    "Please use a permanent email address. Disposable email addresses are not accepted."
                        .to_string()
                }
                RejectionReason::InappropriateContent => {
                    "Your message was flagged by our spam filter. Please rephrase and try again."
                        .to_string()
                }
                RejectionReason::Other => detail
                    .clone()
                    .unwrap_or_else(|| "Invalid form data. Please check your inputs.".to_string()),
            },
            SubmissionError::RateLimited => {
                "Too many requests. Please wait an hour and try again.".to_string()
            }
            SubmissionError::Server { .. } => format!(
                "Server error. We may have saved your information. Check your email or contact {}",
                fallback_email
            ),
            SubmissionError::Http { detail, .. } => detail
                .clone()
                .unwrap_or_else(|| "Failed to submit form".to_string()),
            SubmissionError::Rejected { message } => message
                .clone()
                .unwrap_or_else(|| "Failed to submit form".to_string()),
            SubmissionError::Transport(_) | SubmissionError::Decode(_) => format!(
                "Something went wrong. Please try again or email {} directly.",
                fallback_email
            ),
        }
    }
}

/// Failure reported by an `HttpClient` implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WidgetError {
    #[error("Failed to mount scheduling widget on {selector}: {reason}")]
    Mount { selector: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

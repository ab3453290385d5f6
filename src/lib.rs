pub mod api {
    pub mod http;
    pub mod contact_client;
    pub mod retry;
    pub mod stats;
}
pub mod models {
    pub mod contact_models;
}
pub mod utils {
    pub mod validation;
    pub mod mailto;
}
pub mod widget {
    pub mod provider;
    pub mod bridge;
}
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use config::{IntakeConfig, RetryPolicy};
pub use error::SubmissionError;
pub use models::contact_models::{Analysis, ContactResponse, Field, FormFields, SubmissionOutcome};
pub use orchestrator::{Capabilities, FormOrchestrator, Session, SessionState, SubmitDecision};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::contact_client::SubmissionClient;
use crate::api::http::Clock;
use crate::config::RetryPolicy;
use crate::error::SubmissionError;
use crate::models::contact_models::{FormFields, SubmissionOutcome};

/// Reported to the caller while a submission is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryProgress {
    /// Attempt `n` (1-based) is about to be sent.
    Attempt(u32),
    /// The operation has outlived `slow_after`.
    Slow,
}

/// Bounded retry around `SubmissionClient`, with a slow marker and a hard
/// abort measured from the start of the whole operation.
pub struct RetryController {
    client: SubmissionClient,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    attempt: AtomicU32,
}

impl RetryController {
    pub fn new(client: SubmissionClient, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            client,
            clock,
            policy,
            attempt: AtomicU32::new(0),
        }
    }

    /// Attempt index of the current or last run; 0 before the first run.
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Never returns `RetryableFailure`: once attempts run out the last failure becomes terminal.
    pub async fn run<F>(&self, fields: &FormFields, on_progress: F) -> SubmissionOutcome
    where
        F: Fn(RetryProgress) + Send + Sync,
    {
        self.attempt.store(0, Ordering::SeqCst);
        let cancel = CancellationToken::new();

        // Both timers live only inside this scope, so every exit drops them.
        let mut slow_timer = self.clock.sleep(self.policy.slow_after);
        let mut abort_timer = self.clock.sleep(self.policy.abort_after);
        let attempts = self.attempt_loop(fields, &cancel, &on_progress);
        tokio::pin!(attempts);

        let mut slow_pending = true;
        loop {
            tokio::select! {
                biased;
                outcome = &mut attempts => return outcome,
                _ = &mut abort_timer => {
                    tracing::warn!(
                        "Contact submission aborted after {:?} (attempt {})",
                        self.policy.abort_after,
                        self.attempt()
                    );
                    cancel.cancel();
                    return SubmissionOutcome::TerminalFailure(SubmissionError::Timeout);
                }
                _ = &mut slow_timer, if slow_pending => {
                    slow_pending = false;
                    tracing::info!(
                        "Contact submission still running after {:?}",
                        self.policy.slow_after
                    );
                    on_progress(RetryProgress::Slow);
                }
            }
        }
    }

    async fn attempt_loop<F>(
        &self,
        fields: &FormFields,
        cancel: &CancellationToken,
        on_progress: &F,
    ) -> SubmissionOutcome
    where
        F: Fn(RetryProgress) + Send + Sync,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            self.attempt.store(attempt, Ordering::SeqCst);
            on_progress(RetryProgress::Attempt(attempt));
            tracing::info!("Submitting contact form (attempt {}/{})", attempt, max_attempts);

            match self.client.submit(fields, cancel).await {
                SubmissionOutcome::RetryableFailure(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "Contact submission attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        self.policy.backoff
                    );
                    self.clock.sleep(self.policy.backoff).await;
                }
                SubmissionOutcome::RetryableFailure(e) => {
                    tracing::error!(
                        "Contact submission failed after {} attempts: {}",
                        attempt,
                        e
                    );
                    return SubmissionOutcome::TerminalFailure(e);
                }
                outcome => return outcome,
            }
        }
    }
}

use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::api::contact_client::SubmissionClient;
use crate::api::http::{Clock, HttpClient, NetworkStatus};
use crate::api::retry::{RetryController, RetryProgress};
use crate::config::IntakeConfig;
use crate::error::WidgetError;
use crate::models::contact_models::{ContactResponse, Field, FormFields, SubmissionOutcome};
use crate::utils::mailto::{self, MailtoKind};
use crate::utils::validation::{self, FieldErrors, NeedLengthHint, TouchedSet};
use crate::widget::bridge::{BookingWidgetBridge, BridgeSettings};
use crate::widget::provider::{Analytics, BookingDetail, BookingEvent, WidgetMount, WidgetProvider};

/// Where the contact flow currently is. Exactly one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting { attempt: u32, is_slow: bool },
    Result { payload: ContactResponse },
    Scheduling { widget_ready: bool },
    Confirmed { booking_detail: BookingDetail },
}

impl SessionState {
    /// Overlay text while submitting: (headline, detail).
    pub fn status_line(&self) -> Option<(String, &'static str)> {
        match self {
            SessionState::Submitting { attempt, is_slow } => {
                let headline = if *attempt > 1 {
                    format!("Retrying (attempt {})...", attempt)
                } else {
                    "Analyzing with AI...".to_string()
                };
                let detail = if *is_slow {
                    "Taking longer than usual. Still processing..."
                } else {
                    "This usually takes 3-5 seconds"
                };
                Some((headline, detail))
            }
            _ => None,
        }
    }
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: SessionState,
    pub fields: FormFields,
    pub errors: FieldErrors,
    pub touched: TouchedSet,
    /// Terminal submission failure shown with the retry and e-mail actions.
    pub error: Option<String>,
    /// First invalid field after a rejected submit.
    pub focus: Option<Field>,
    /// Last successful analysis; its lead id travels with a booking.
    pub analysis: Option<ContactResponse>,
}

impl Session {
    /// Message to show under a field: only once the field was touched.
    pub fn visible_error(&self, field: Field) -> Option<&str> {
        if self.touched.contains(field) {
            self.errors.get(field)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    /// A submission is already running; this one was dropped.
    AlreadySubmitting,
    /// The form is not on screen (result, scheduling or confirmation showing).
    NotAcceptingInput,
    Invalid { focus: Field },
    Succeeded,
    Failed { message: String },
}

/// Host capabilities the orchestrator runs on.
pub struct Capabilities {
    pub http: Arc<dyn HttpClient>,
    pub network: Arc<dyn NetworkStatus>,
    pub clock: Arc<dyn Clock>,
    pub widget: Arc<dyn WidgetProvider>,
    pub analytics: Option<Arc<dyn Analytics>>,
}

struct Inner {
    session: Mutex<Session>,
    retry: RetryController,
    bridge: tokio::sync::Mutex<BookingWidgetBridge>,
    scheduling: Mutex<Option<CancellationToken>>,
    fallback_email: String,
}

/// Contact flow state machine: form, AI analysis, scheduling, confirmation.
/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct FormOrchestrator {
    inner: Arc<Inner>,
}

impl FormOrchestrator {
    pub fn new(config: &IntakeConfig, caps: Capabilities) -> Self {
        let client = SubmissionClient::new(caps.http.clone(), caps.network, config.contact_url());
        let retry = RetryController::new(client, caps.clock.clone(), config.retry);
        let bridge = BookingWidgetBridge::new(
            caps.widget,
            caps.analytics,
            caps.http,
            caps.clock,
            BridgeSettings {
                mount: WidgetMount::inline(
                    &config.widget_namespace,
                    &config.widget_selector,
                    &config.calendar_link,
                ),
                booking_url: config.booking_url(),
                analytics_label: config.analytics_label.clone(),
                ready_timeout: config.widget_ready_timeout,
            },
        );

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session::default()),
                retry,
                bridge: tokio::sync::Mutex::new(bridge),
                scheduling: Mutex::new(None),
                fallback_email: config.fallback_email.clone(),
            }),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        lock(&self.inner.session)
    }

    pub fn snapshot(&self) -> Session {
        self.session().clone()
    }

    pub fn state(&self) -> SessionState {
        self.session().state.clone()
    }

    /// Field the view should focus after a rejected submit.
    pub fn focus_target(&self) -> Option<Field> {
        self.session().focus
    }

    /// Keystroke in a field. Revalidates only fields the visitor already left.
    pub fn change_field(&self, field: Field, value: impl Into<String>) {
        let mut session = self.session();
        if session.state != SessionState::Idle {
            return;
        }
        session.fields.set(field, value);
        if session.touched.contains(field) {
            let message = validation::validate(field, session.fields.get(field));
            session.errors.set(field, message);
        }
    }

    pub fn blur_field(&self, field: Field) {
        let mut session = self.session();
        if session.state != SessionState::Idle {
            return;
        }
        session.touched.touch(field);
        let message = validation::validate(field, session.fields.get(field));
        session.errors.set(field, message);
    }

    pub fn set_honeypot(&self, value: impl Into<String>) {
        let mut session = self.session();
        if session.state == SessionState::Idle {
            session.fields.honeypot = value.into();
        }
    }

    pub fn need_length_hint(&self) -> NeedLengthHint {
        validation::need_length_hint(&self.session().fields.automation_need)
    }

    pub fn mail_fallback_link(&self, kind: MailtoKind) -> String {
        mailto::fallback_link(&self.inner.fallback_email, &self.session().fields, kind)
    }

    /// "Try Again": hides the failure message, keeps what was typed.
    pub fn dismiss_error(&self) {
        self.session().error = None;
    }

    /// Validates and submits. A second call while one is in flight returns
    /// `AlreadySubmitting` immediately. Dropping the future part-way puts the
    /// form back to `Idle` with the fields kept.
    pub async fn submit(&self) -> SubmitDecision {
        let fields = {
            let mut session = self.session();
            match session.state {
                SessionState::Idle => {}
                SessionState::Submitting { .. } => {
                    tracing::debug!("Ignoring submit while a submission is in flight");
                    return SubmitDecision::AlreadySubmitting;
                }
                _ => return SubmitDecision::NotAcceptingInput,
            }

            session.touched.touch_all();
            session.errors = FieldErrors::validate_all(&session.fields);
            if let Some(focus) = session.errors.first_invalid() {
                session.focus = Some(focus);
                return SubmitDecision::Invalid { focus };
            }

            session.focus = None;
            session.error = None;
            session.state = SessionState::Submitting {
                attempt: 1,
                is_slow: false,
            };
            session.fields.clone()
        };
        let mut in_flight = InFlight {
            session: &self.inner.session,
            armed: true,
        };

        let outcome = self
            .inner
            .retry
            .run(&fields, |progress| {
                let mut session = lock(&self.inner.session);
                if let SessionState::Submitting { attempt, is_slow } = &mut session.state {
                    match progress {
                        RetryProgress::Attempt(n) => *attempt = n,
                        RetryProgress::Slow => *is_slow = true,
                    }
                }
            })
            .await;

        in_flight.armed = false;
        let mut session = self.session();
        match outcome {
            SubmissionOutcome::Success(payload) => {
                tracing::info!("Contact submission succeeded (lead {:?})", payload.lead_id());
                session.fields = FormFields::default();
                session.errors.clear();
                session.touched.clear();
                session.analysis = Some(payload.clone());
                session.state = SessionState::Result { payload };
                SubmitDecision::Succeeded
            }
            SubmissionOutcome::TerminalFailure(e) | SubmissionOutcome::RetryableFailure(e) => {
                let message = e.user_message(&self.inner.fallback_email);
                session.error = Some(message.clone());
                session.state = SessionState::Idle;
                SubmitDecision::Failed { message }
            }
        }
    }

    /// Opens the scheduler, from an analysis result or directly from the form.
    /// `Ok(false)` means the widget never became ready and the view stays in
    /// its loading state.
    pub async fn request_booking(&self) -> Result<bool, WidgetError> {
        let token = {
            let mut session = self.session();
            match session.state {
                SessionState::Result { .. } | SessionState::Idle => {}
                _ => return Ok(false),
            }
            session.state = SessionState::Scheduling {
                widget_ready: false,
            };
            let token = CancellationToken::new();
            if let Some(previous) = lock(&self.inner.scheduling).replace(token.clone()) {
                previous.cancel();
            }
            token
        };

        let mut bridge = self.inner.bridge.lock().await;
        if token.is_cancelled() {
            return Ok(false);
        }
        let ready = bridge.activate(&token).await?;

        let mut session = self.session();
        match &mut session.state {
            SessionState::Scheduling { widget_ready } if !token.is_cancelled() => {
                *widget_ready = ready;
                Ok(ready)
            }
            _ => {
                // Closed while the widget was loading.
                bridge.teardown();
                Ok(false)
            }
        }
    }

    /// Waits for the widget to report a booking and applies it. `None` when
    /// scheduling is closed first or the widget is gone.
    pub async fn await_booking(&self) -> Option<BookingDetail> {
        let token = lock(&self.inner.scheduling).clone()?;
        let mut bridge = self.inner.bridge.lock().await;

        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => return None,
                event = bridge.next_event() => event,
            };

            match event? {
                BookingEvent::Ready => tracing::debug!("Scheduling widget reported ready"),
                BookingEvent::Confirmed(detail) => {
                    let lead_id = {
                        let mut session = self.session();
                        if !matches!(session.state, SessionState::Scheduling { .. }) {
                            return None;
                        }
                        session.state = SessionState::Confirmed {
                            booking_detail: detail.clone(),
                        };
                        session.analysis.as_ref().and_then(|a| a.lead_id())
                    };
                    tracing::info!("Booking confirmed (lead {:?})", lead_id);
                    drop(bridge.confirm(&detail, lead_id.as_deref()));
                    return Some(detail);
                }
            }
        }
    }

    /// Close button on the scheduler before a booking completes.
    pub async fn close_scheduling(&self) {
        {
            let mut session = self.session();
            if !matches!(session.state, SessionState::Scheduling { .. }) {
                return;
            }
            session.state = SessionState::Idle;
            session.analysis = None;
        }
        self.release_widget().await;
    }

    /// Back to an empty form with every derived piece of state cleared.
    /// Refused while a submission is running.
    pub async fn reset(&self) -> bool {
        {
            let mut session = self.session();
            if matches!(session.state, SessionState::Submitting { .. }) {
                return false;
            }
            *session = Session::default();
        }
        self.release_widget().await;
        true
    }

    async fn release_widget(&self) {
        let token = lock(&self.inner.scheduling).take();
        if let Some(token) = token {
            token.cancel();
        }
        self.inner.bridge.lock().await.teardown();
    }
}

/// Returns an abandoned submission to `Idle` when `submit` is dropped before
/// the outcome is applied.
struct InFlight<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = lock(self.session);
        if matches!(session.state, SessionState::Submitting { .. }) {
            tracing::warn!("Contact submission abandoned before completion, form is editable again");
            session.state = SessionState::Idle;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

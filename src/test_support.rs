use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::api::http::{HttpClient, HttpResponse};
use crate::error::{HttpError, WidgetError};
use crate::widget::provider::{BookingEvent, WidgetMount, WidgetProvider};

/// Answers each POST with the next scripted (delay, response); `None` never answers.
/// Every request is recorded as (url, body).
#[derive(Default)]
pub(crate) struct ScriptedHttp {
    steps: Mutex<VecDeque<(Duration, Option<HttpResponse>)>>,
    booking_status: Mutex<Option<u16>>,
    requests: Mutex<Vec<(String, serde_json::Value)>>,
    calls: AtomicU32,
}

impl ScriptedHttp {
    pub(crate) fn new(steps: Vec<(Duration, Option<HttpResponse>)>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    /// Status returned for URLs ending in `/booking`; defaults to 200.
    pub(crate) fn set_booking_status(&self, status: u16) {
        *self.booking_status.lock().unwrap() = Some(status);
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests_to(&self, suffix: &str) -> Vec<serde_json::Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| url.ends_with(suffix))
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn get(&self, _url: &str) -> Result<HttpResponse, HttpError> {
        Err(HttpError::Transport("not scripted".into()))
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<HttpResponse, HttpError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        if url.ends_with("/booking") {
            let status = self.booking_status.lock().unwrap().unwrap_or(200);
            return Ok(HttpResponse::new(status, "{}"));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        let (delay, response) = step.unwrap_or((Duration::ZERO, None));
        tokio::time::sleep(delay).await;
        match response {
            Some(response) => Ok(response),
            None => futures::future::pending().await,
        }
    }
}

/// In-memory scheduling widget. `ready()` never resolves unless constructed ready.
#[derive(Default)]
pub(crate) struct FakeWidget {
    loaded: bool,
    fail_mount: bool,
    subscribers: Mutex<Vec<UnboundedSender<BookingEvent>>>,
    mounts: Mutex<Vec<WidgetMount>>,
    destroyed: Mutex<Vec<String>>,
}

impl FakeWidget {
    pub(crate) fn loaded() -> Arc<Self> {
        Arc::new(Self {
            loaded: true,
            ..Default::default()
        })
    }

    pub(crate) fn never_loads() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn broken() -> Arc<Self> {
        Arc::new(Self {
            loaded: true,
            fail_mount: true,
            ..Default::default()
        })
    }

    /// Delivers to every live subscriber and returns how many received it.
    pub(crate) fn emit(&self, event: BookingEvent) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    pub(crate) fn live_subscribers(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    pub(crate) fn mounts(&self) -> Vec<WidgetMount> {
        self.mounts.lock().unwrap().clone()
    }

    pub(crate) fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap().clone()
    }
}

#[async_trait]
impl WidgetProvider for FakeWidget {
    async fn ready(&self) {
        if !self.loaded {
            futures::future::pending::<()>().await;
        }
    }

    fn mount(&self, mount: &WidgetMount) -> Result<(), WidgetError> {
        if self.fail_mount {
            return Err(WidgetError::Mount {
                selector: mount.selector.clone(),
                reason: "container missing".into(),
            });
        }
        self.mounts.lock().unwrap().push(mount.clone());
        Ok(())
    }

    fn subscribe(&self, _namespace: &str) -> UnboundedReceiver<BookingEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    fn destroy(&self, selector: &str) {
        self.destroyed.lock().unwrap().push(selector.to_string());
    }
}

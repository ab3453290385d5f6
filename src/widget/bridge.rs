use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::http::{Clock, HttpClient};
use crate::error::WidgetError;
use crate::widget::provider::{
    Analytics, AnalyticsEvent, BookingDetail, BookingEvent, WidgetMount, WidgetProvider,
};

/// Lead id sent with bookings made without a prior analysis.
pub const DIRECT_BOOKING_LEAD: &str = "direct-booking";

/// Owns the single inline scheduling embed: readiness, mount, event
/// subscription, teardown, and the post-booking side effects.
pub struct BookingWidgetBridge {
    provider: Arc<dyn WidgetProvider>,
    analytics: Option<Arc<dyn Analytics>>,
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    mount: WidgetMount,
    booking_url: String,
    analytics_label: String,
    ready_timeout: Duration,
    events: Option<UnboundedReceiver<BookingEvent>>,
    mounted: bool,
}

pub struct BridgeSettings {
    pub mount: WidgetMount,
    pub booking_url: String,
    pub analytics_label: String,
    pub ready_timeout: Duration,
}

impl BookingWidgetBridge {
    pub fn new(
        provider: Arc<dyn WidgetProvider>,
        analytics: Option<Arc<dyn Analytics>>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            provider,
            analytics,
            http,
            clock,
            mount: settings.mount,
            booking_url: settings.booking_url,
            analytics_label: settings.analytics_label,
            ready_timeout: settings.ready_timeout,
            events: None,
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// `false` when the embed script did not show up within the ready timeout
    /// or `cancel` fired first.
    pub async fn wait_for_ready(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Stopped waiting for the scheduling widget");
                false
            }
            _ = self.provider.ready() => true,
            _ = self.clock.sleep(self.ready_timeout) => {
                tracing::warn!(
                    "Scheduling widget not ready after {:?}, leaving it uninitialized",
                    self.ready_timeout
                );
                false
            }
        }
    }

    /// Mounts a fresh embed, replacing any previous one. Returns whether the
    /// widget is live; a widget that never loads is not an error.
    pub async fn activate(&mut self, cancel: &CancellationToken) -> Result<bool, WidgetError> {
        self.teardown();
        if !self.wait_for_ready(cancel).await {
            return Ok(false);
        }

        // Subscribe before mounting so an immediate booking is not missed.
        let events = self.provider.subscribe(&self.mount.namespace);
        self.provider.mount(&self.mount)?;
        self.events = Some(events);
        self.mounted = true;
        tracing::info!(
            "Scheduling widget {} mounted on {}",
            self.mount.calendar_link,
            self.mount.selector
        );
        Ok(true)
    }

    /// Next event from the live embed; `None` once detached or the stream closed.
    pub async fn next_event(&mut self) -> Option<BookingEvent> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    /// Post-booking relay: tears the embed down, reports the conversion and
    /// sends the booking notification in the background.
    pub fn confirm(&mut self, detail: &BookingDetail, lead_id: Option<&str>) -> JoinHandle<()> {
        self.teardown();

        match &self.analytics {
            Some(analytics) => analytics.track(&AnalyticsEvent::booking_confirmed(&self.analytics_label)),
            None => tracing::debug!("No analytics provider, skipping booking conversion event"),
        }

        let payload = booking_notification(detail, lead_id.unwrap_or(DIRECT_BOOKING_LEAD));
        let http = self.http.clone();
        let url = self.booking_url.clone();
        tokio::spawn(async move {
            send_booking_notification(http.as_ref(), &url, &payload).await;
        })
    }

    /// Unsubscribes and removes the embed. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        // Dropping the receiver is the unsubscribe.
        self.events = None;
        if self.mounted {
            self.provider.destroy(&self.mount.selector);
            self.mounted = false;
            tracing::debug!("Scheduling widget removed from {}", self.mount.selector);
        }
    }
}

impl Drop for BookingWidgetBridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Widget payload with the lead id merged in.
pub fn booking_notification(detail: &BookingDetail, lead_id: &str) -> Value {
    match &detail.0 {
        Value::Object(map) => {
            let mut map = map.clone();
            map.insert("lead_id".to_string(), Value::String(lead_id.to_string()));
            Value::Object(map)
        }
        other => json!({ "booking": other, "lead_id": lead_id }),
    }
}

async fn send_booking_notification(http: &dyn HttpClient, url: &str, payload: &Value) {
    match http.post_json(url, payload).await {
        Ok(response) if response.is_success() => {
            tracing::info!("Booking notification delivered");
        }
        Ok(response) => {
            tracing::error!(
                "Booking notification rejected with {}: {}",
                response.status,
                response.body
            );
        }
        Err(e) => {
            tracing::error!("Failed to send booking notification: {}", e);
        }
    }
}

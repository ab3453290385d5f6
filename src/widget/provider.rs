use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::WidgetError;

/// Booking payload exactly as the scheduling widget reports it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingDetail(pub serde_json::Value);

#[derive(Debug, Clone, PartialEq)]
pub enum BookingEvent {
    Ready,
    Confirmed(BookingDetail),
}

/// Where and how the inline calendar is embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetMount {
    pub namespace: String,
    pub selector: String,
    pub calendar_link: String,
    pub layout: String,
    pub hide_event_type_details: bool,
}

impl WidgetMount {
    pub fn inline(namespace: &str, selector: &str, calendar_link: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            selector: selector.to_string(),
            calendar_link: calendar_link.to_string(),
            layout: "month_view".to_string(),
            hide_event_type_details: false,
        }
    }
}

/// Host-side handle on the third-party scheduling embed.
#[async_trait]
pub trait WidgetProvider: Send + Sync {
    /// Resolves once the embed script is usable. May never resolve.
    async fn ready(&self);

    fn mount(&self, mount: &WidgetMount) -> Result<(), WidgetError>;

    /// Event stream for one namespace. Dropping the receiver unsubscribes.
    fn subscribe(&self, namespace: &str) -> UnboundedReceiver<BookingEvent>;

    /// Removes the embed and everything it injected under `selector`.
    fn destroy(&self, selector: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub category: String,
    pub label: String,
    pub value: u32,
}

impl AnalyticsEvent {
    pub fn booking_confirmed(label: &str) -> Self {
        Self {
            name: "booking_confirmed".to_string(),
            category: "conversion".to_string(),
            label: label.to_string(),
            value: 1,
        }
    }
}

/// Best-effort conversion tracking.
#[cfg_attr(test, mockall::automock)]
pub trait Analytics: Send + Sync {
    fn track(&self, event: &AnalyticsEvent);
}

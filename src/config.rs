use std::time::Duration;

use crate::error::ConfigError;

/// Timing of one submission: attempts, backoff and the two whole-operation timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Initial attempt included.
    pub max_attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Elapsed time after which the UI shows the "taking longer than usual" hint.
    pub slow_after: Duration,
    /// Elapsed time after which the in-flight request is cancelled.
    pub abort_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_secs(1),
            slow_after: Duration::from_secs(10),
            abort_after: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub api_base_url: String,
    pub contact_path: String,
    pub booking_path: String,
    pub stats_path: String,
    pub fallback_email: String,
    pub calendar_link: String,
    pub widget_namespace: String,
    pub widget_selector: String,
    pub analytics_label: String,
    pub retry: RetryPolicy,
    pub widget_ready_timeout: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            contact_path: "/contact".to_string(),
            booking_path: "/booking".to_string(),
            stats_path: "/stats/public".to_string(),
            fallback_email: "hello@example.com".to_string(),
            calendar_link: "team/automation-audit".to_string(),
            widget_namespace: "automation-audit".to_string(),
            widget_selector: "#cal-inline-booking".to_string(),
            analytics_label: "automation_audit".to_string(),
            retry: RetryPolicy::default(),
            widget_ready_timeout: Duration::from_secs(5),
        }
    }
}

impl IntakeConfig {
    /// Reads `LEADFLOW_*` variables (after loading `.env`), keeping defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("LEADFLOW_API_BASE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                return Err(ConfigError::Empty {
                    var: "LEADFLOW_API_BASE_URL",
                });
            }
            config.api_base_url = url;
        }
        if let Some(email) = lookup("LEADFLOW_FALLBACK_EMAIL") {
            config.fallback_email = email;
        }
        if let Some(link) = lookup("LEADFLOW_CALENDAR_LINK") {
            config.calendar_link = link;
        }
        if let Some(namespace) = lookup("LEADFLOW_WIDGET_NAMESPACE") {
            config.widget_namespace = namespace;
        }
        if let Some(d) = duration_var(&lookup, "LEADFLOW_SLOW_AFTER_MS")? {
            config.retry.slow_after = d;
        }
        if let Some(d) = duration_var(&lookup, "LEADFLOW_ABORT_AFTER_MS")? {
            config.retry.abort_after = d;
        }
        if let Some(d) = duration_var(&lookup, "LEADFLOW_WIDGET_READY_TIMEOUT_MS")? {
            config.widget_ready_timeout = d;
        }

        Ok(config)
    }

    pub fn contact_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.contact_path)
    }

    pub fn booking_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.booking_path)
    }

    pub fn stats_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.stats_path)
    }
}

fn duration_var<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::InvalidDuration { var, value }),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SubmissionError;

/// The visible fields of the contact form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    AutomationNeed,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Email, Field::AutomationNeed];

    /// DOM id / form name of the input.
    pub fn id(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::AutomationNeed => "automationNeed",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub email: String,
    pub automation_need: String,
    /// Hidden from humans; anything typed here is forwarded untouched so the backend can reject it.
    pub honeypot: String,
}

impl FormFields {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::AutomationNeed => &self.automation_need,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::AutomationNeed => self.automation_need = value,
        }
    }
}

/// Body of `POST /contact`.
#[derive(Debug, Serialize)]
pub struct ContactRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub need: &'a str,
    pub honeypot: &'a str,
}

impl<'a> From<&'a FormFields> for ContactRequest<'a> {
    fn from(fields: &'a FormFields) -> Self {
        ContactRequest {
            name: &fields.name,
            email: &fields.email,
            need: &fields.automation_need,
            honeypot: &fields.honeypot,
        }
    }
}

/// Backend values that show up as strings, numbers or lists depending on the model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleValue {
    Number(serde_json::Number),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for FlexibleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexibleValue::Number(n) => write!(f, "{}", n),
            FlexibleValue::Text(s) => f.write_str(s),
            FlexibleValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// AI analysis attached to a successful submission. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    pub personalized_message: Option<String>,
    pub time_saved_hours_per_week: Option<FlexibleValue>,
    pub cost_savings_monthly: Option<FlexibleValue>,
    pub recommended_tier: Option<FlexibleValue>,
    pub timeline_days: Option<FlexibleValue>,
    pub complexity: Option<FlexibleValue>,
    pub tools_needed: Option<FlexibleValue>,
}

impl Analysis {
    /// "14 days" for a bare number, the backend text as-is when it already names days.
    pub fn timeline_label(&self) -> Option<String> {
        let timeline = self.timeline_days.as_ref()?.to_string();
        if timeline.contains("day") {
            Some(timeline)
        } else {
            Some(format!("{} days", timeline))
        }
    }

    pub fn time_saved_label(&self) -> Option<String> {
        self.time_saved_hours_per_week
            .as_ref()
            .map(|hours| format!("{} hrs/week", hours))
    }

    pub fn cost_savings_label(&self) -> Option<String> {
        self.cost_savings_monthly
            .as_ref()
            .map(|amount| format!("${}/month", amount))
    }
}

/// Response of `POST /contact`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub lead_id: Option<FlexibleValue>,
    #[serde(default)]
    pub analysis: Option<Analysis>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ContactResponse {
    pub fn lead_id(&self) -> Option<String> {
        self.lead_id.as_ref().map(|id| id.to_string())
    }
}

/// Error body of a non-2xx response. `detail` is a string for handled errors and
/// a structured list for framework validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Success(ContactResponse),
    RetryableFailure(SubmissionError),
    TerminalFailure(SubmissionError),
}

impl SubmissionOutcome {
    /// Wraps a failure in the variant its kind calls for.
    pub fn failure(error: SubmissionError) -> Self {
        if error.is_retryable() {
            SubmissionOutcome::RetryableFailure(error)
        } else {
            SubmissionOutcome::TerminalFailure(error)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }
}

use urlencoding::encode;

use crate::models::contact_models::FormFields;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailtoKind {
    /// Offered next to a terminal submission error.
    SubmissionFailed,
    /// Offered when the description hits the character limit.
    DetailOverflow,
}

/// Builds the `mailto:` link that carries the current form contents to the inbox.
pub fn fallback_link(to: &str, fields: &FormFields, kind: MailtoKind) -> String {
    let who = if fields.name.trim().is_empty() {
        "Contact Form"
    } else {
        fields.name.as_str()
    };
    let subject = match kind {
        MailtoKind::SubmissionFailed => format!("Automation Request from {}", who),
        MailtoKind::DetailOverflow => format!("Detailed Automation Request from {}", who),
    };
    let body = format!(
        "Name: {}\r\nEmail: {}\r\n\r\nWhat I need automated:\r\n{}",
        fields.name, fields.email, fields.automation_need
    );
    format!(
        "mailto:{}?subject={}&body={}",
        to,
        encode(&subject),
        encode(&body)
    )
}

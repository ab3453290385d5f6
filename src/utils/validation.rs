use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::models::contact_models::{Field, FormFields};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const EMAIL_MAX_CHARS: usize = 254;
pub const NEED_MIN_CHARS: usize = 20;
pub const NEED_MAX_CHARS: usize = 2000;
/// From here on the form warns that the description is close to the limit.
pub const NEED_WARN_CHARS: usize = 1900;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

// Misspelled domain -> intended domain.
static DOMAIN_TYPOS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("gmail.con", "gmail.com"),
        ("gmail.co", "gmail.com"),
        ("gmial.com", "gmail.com"),
        ("gmai.com", "gmail.com"),
        ("gmal.com", "gmail.com"),
        ("gamil.com", "gmail.com"),
        ("gnail.com", "gmail.com"),
        ("yahoo.con", "yahoo.com"),
        ("yaho.com", "yahoo.com"),
        ("yahooo.com", "yahoo.com"),
        ("hotmail.con", "hotmail.com"),
        ("hotmial.com", "hotmail.com"),
        ("hotmal.com", "hotmail.com"),
        ("outlook.con", "outlook.com"),
        ("outlok.com", "outlook.com"),
        ("icloud.con", "icloud.com"),
        ("iclod.com", "icloud.com"),
    ]
    .into_iter()
    .collect()
});

/// Validates a single field. `None` means the value is acceptable.
pub fn validate(field: Field, value: &str) -> Option<String> {
    match field {
        Field::Name => validate_name(value),
        Field::Email => validate_email(value),
        Field::AutomationNeed => validate_need(value),
    }
}

fn validate_name(value: &str) -> Option<String> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        Some("Name is required".to_string())
    } else if len < NAME_MIN_CHARS {
        Some("Name must be at least 2 characters".to_string())
    } else if len > NAME_MAX_CHARS {
        Some("Name is too long (max 100 characters)".to_string())
    } else {
        None
    }
}

fn validate_email(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return Some("Email is required".to_string());
    }
    if !EMAIL_RE.is_match(value) {
        return Some("Please enter a valid email address".to_string());
    }
    if value.chars().count() > EMAIL_MAX_CHARS {
        return Some("Email is too long".to_string());
    }
    suggest_email(value).map(|suggestion| format!("Did you mean \"{}\"?", suggestion))
}

fn validate_need(value: &str) -> Option<String> {
    let len = value.chars().count();
    if value.trim().is_empty() {
        Some("Please describe what you need automated".to_string())
    } else if len < NEED_MIN_CHARS {
        Some("Please provide more details (at least 20 characters)".to_string())
    } else if len > NEED_MAX_CHARS {
        Some("Description is too long (max 2000 characters)".to_string())
    } else {
        None
    }
}

/// Corrected address when the domain is a known misspelling.
pub fn suggest_email(value: &str) -> Option<String> {
    let (local, domain) = value.rsplit_once('@')?;
    let corrected = DOMAIN_TYPOS.get(domain.to_ascii_lowercase().as_str())?;
    Some(format!("{}@{}", local, corrected))
}

/// Latest validation message per field; `None` entries are fields that passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(HashMap<Field, Option<String>>);

impl FieldErrors {
    pub fn validate_all(fields: &FormFields) -> Self {
        FieldErrors(
            Field::ALL
                .into_iter()
                .map(|field| (field, validate(field, fields.get(field))))
                .collect(),
        )
    }

    pub fn set(&mut self, field: Field, message: Option<String>) {
        self.0.insert(field, message);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).and_then(|m| m.as_deref())
    }

    pub fn has_errors(&self) -> bool {
        self.0.values().any(Option::is_some)
    }

    /// First failing field in form order; this is where focus goes.
    pub fn first_invalid(&self) -> Option<Field> {
        Field::ALL.into_iter().find(|field| self.get(*field).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Fields the visitor has left at least once. Errors for untouched fields stay hidden while typing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchedSet(HashSet<Field>);

impl TouchedSet {
    pub fn touch(&mut self, field: Field) {
        self.0.insert(field);
    }

    pub fn touch_all(&mut self) {
        self.0.extend(Field::ALL);
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// What to show under the description textarea.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedLengthHint {
    Empty,
    Counter { len: usize, max: usize },
    ApproachingLimit { remaining: usize },
    /// The mail fallback banner replaces the counter.
    LimitReached,
}

pub fn need_length_hint(value: &str) -> NeedLengthHint {
    let len = value.chars().count();
    match len {
        0 => NeedLengthHint::Empty,
        l if l >= NEED_MAX_CHARS => NeedLengthHint::LimitReached,
        l if l >= NEED_WARN_CHARS => NeedLengthHint::ApproachingLimit {
            remaining: NEED_MAX_CHARS - l,
        },
        l => NeedLengthHint::Counter {
            len: l,
            max: NEED_MAX_CHARS,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> FormFields {
        FormFields {
            name: "Sarah Johnson".into(),
            email: "sarah@company.com".into(),
            automation_need: "We copy leads from Facebook ads into our CRM every day.".into(),
            honeypot: String::new(),
        }
    }

    #[test]
    fn accepts_values_inside_bounds() {
        let longest_name = "n".repeat(100);
        for name in ["Al", longest_name.as_str()] {
            assert_eq!(validate(Field::Name, name), None);
        }
        let long_local = format!("{}@example.com", "a".repeat(242));
        assert_eq!(long_local.len(), 254);
        for email in ["bob@example.com", "first.last@sub.domain.org", long_local.as_str()] {
            assert_eq!(validate(Field::Email, email), None, "{}", email);
        }
        for need in ["x".repeat(20), "y".repeat(2000)] {
            assert_eq!(validate(Field::AutomationNeed, &need), None);
        }
    }

    #[test]
    fn name_rules() {
        assert_eq!(validate(Field::Name, "   ").as_deref(), Some("Name is required"));
        assert_eq!(
            validate(Field::Name, "A").as_deref(),
            Some("Name must be at least 2 characters")
        );
        assert!(validate(Field::Name, &"n".repeat(101)).unwrap().contains("max 100"));
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate(Field::Email, "").as_deref(), Some("Email is required"));
        for bad in ["plainaddress", "a@b", "a b@c.com", "@c.com", "a@@c.com"] {
            assert_eq!(
                validate(Field::Email, bad).as_deref(),
                Some("Please enter a valid email address"),
                "{}",
                bad
            );
        }
        let too_long = format!("{}@example.com", "a".repeat(243));
        assert_eq!(validate(Field::Email, &too_long).as_deref(), Some("Email is too long"));
    }

    #[test]
    fn typo_domains_suggest_correction() {
        assert_eq!(
            validate(Field::Email, "bob@gmial.com").as_deref(),
            Some("Did you mean \"bob@gmail.com\"?")
        );
        for (typo, fixed) in DOMAIN_TYPOS.iter() {
            let message = validate(Field::Email, &format!("pat@{}", typo)).unwrap();
            assert!(message.contains(fixed), "{} -> {}", typo, message);
        }
        assert_eq!(suggest_email("Bob@GMAIL.CON").as_deref(), Some("Bob@gmail.com"));
        assert_eq!(suggest_email("bob@gmail.com"), None);
    }

    #[test]
    fn need_rules() {
        assert_eq!(
            validate(Field::AutomationNeed, " ").as_deref(),
            Some("Please describe what you need automated")
        );
        assert!(validate(Field::AutomationNeed, "too short")
            .unwrap()
            .contains("at least 20"));
        assert!(validate(Field::AutomationNeed, &"z".repeat(2001))
            .unwrap()
            .contains("max 2000"));
    }

    #[test]
    fn first_invalid_follows_form_order() {
        let mut fields = valid_fields();
        assert!(!FieldErrors::validate_all(&fields).has_errors());

        fields.automation_need = "short".into();
        fields.email = "nope".into();
        let errors = FieldErrors::validate_all(&fields);
        assert!(errors.has_errors());
        assert_eq!(errors.first_invalid(), Some(Field::Email));
        assert_eq!(errors.get(Field::Name), None);
    }

    #[test]
    fn length_hint_thresholds() {
        assert_eq!(need_length_hint(""), NeedLengthHint::Empty);
        assert_eq!(
            need_length_hint("hello"),
            NeedLengthHint::Counter { len: 5, max: 2000 }
        );
        assert_eq!(
            need_length_hint(&"a".repeat(1999)),
            NeedLengthHint::ApproachingLimit { remaining: 1 }
        );
        assert_eq!(validate(Field::AutomationNeed, &"a".repeat(1999)), None);
        assert_eq!(need_length_hint(&"a".repeat(2000)), NeedLengthHint::LimitReached);
    }
}

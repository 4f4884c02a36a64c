use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::ServiceError;
use crate::error::FieldErrors;
use crate::types::TextEnum;

/// Collects every problem with an input so they are reported together.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // First problem per field wins
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Non-blank text, trimmed. Reports "is required" otherwise.
    pub fn required(&mut self, field: &str, value: Option<&str>) -> String {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => {
                self.add(field, "is required");
                String::new()
            }
        }
    }

    pub fn required_id<T: Copy + Default>(&mut self, field: &str, value: Option<T>) -> T {
        match value {
            Some(v) => v,
            None => {
                self.add(field, "is required");
                T::default()
            }
        }
    }

    pub fn email(&mut self, field: &str, value: Option<&str>) {
        if let Some(email) = value {
            if !is_valid_email(email) {
                self.add(field, "is not a valid email address");
            }
        }
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.add(field, format!("must be at least {} characters", min));
        }
    }

    pub fn non_negative(&mut self, field: &str, value: Option<Decimal>) {
        if matches!(value, Some(v) if v < Decimal::ZERO) {
            self.add(field, "must not be negative");
        }
    }

    pub fn positive(&mut self, field: &str, value: Decimal) {
        if value <= Decimal::ZERO {
            self.add(field, "must be greater than zero");
        }
    }

    pub fn percentage(&mut self, field: &str, value: Option<Decimal>) {
        if matches!(value, Some(v) if v < Decimal::ZERO || v > Decimal::ONE_HUNDRED) {
            self.add(field, "must be between 0 and 100");
        }
    }

    pub fn date_order(&mut self, field: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                self.add(field, "must not be before the start date");
            }
        }
    }

    /// Parses one of a text enum's values, falling back to `current` when
    /// the field is absent.
    pub fn choice<E: TextEnum>(&mut self, field: &str, value: Option<&str>, current: E) -> E {
        match value.map(str::trim) {
            None => current,
            Some(raw) => match raw.parse::<E>() {
                Ok(v) => v,
                Err(_) => {
                    self.add(field, format!("must be one of: {}", E::expected()));
                    current
                }
            },
        }
    }

    pub fn into_error(self) -> ServiceError {
        ServiceError::Validation(self.errors)
    }

    pub fn finish(self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.errors))
        }
    }
}

/// Merges a patch value for a nullable text column: absent keeps the
/// current value, blank clears it.
pub fn merge_text(patch: Option<String>, current: Option<&String>) -> Option<String> {
    match patch {
        Some(v) => {
            let trimmed = v.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        None => current.cloned(),
    }
}

/// Merges a patch value for a nullable column where JSON `null` clears it.
pub fn merge_value<T: Clone>(patch: Option<Option<T>>, current: Option<&T>) -> Option<T> {
    match patch {
        Some(v) => v,
        None => current.cloned(),
    }
}

/// Serde helper telling an absent field (`None`) apart from `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Lowercases and trims an email for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ClientStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn collects_all_errors() {
        let mut v = Validator::new();
        let name = v.required("name", Some("   "));
        v.email("email", Some("not-an-email"));
        v.non_negative("budget", Some(dec!(-1)));
        assert!(name.is_empty());
        match v.finish() {
            Err(ServiceError::Validation(errors)) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors["name"], "is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_clean_input() {
        let mut v = Validator::new();
        assert_eq!(v.required("name", Some("  Acme  ")), "Acme");
        v.email("email", Some("ops@acme.in"));
        v.percentage("tax_rate", Some(dec!(18)));
        assert!(v.finish().is_ok());
    }

    #[test]
    fn choice_reports_allowed_values() {
        let mut v = Validator::new();
        let status = v.choice("status", Some("archived"), ClientStatus::Active);
        assert_eq!(status, ClientStatus::Active);
        assert!(v.has("status"));
        assert_eq!(
            v.finish().unwrap_err().to_string(),
            ServiceError::field("status", "must be one of: active, inactive, prospect").to_string()
        );

        let mut v = Validator::new();
        assert_eq!(v.choice("status", Some("prospect"), ClientStatus::Active), ClientStatus::Prospect);
        assert_eq!(v.choice::<ClientStatus>("status", None, ClientStatus::Inactive), ClientStatus::Inactive);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@@b.co"));
    }

    #[test]
    fn merge_text_semantics() {
        let current = "old".to_string();
        assert_eq!(merge_text(None, Some(&current)), Some("old".to_string()));
        assert_eq!(merge_text(Some("  ".into()), Some(&current)), None);
        assert_eq!(merge_text(Some(" new ".into()), None), Some("new".to_string()));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        budget: Option<Option<Decimal>>,
    }

    #[test]
    fn null_clears_and_absent_keeps() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"budget": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"budget": 5000}"#).unwrap();
        let current = dec!(100);
        assert_eq!(merge_value(absent.budget, Some(&current)), Some(dec!(100)));
        assert_eq!(merge_value(cleared.budget, Some(&current)), None);
        assert_eq!(merge_value(set.budget, Some(&current)), Some(dec!(5000)));
    }

    #[test]
    fn date_order_and_ranges() {
        let mut v = Validator::new();
        let start = NaiveDate::from_ymd_opt(2024, 5, 1);
        let end = NaiveDate::from_ymd_opt(2024, 4, 1);
        v.date_order("end_date", start, end);
        v.percentage("engagement_rate", Some(dec!(101)));
        v.positive("amount", dec!(0));
        assert!(v.has("end_date") && v.has("engagement_rate") && v.has("amount"));
    }
}

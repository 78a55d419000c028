use std::{borrow::Cow, collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::models::ExpenseDraft;

pub const BLANK_MESSAGE: &str = "can't be blank";
pub const AMOUNT_FORMAT_MESSAGE: &str = "has incorrect format. Please make it as xxx.xx";

static AMOUNT_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9][0-9])?$").expect("amount pattern is valid"));

/// Field-keyed messages describing why a save was rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut collected = FieldErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                collected.add(field, message);
            }
        }
        collected
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str(", ")?;
                }
                write!(f, "{field} {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// An expense whose fields passed every save-time rule. Repositories only
/// accept this type, so unchecked data cannot be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedExpense {
    datetime: DateTime<Utc>,
    amount: String,
    description: String,
}

impl ValidatedExpense {
    pub fn datetime(&self) -> DateTime<Utc> {
        self.datetime
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Validate for ExpenseDraft {
    fn validate(&self) -> Result<(), ValidationErrors> {
        check(self).map(|_| ())
    }
}

/// Checks every save-time rule on `draft` and returns either the writable
/// record or all collected messages.
pub fn validate_expense(draft: &ExpenseDraft) -> Result<ValidatedExpense, FieldErrors> {
    check(draft).map_err(|errors| FieldErrors::from(&errors))
}

pub fn amount_well_formed(amount: Option<&str>) -> bool {
    amount.map_or(false, |value| AMOUNT_FORMAT.is_match(value))
}

/// Reads an RFC 3339 timestamp, falling back to chrono's own `FromStr`
/// (which also takes a space separator). Anything else is treated as absent.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|datetime| datetime.with_timezone(&Utc))
        .ok()
        .or_else(|| value.parse::<DateTime<Utc>>().ok())
}

fn check(draft: &ExpenseDraft) -> Result<ValidatedExpense, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let description = present(draft.description.as_deref());
    if description.is_none() {
        errors.add("description", rule("presence", BLANK_MESSAGE));
    }
    let datetime = draft.datetime.as_deref().and_then(parse_datetime);
    if datetime.is_none() {
        errors.add("datetime", rule("presence", BLANK_MESSAGE));
    }
    let amount = present(draft.amount.as_deref());
    if amount.is_none() {
        errors.add("amount", rule("presence", BLANK_MESSAGE));
    }
    // Runs even when the amount is missing; a missing amount is also malformed.
    if !amount_well_formed(draft.amount.as_deref()) {
        errors.add("amount", rule("amount_format", AMOUNT_FORMAT_MESSAGE));
    }

    match (datetime, amount, description) {
        (Some(datetime), Some(amount), Some(description)) if errors.is_empty() => {
            Ok(ValidatedExpense {
                datetime,
                amount: amount.to_string(),
                description: description.to_string(),
            })
        }
        _ => Err(errors),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(amount: Option<&str>) -> ExpenseDraft {
        ExpenseDraft {
            owner_id: Some(1),
            datetime: Some("2024-05-02T09:30:00Z".to_string()),
            amount: amount.map(str::to_string),
            description: Some("Client dinner".to_string()),
        }
    }

    #[test]
    fn accepts_well_formed_amounts() {
        for amount in ["0.00", "12345", "7.50", "7", "123.45"] {
            let result = validate_expense(&draft(Some(amount)));
            assert!(result.is_ok(), "expected {amount:?} to be accepted");
        }
    }

    #[test]
    fn rejects_malformed_amounts_with_format_message() {
        for amount in ["12.5", "12.345", "-5.00", "abc", "", "5.", " 5.00", "5.00 ", "1,000.00", "1e3", "12\n34"] {
            let errors = validate_expense(&draft(Some(amount)))
                .expect_err(&format!("expected {amount:?} to be rejected"));
            assert!(
                errors
                    .get("amount")
                    .iter()
                    .any(|message| message == AMOUNT_FORMAT_MESSAGE),
                "missing format message for {amount:?}: {errors}"
            );
        }
    }

    #[test]
    fn missing_amount_reports_presence_and_format_without_panicking() {
        let errors = validate_expense(&draft(None)).unwrap_err();

        assert_eq!(
            errors.get("amount"),
            &[BLANK_MESSAGE.to_string(), AMOUNT_FORMAT_MESSAGE.to_string()]
        );
    }

    #[test]
    fn each_blank_field_reports_its_own_error() {
        let candidate = ExpenseDraft {
            owner_id: Some(1),
            datetime: None,
            amount: Some("   ".to_string()),
            description: Some(String::new()),
        };

        let errors = validate_expense(&candidate).unwrap_err();

        assert_eq!(errors.get("description"), &[BLANK_MESSAGE.to_string()]);
        assert_eq!(errors.get("datetime"), &[BLANK_MESSAGE.to_string()]);
        assert!(errors.get("amount").contains(&BLANK_MESSAGE.to_string()));
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["amount", "datetime", "description"]
        );
    }

    #[test]
    fn unreadable_or_blank_datetime_counts_as_missing() {
        for datetime in ["", "   ", "yesterday", "2024-13-40T00:00:00Z"] {
            let mut candidate = draft(Some("10.00"));
            candidate.datetime = Some(datetime.to_string());

            let errors = validate_expense(&candidate)
                .expect_err(&format!("expected {datetime:?} to be rejected"));

            assert_eq!(errors.get("datetime"), &[BLANK_MESSAGE.to_string()]);
            assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["datetime"]);
        }
    }

    #[test]
    fn datetime_accepts_rfc3339_with_any_offset() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();

        assert_eq!(parse_datetime("2024-05-02T09:30:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-05-02T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_datetime(" 2024-05-02T09:30:00Z "), Some(expected));

        let validated = validate_expense(&draft(Some("1"))).expect("valid");
        assert_eq!(validated.datetime(), expected);
    }

    #[test]
    fn blank_description_and_bad_amount_both_reported() {
        let mut candidate = draft(Some("12.5"));
        candidate.description = None;

        let errors = validate_expense(&candidate).unwrap_err();

        assert_eq!(errors.get("description"), &[BLANK_MESSAGE.to_string()]);
        assert_eq!(errors.get("amount"), &[AMOUNT_FORMAT_MESSAGE.to_string()]);
    }

    #[test]
    fn revalidating_a_valid_draft_is_stable() {
        let candidate = draft(Some("42.00"));

        let first = validate_expense(&candidate).expect("valid");
        let second = validate_expense(&candidate).expect("still valid");

        assert_eq!(first, second);
        assert_eq!(first.amount(), "42.00");
        assert!(candidate.validate().is_ok());
    }

    #[test]
    fn display_lists_field_and_message() {
        let mut errors = FieldErrors::default();
        errors.add("amount", AMOUNT_FORMAT_MESSAGE);
        errors.add("description", BLANK_MESSAGE);

        assert_eq!(
            errors.to_string(),
            "amount has incorrect format. Please make it as xxx.xx, description can't be blank"
        );
    }

    #[test]
    fn field_errors_serialize_as_plain_map() {
        let mut errors = FieldErrors::default();
        errors.add("amount", AMOUNT_FORMAT_MESSAGE);

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "amount": [AMOUNT_FORMAT_MESSAGE] })
        );
    }
}

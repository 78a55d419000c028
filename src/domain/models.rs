use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// A persisted expense. `amount` keeps the caller's textual form, e.g. `"12.50"`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Expense {
    pub id: i64,
    pub owner_id: i64,
    pub datetime: DateTime<Utc>,
    pub amount: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate expense as received from a caller. Every field may be missing
/// and `datetime` is kept as text; nothing here has been checked yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseDraft {
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExpenseDraft {
    /// Overlays the supplied changes; absent fields keep their current value.
    pub fn apply(&mut self, changes: ExpenseChanges) {
        if let Some(datetime) = changes.datetime {
            self.datetime = Some(datetime);
        }
        if let Some(amount) = changes.amount {
            self.amount = Some(amount);
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
    }
}

impl From<&Expense> for ExpenseDraft {
    fn from(expense: &Expense) -> Self {
        Self {
            owner_id: Some(expense.owner_id),
            datetime: Some(expense.datetime.to_rfc3339()),
            amount: Some(expense.amount.clone()),
            description: Some(expense.description.clone()),
        }
    }
}

/// Partial update payload for an existing expense. A present but blank field
/// replaces the stored value and then fails validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpenseChanges {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, deserialize_with = "amount_text")]
    pub amount: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Accepts any JSON value for `amount` and keeps its text, so numbers and other
/// shapes reach the format rule instead of failing deserialization.
fn amount_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored_expense() -> Expense {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Expense {
            id: 7,
            owner_id: 3,
            datetime: at,
            amount: "12.50".to_string(),
            description: "Lunch".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn apply_only_overwrites_supplied_fields() {
        let mut draft = ExpenseDraft::from(&stored_expense());

        draft.apply(ExpenseChanges {
            amount: Some("99.00".to_string()),
            ..ExpenseChanges::default()
        });

        assert_eq!(draft.amount.as_deref(), Some("99.00"));
        assert_eq!(draft.description.as_deref(), Some("Lunch"));
        assert_eq!(draft.owner_id, Some(3));
    }

    #[test]
    fn draft_keeps_datetime_text_for_validation() {
        let draft: ExpenseDraft = serde_json::from_value(serde_json::json!({
            "datetime": "yesterday",
            "amount": "5.00",
            "description": "Taxi"
        }))
        .expect("draft should deserialize");

        assert_eq!(draft.datetime.as_deref(), Some("yesterday"));
        assert_eq!(draft.owner_id, None);
    }

    #[test]
    fn numeric_amount_is_kept_as_text() {
        let draft: ExpenseDraft = serde_json::from_value(serde_json::json!({
            "amount": 12.5
        }))
        .expect("draft should deserialize");

        assert_eq!(draft.amount.as_deref(), Some("12.5"));

        let changes: ExpenseChanges = serde_json::from_value(serde_json::json!({
            "amount": null,
            "datetime": ""
        }))
        .expect("changes should deserialize");

        assert_eq!(changes.amount, None);
        assert_eq!(changes.datetime.as_deref(), Some(""));
    }

    #[test]
    fn stored_expense_round_trips_datetime_text() {
        let expense = stored_expense();

        let draft = ExpenseDraft::from(&expense);

        assert_eq!(draft.datetime.as_deref(), Some("2024-03-01T12:00:00+00:00"));
    }
}

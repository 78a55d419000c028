pub mod rules;

pub use rules::{validate_expense, FieldErrors, ValidatedExpense};

use crate::domain::models::{Expense, User};

/// The set of expenses an actor is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseScope {
    All,
    OwnedBy(i64),
}

impl ExpenseScope {
    pub fn for_actor(actor: &User) -> Self {
        if actor.is_admin {
            ExpenseScope::All
        } else {
            ExpenseScope::OwnedBy(actor.id)
        }
    }

    pub fn permits(&self, expense: &Expense) -> bool {
        match self {
            ExpenseScope::All => true,
            ExpenseScope::OwnedBy(owner_id) => expense.owner_id == *owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, is_admin: bool) -> User {
        User {
            id,
            username: format!("user-{id}"),
            is_admin,
            created_at: Utc::now(),
        }
    }

    fn expense_owned_by(owner_id: i64) -> Expense {
        let now = Utc::now();
        Expense {
            id: 1,
            owner_id,
            datetime: now,
            amount: "10.00".to_string(),
            description: "Parking".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn admin_scope_covers_everything() {
        let scope = ExpenseScope::for_actor(&user(1, true));

        assert_eq!(scope, ExpenseScope::All);
        assert!(scope.permits(&expense_owned_by(1)));
        assert!(scope.permits(&expense_owned_by(42)));
    }

    #[test]
    fn regular_scope_is_limited_to_own_expenses() {
        let scope = ExpenseScope::for_actor(&user(5, false));

        assert_eq!(scope, ExpenseScope::OwnedBy(5));
        assert!(scope.permits(&expense_owned_by(5)));
        assert!(!scope.permits(&expense_owned_by(6)));
    }
}

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{ExpenseRepository, RepositoryError, UserRepository};
use crate::{
    domain::models::{Expense, User},
    validation::ValidatedExpense,
};

/// Process-local store used for tests and the `memory` provider.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<BTreeMap<i64, User>>,
    expenses: RwLock<BTreeMap<i64, Expense>>,
    user_ids: AtomicI64,
    expense_ids: AtomicI64,
}

#[async_trait]
impl ExpenseRepository for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        Ok(self.expenses.read().values().cloned().collect())
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        Ok(self
            .expenses
            .read()
            .values()
            .filter(|expense| expense.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Expense>, RepositoryError> {
        Ok(self.expenses.read().get(&id).cloned())
    }

    async fn insert(
        &self,
        owner_id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Expense, RepositoryError> {
        if !self.users.read().contains_key(&owner_id) {
            return Err(RepositoryError::MissingOwner(owner_id));
        }
        let now = Utc::now();
        let record = Expense {
            id: self.expense_ids.fetch_add(1, Ordering::SeqCst) + 1,
            owner_id,
            datetime: expense.datetime(),
            amount: expense.amount().to_string(),
            description: expense.description().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.expenses.write().insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Option<Expense>, RepositoryError> {
        let mut expenses = self.expenses.write();
        let Some(record) = expenses.get_mut(&id) else {
            return Ok(None);
        };
        record.datetime = expense.datetime();
        record.amount = expense.amount().to_string();
        record.description = expense.description().to_string();
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.expenses.write().remove(&id).is_some())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str, is_admin: bool) -> Result<User, RepositoryError> {
        let mut users = self.users.write();
        if users.values().any(|user| user.username == username) {
            return Err(RepositoryError::DuplicateUsername(username.to_string()));
        }
        let user = User {
            id: self.user_ids.fetch_add(1, Ordering::SeqCst) + 1,
            username: username.to_string(),
            is_admin,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::models::ExpenseDraft, validation::validate_expense};

    fn validated(amount: &str) -> ValidatedExpense {
        validate_expense(&ExpenseDraft {
            owner_id: None,
            datetime: Some(Utc::now().to_rfc3339()),
            amount: Some(amount.to_string()),
            description: Some("Hotel".to_string()),
        })
        .expect("fixture should be valid")
    }

    #[tokio::test]
    async fn insert_rejects_unknown_owner() {
        let store = MemoryStore::default();

        let err = store.insert(99, &validated("10.00")).await.unwrap_err();

        assert!(matches!(err, RepositoryError::MissingOwner(99)));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_bumps_updated_at_and_keeps_owner() {
        let store = MemoryStore::default();
        let owner = store.create_user("ana", false).await.unwrap();
        let created = store.insert(owner.id, &validated("10.00")).await.unwrap();

        let updated = store
            .update(created.id, &validated("11.00"))
            .await
            .unwrap()
            .expect("expense exists");

        assert_eq!(updated.owner_id, owner.id);
        assert_eq!(updated.amount, "11.00");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert!(store.update(404, &validated("1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::default();
        store.create_user("ana", false).await.unwrap();

        let err = store.create_user("ana", true).await.unwrap_err();

        assert!(matches!(err, RepositoryError::DuplicateUsername(name) if name == "ana"));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let store = MemoryStore::default();
        let owner = store.create_user("ana", false).await.unwrap();
        let created = store.insert(owner.id, &validated("3")).await.unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.find(created.id).await.unwrap().is_none());
    }
}

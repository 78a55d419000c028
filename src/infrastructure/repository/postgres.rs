use async_trait::async_trait;

use super::{ExpenseRepository, RepositoryError, UserRepository};
use crate::{
    domain::models::{Expense, User},
    infrastructure::db::PgPool,
    validation::ValidatedExpense,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PgStore {
    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, owner_id, datetime, amount, description, created_at, updated_at
            FROM expenses
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Expense>, RepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, owner_id, datetime, amount, description, created_at, updated_at
            FROM expenses
            WHERE owner_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    async fn find(&self, id: i64) -> Result<Option<Expense>, RepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, owner_id, datetime, amount, description, created_at, updated_at
            FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    async fn insert(
        &self,
        owner_id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Expense, RepositoryError> {
        sqlx::query_as::<_, Expense>(
            "INSERT INTO expenses (owner_id, datetime, amount, description)
             VALUES ($1,$2,$3,$4)
             RETURNING id, owner_id, datetime, amount, description, created_at, updated_at",
        )
        .bind(owner_id)
        .bind(expense.datetime())
        .bind(expense.amount())
        .bind(expense.description())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_owner_violation(err, owner_id))
    }

    async fn update(
        &self,
        id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Option<Expense>, RepositoryError> {
        let record = sqlx::query_as::<_, Expense>(
            "UPDATE expenses SET datetime=$1, amount=$2, description=$3, updated_at=now()
             WHERE id=$4
             RETURNING id, owner_id, datetime, amount, description, created_at, updated_at",
        )
        .bind(expense.datetime())
        .bind(expense.amount())
        .bind(expense.description())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, is_admin, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, username: &str, is_admin: bool) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, is_admin) VALUES ($1,$2)
             RETURNING id, username, is_admin, created_at",
        )
        .bind(username)
        .bind(is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| map_username_violation(err, username))
    }
}

fn map_owner_violation(err: sqlx::Error, owner_id: i64) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return RepositoryError::MissingOwner(owner_id);
        }
    }
    RepositoryError::Database(err)
}

fn map_username_violation(err: sqlx::Error, username: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepositoryError::DuplicateUsername(username.to_string());
        }
    }
    RepositoryError::Database(err)
}

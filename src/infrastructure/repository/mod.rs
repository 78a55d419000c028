use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::{
    domain::models::{Expense, User},
    infrastructure::{config::Config, db},
    validation::ValidatedExpense,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("owner {0} does not exist")]
    MissingOwner(i64),
    #[error("username already taken: {0}")]
    DuplicateUsername(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence contract for expenses. Writes only take validated records.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Expense>, RepositoryError>;
    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Expense>, RepositoryError>;
    async fn find(&self, id: i64) -> Result<Option<Expense>, RepositoryError>;
    async fn insert(
        &self,
        owner_id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Expense, RepositoryError>;
    /// Returns `None` when no expense has the given id.
    async fn update(
        &self,
        id: i64,
        expense: &ValidatedExpense,
    ) -> Result<Option<Expense>, RepositoryError>;
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, RepositoryError>;
    async fn find_user_by_username(&self, username: &str)
        -> Result<Option<User>, RepositoryError>;
    async fn create_user(&self, username: &str, is_admin: bool) -> Result<User, RepositoryError>;
}

#[derive(Clone)]
pub struct Repositories {
    pub expenses: Arc<dyn ExpenseRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ExpenseRepository + UserRepository + 'static,
    {
        Self {
            expenses: store.clone(),
            users: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }
}

pub async fn build_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.store.provider.as_str() {
        "postgres" => {
            let pool = db::connect(&config.database).await?;
            db::run_migrations(&pool).await?;
            info!("database migrations completed successfully");
            Ok(Repositories::from_store(Arc::new(PgStore::new(pool))))
        }
        "memory" => {
            info!("using in-memory expense store");
            let repositories = Repositories::in_memory();
            if let Some(username) = config.store.seed_admin.as_deref() {
                let admin = repositories.users.create_user(username, true).await?;
                info!(user_id = admin.id, username, "seeded administrator");
            }
            Ok(repositories)
        }
        other => anyhow::bail!("unsupported store provider: {other}"),
    }
}

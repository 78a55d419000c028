use tracing::{debug, info, warn};

use crate::{
    domain::{
        models::{Expense, ExpenseChanges, ExpenseDraft, User},
        policy::ExpenseScope,
    },
    infrastructure::{auth::AuthenticatedUser, repository::Repositories},
    validation::{validate_expense, ValidatedExpense},
};

use super::errors::ServiceError;

pub struct ExpenseService {
    repositories: Repositories,
}

impl ExpenseService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    /// Loads the user behind an authenticated identity. A token whose subject
    /// no longer exists is rejected rather than treated as either role.
    pub async fn resolve_actor(&self, actor: &AuthenticatedUser) -> Result<User, ServiceError> {
        self.repositories
            .users
            .find_user(actor.user_id)
            .await?
            .ok_or(ServiceError::InvalidActor)
    }

    /// Every expense for administrators, otherwise only the actor's own.
    pub async fn list_expenses_for(
        &self,
        actor: &AuthenticatedUser,
    ) -> Result<Vec<Expense>, ServiceError> {
        let user = self.resolve_actor(actor).await?;
        let scope = ExpenseScope::for_actor(&user);
        let expenses = match scope {
            ExpenseScope::All => self.repositories.expenses.find_all().await?,
            ExpenseScope::OwnedBy(owner_id) => {
                self.repositories.expenses.find_by_owner(owner_id).await?
            }
        };
        debug!(user_id = user.id, ?scope, count = expenses.len(), "listed expenses");
        Ok(expenses)
    }

    /// Validates and stores a new expense. The owner defaults to the actor;
    /// only administrators may record an expense for somebody else.
    pub async fn create_expense(
        &self,
        actor: &AuthenticatedUser,
        draft: ExpenseDraft,
    ) -> Result<Expense, ServiceError> {
        let user = self.resolve_actor(actor).await?;
        let owner_id = match draft.owner_id {
            Some(owner_id) if owner_id != user.id => {
                if !user.is_admin {
                    return Err(ServiceError::Forbidden);
                }
                owner_id
            }
            _ => user.id,
        };

        let validated = validate(&draft)?;
        let expense = self
            .repositories
            .expenses
            .insert(owner_id, &validated)
            .await?;
        info!(expense_id = expense.id, owner_id, "expense created");
        Ok(expense)
    }

    pub async fn get_expense(
        &self,
        actor: &AuthenticatedUser,
        expense_id: i64,
    ) -> Result<Expense, ServiceError> {
        let user = self.resolve_actor(actor).await?;
        self.find_accessible(&user, expense_id).await
    }

    /// Applies `changes` on top of the stored record and re-validates the
    /// whole expense before writing it back.
    pub async fn update_expense(
        &self,
        actor: &AuthenticatedUser,
        expense_id: i64,
        changes: ExpenseChanges,
    ) -> Result<Expense, ServiceError> {
        let user = self.resolve_actor(actor).await?;
        let existing = self.find_accessible(&user, expense_id).await?;

        let mut draft = ExpenseDraft::from(&existing);
        draft.apply(changes);
        let validated = validate(&draft)?;

        let expense = self
            .repositories
            .expenses
            .update(expense_id, &validated)
            .await?
            .ok_or(ServiceError::NotFound)?;
        info!(expense_id, owner_id = expense.owner_id, "expense updated");
        Ok(expense)
    }

    pub async fn delete_expense(
        &self,
        actor: &AuthenticatedUser,
        expense_id: i64,
    ) -> Result<(), ServiceError> {
        let user = self.resolve_actor(actor).await?;
        self.find_accessible(&user, expense_id).await?;

        if !self.repositories.expenses.delete(expense_id).await? {
            return Err(ServiceError::NotFound);
        }
        info!(expense_id, deleted_by = user.id, "expense deleted");
        Ok(())
    }

    /// Looks up the user an expense belongs to.
    pub async fn owner_of(&self, expense: &Expense) -> Result<User, ServiceError> {
        self.repositories
            .users
            .find_user(expense.owner_id)
            .await?
            .ok_or(ServiceError::Referential(expense.owner_id))
    }

    async fn find_accessible(&self, user: &User, expense_id: i64) -> Result<Expense, ServiceError> {
        let expense = self
            .repositories
            .expenses
            .find(expense_id)
            .await?
            .ok_or(ServiceError::NotFound)?;

        if !ExpenseScope::for_actor(user).permits(&expense) {
            return Err(ServiceError::Forbidden);
        }
        Ok(expense)
    }
}

fn validate(draft: &ExpenseDraft) -> Result<ValidatedExpense, ServiceError> {
    validate_expense(draft).map_err(|errors| {
        warn!(%errors, "expense rejected");
        ServiceError::Validation(errors)
    })
}

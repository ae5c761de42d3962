use rusqlite::{Connection, Row, ffi::SQLITE_CONSTRAINT_UNIQUE};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::{CategoryId, ensure_category_belongs_to},
    database_id::DatabaseId,
    money::Money,
    user::UserID,
};

pub type BudgetId = DatabaseId;

/// A monthly spending limit for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserID,
    pub category_id: CategoryId,
    /// The most the user wants to spend in the category in a month.
    pub limit: Money,
}

/// The request body for creating a budget.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudget {
    pub category_id: CategoryId,
    pub limit: Money,
}

/// The request body for changing a budget's limit.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetLimitForm {
    pub limit: Money,
}

/// Create a budget for one of the user's categories.
///
/// # Errors
/// Returns an:
/// - [Error::NegativeBudgetLimit] if the limit is below zero,
/// - [Error::AmountTooLarge] if the limit is larger than [Money::MAX],
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::DuplicateBudget] if the category already has a budget,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    user_id: UserID,
    new_budget: &NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    ensure_non_negative(new_budget.limit)?;
    ensure_category_belongs_to(user_id, Some(new_budget.category_id), connection)?;

    connection
        .execute(
            "INSERT INTO budget (user_id, category_id, amount_limit) VALUES (?1, ?2, ?3)",
            (user_id, new_budget.category_id, new_budget.limit),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateBudget(new_budget.category_id)
            }
            error => error.into(),
        })?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        category_id: new_budget.category_id,
        limit: new_budget.limit,
    })
}

pub fn get_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, amount_limit FROM budget WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((budget_id, user_id), map_budget_row)
        .map_err(Error::from)
}

pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, amount_limit FROM budget WHERE user_id = ?1 ORDER BY id ASC",
        )?
        .query_map((user_id,), map_budget_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Change the limit of one of the user's budgets.
///
/// # Errors
/// Returns an:
/// - [Error::NegativeBudgetLimit] if the limit is below zero,
/// - [Error::AmountTooLarge] if the limit is larger than [Money::MAX],
/// - [Error::UpdateMissingBudget] if the budget does not exist or belongs to another user,
/// - [Error::SqlError] if there is some other SQL error.
pub fn update_budget_limit(
    user_id: UserID,
    budget_id: BudgetId,
    limit: Money,
    connection: &Connection,
) -> Result<Budget, Error> {
    ensure_non_negative(limit)?;

    let rows_affected = connection.execute(
        "UPDATE budget SET amount_limit = ?1 WHERE id = ?2 AND user_id = ?3",
        (limit, budget_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    get_budget(user_id, budget_id, connection)
}

pub fn delete_budget(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (budget_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

fn ensure_non_negative(limit: Money) -> Result<(), Error> {
    if limit.is_negative() {
        Err(Error::NegativeBudgetLimit(limit))
    } else {
        limit.ensure_within_limit().map(|_| ())
    }
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount_limit INTEGER NOT NULL CHECK (amount_limit >= 0),
            UNIQUE(user_id, category_id),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub(super) fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        limit: row.get(3)?,
    })
}

//! Generates the transactions that recurring transactions are due to produce on a given day.
//!
//! The processor is meant to be run once a day by a scheduler, but running it
//! more than once for the same day is harmless: a recurring transaction never
//! produces more than one transaction per day.

use rusqlite::{Connection, ffi::SQLITE_CONSTRAINT_UNIQUE};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    recurring::core::{RecurringTransaction, get_active_recurring_transactions},
    transaction::{Transaction, create_transaction},
    user::UserID,
};

/// The outcome of one run of the recurring transaction processor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    /// The date transactions were generated for.
    pub date: Option<Date>,
    /// The number of transactions generated.
    pub created: usize,
    /// The number of due recurring transactions that had already been generated.
    pub skipped: usize,
    /// The number of due recurring transactions that could not be generated.
    pub failed: usize,
}

enum Outcome {
    Created(Transaction),
    AlreadyExists,
}

/// Generate the transactions due on `today` for every user.
///
/// Generated transactions are applied to the account of the recurring
/// transaction, just like transactions entered by hand.
///
/// # Errors
/// Returns an error if the recurring transactions cannot be read. Errors for
/// individual recurring transactions are logged and counted in
/// [ProcessSummary::failed].
pub fn process_recurring_transactions(
    today: Date,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    process_due(today, None, connection)
}

/// Generate the transactions due on `today` for the recurring transactions of `user_id`.
///
/// See [process_recurring_transactions].
pub fn process_recurring_transactions_for_user(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    process_due(today, Some(user_id), connection)
}

fn process_due(
    today: Date,
    user_id: Option<UserID>,
    connection: &Connection,
) -> Result<ProcessSummary, Error> {
    tracing::info!("Processing recurring transactions for {today}");

    let mut summary = ProcessSummary {
        date: Some(today),
        ..Default::default()
    };

    let due = get_active_recurring_transactions(today, user_id, connection)?
        .into_iter()
        .filter(|recurring| recurring.is_due_on(today));

    for recurring in due {
        match generate_transaction(&recurring, today, connection) {
            Ok(Outcome::Created(transaction)) => {
                tracing::info!(
                    "Created transaction {} from recurring transaction {} \"{}\" for user {}",
                    transaction.id,
                    recurring.id,
                    recurring.description,
                    recurring.user_id
                );
                summary.created += 1;
            }
            Ok(Outcome::AlreadyExists) => {
                tracing::info!(
                    "Skipped recurring transaction {} \"{}\" for user {}, already created for {today}",
                    recurring.id,
                    recurring.description,
                    recurring.user_id
                );
                summary.skipped += 1;
            }
            Err(error) => {
                tracing::error!(
                    "Could not create transaction from recurring transaction {}: {error}",
                    recurring.id
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        "Finished processing recurring transactions for {today}: {} created, {} skipped, {} failed",
        summary.created,
        summary.skipped,
        summary.failed
    );

    Ok(summary)
}

fn generate_transaction(
    recurring: &RecurringTransaction,
    today: Date,
    connection: &Connection,
) -> Result<Outcome, Error> {
    if transaction_exists(recurring, today, connection)? {
        return Ok(Outcome::AlreadyExists);
    }

    let builder = Transaction::build(
        recurring.kind,
        recurring.amount,
        today,
        &recurring.description,
    )
    .category_id(recurring.category_id)
    .account_id(recurring.account_id)
    .recurring_id(Some(recurring.id));

    match create_transaction(recurring.user_id, builder, connection) {
        Ok(transaction) => Ok(Outcome::Created(transaction)),
        // Another run created the transaction after the existence check.
        Err(Error::SqlError(rusqlite::Error::SqliteFailure(error, _)))
            if error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(Outcome::AlreadyExists)
        }
        Err(error) => Err(error),
    }
}

fn transaction_exists(
    recurring: &RecurringTransaction,
    date: Date,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM \"transaction\" WHERE recurring_id = ?1 AND date = ?2)",
            (recurring.id, date),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

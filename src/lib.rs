//! Finance Tracker is a service for tracking personal finances.
//!
//! Users record income and expenses, categorize them, keep the balances of
//! their bank and cash accounts up to date, track credit card statements and
//! compare their spending against monthly category budgets.
//!
//! This library provides the domain logic, the SQLite persistence and a JSON
//! API built on axum.

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

pub mod account;
mod app_state;
pub mod budget;
pub mod calendar;
pub mod category;
pub mod credit_card;
mod database_id;
pub mod date_range;
mod db;
pub mod endpoints;
mod logging;
mod money;
mod owner;
pub mod recurring;
mod routing;
mod timezone;
pub mod transaction;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use money::Money;
pub use recurring::{ProcessSummary, process_recurring_transactions};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};
pub use user::{User, UserID, count_users, create_user, get_user_by_id};

use crate::{
    account::AccountId, category::CategoryId, credit_card::CreditCardId,
    recurring::RecurringTransactionId,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not include a valid `x-user-id` header.
    #[error("the request must include the header x-user-id with a numeric user ID")]
    MissingOwner,

    /// The `x-user-id` header named a user that does not exist.
    #[error("there is no user with the ID {0}")]
    UnknownOwner(UserID),

    /// The username is already taken.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// A string could not be parsed as an amount of money.
    #[error("\"{0}\" is not a valid amount, expected a number with at most two decimal places")]
    InvalidAmount(String),

    /// Transactions and recurring transactions must have an amount greater than zero.
    ///
    /// Whether money comes in or goes out is determined by the transaction kind,
    /// not the sign of the amount.
    #[error("the amount {0} must be greater than zero")]
    NonPositiveAmount(Money),

    /// An amount larger than the largest amount that can be recorded.
    #[error("the amount {0} is too large, amounts must be at most 99999999.99")]
    AmountTooLarge(Money),

    /// A date calculation went past the range of dates that can be represented.
    #[error("dates around {0} are outside the supported range")]
    DateOutOfRange(Date),

    /// Budget limits cannot be negative.
    #[error("the budget limit {0} must not be negative")]
    NegativeBudgetLimit(Money),

    /// A day of the month outside of 1 to 31.
    #[error("{0} is not a valid day of the month, expected a number from 1 to 31")]
    InvalidDayOfMonth(u8),

    /// An empty string was used as a name.
    #[error("name cannot be empty")]
    EmptyName,

    /// A recurring transaction ends before it starts.
    #[error("the end date {end} is before the start date {start}")]
    EndBeforeStart {
        /// The first date of the schedule.
        start: Date,
        /// The requested last date of the schedule.
        end: Date,
    },

    /// The category ID does not refer to one of the user's categories.
    #[error("the category ID {0} does not refer to a valid category")]
    InvalidCategory(CategoryId),

    /// The account ID does not refer to one of the user's accounts.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// The credit card ID does not refer to one of the user's credit cards.
    #[error("the credit card ID {0} does not refer to a valid credit card")]
    InvalidCreditCard(CreditCardId),

    /// The user already has an account with this name.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The user already has a budget for this category.
    #[error("a budget for the category {0} already exists, edit the existing budget instead")]
    DuplicateBudget(CategoryId),

    /// A recurring transaction already generated a transaction on this date.
    #[error("the recurring transaction {recurring_id} already has a transaction on {date}")]
    DuplicateRecurringOccurrence {
        /// The recurring transaction the transactions were generated from.
        recurring_id: RecurringTransactionId,
        /// The date of the existing transaction.
        date: Date,
    },

    /// Tried to delete an account that transactions still refer to.
    ///
    /// Deleting the account would orphan the transactions and break the
    /// account balance, so the caller must move or delete them first.
    #[error("the account {0} still has transactions, move or delete them before deleting the account")]
    AccountHasTransactions(AccountId),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to delete a credit card that does not exist
    #[error("tried to delete a credit card that is not in the database")]
    DeleteMissingCreditCard,

    /// Tried to delete a recurring transaction that does not exist
    #[error("tried to delete a recurring transaction that is not in the database")]
    DeleteMissingRecurringTransaction,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingOwner | Error::UnknownOwner(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidAmount(_)
            | Error::NonPositiveAmount(_)
            | Error::AmountTooLarge(_)
            | Error::DateOutOfRange(_)
            | Error::NegativeBudgetLimit(_)
            | Error::InvalidDayOfMonth(_)
            | Error::EmptyName
            | Error::EndBeforeStart { .. }
            | Error::InvalidCategory(_)
            | Error::InvalidAccount(_)
            | Error::InvalidCreditCard(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateUsername(_)
            | Error::DuplicateAccountName(_)
            | Error::DuplicateBudget(_)
            | Error::DuplicateRecurringOccurrence { .. }
            | Error::AccountHasTransactions(_) => StatusCode::CONFLICT,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingAccount
            | Error::DeleteMissingAccount
            | Error::DeleteMissingCategory
            | Error::DeleteMissingCreditCard
            | Error::DeleteMissingRecurringTransaction
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::InvalidTimezoneError(_) | Error::DatabaseLockError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => error.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, Money};

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn conflicts_are_reported_to_the_client() {
        assert_eq!(
            Error::DuplicateBudget(1).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::AccountHasTransactions(1).into_response().status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn oversized_amounts_are_bad_requests() {
        assert_eq!(
            Error::AmountTooLarge(Money::MAX + Money::from_cents(1))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn lock_errors_are_internal() {
        assert_eq!(
            Error::DatabaseLockError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

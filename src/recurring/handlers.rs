//! Route handlers for recurring transactions.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    app_state::{DbConnection, lock_connection},
    recurring::{
        core::{
            NewRecurringTransaction, RecurringTransaction, RecurringTransactionId,
            create_recurring_transaction, delete_recurring_transaction,
            get_recurring_transaction, get_recurring_transactions,
        },
        processor::{ProcessSummary, process_recurring_transactions_for_user},
    },
    timezone::local_today,
    user::UserID,
};

/// The number of upcoming occurrences listed when the request does not say.
const DEFAULT_UPCOMING_COUNT: usize = 5;
const MAX_UPCOMING_COUNT: usize = 100;

/// The state needed to manage recurring transactions.
#[derive(Debug, Clone)]
pub struct RecurringState {
    pub db_connection: DbConnection,
    /// The timezone used to decide what day it is.
    pub local_timezone: String,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingQuery {
    pub count: Option<usize>,
}

/// The next dates a recurring transaction is due.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpcomingOccurrences {
    pub recurring_id: RecurringTransactionId,
    pub dates: Vec<Date>,
}

pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NewRecurringTransaction>,
) -> Result<(StatusCode, Json<RecurringTransaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let recurring = create_recurring_transaction(user_id, &form, &connection)?;

    Ok((StatusCode::CREATED, Json(recurring)))
}

pub async fn get_recurring_transactions_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<RecurringTransaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_transactions(user_id, &connection).map(Json)
}

pub async fn get_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_transaction(user_id, recurring_id, &connection).map(Json)
}

pub async fn delete_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_recurring_transaction(user_id, recurring_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler listing the next dates a recurring transaction is due, starting today.
pub async fn get_upcoming_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
    Path(recurring_id): Path<RecurringTransactionId>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<UpcomingOccurrences>, Error> {
    let today = local_today(&state.local_timezone)?;
    let count = query
        .count
        .unwrap_or(DEFAULT_UPCOMING_COUNT)
        .min(MAX_UPCOMING_COUNT);
    let connection = lock_connection(&state.db_connection)?;

    let recurring = get_recurring_transaction(user_id, recurring_id, &connection)?;
    let dates = recurring.occurrences_from(today).take(count).collect();

    Ok(Json(UpcomingOccurrences {
        recurring_id,
        dates,
    }))
}

/// A route handler that generates the user's recurring transactions due today.
pub async fn process_recurring_endpoint(
    State(state): State<RecurringState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<ProcessSummary>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    process_recurring_transactions_for_user(user_id, today, &connection).map(Json)
}

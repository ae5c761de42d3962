//! Route handlers for recording, editing and listing transactions.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::AccountId,
    app_state::{DbConnection, lock_connection},
    category::CategoryId,
    credit_card::CreditCardId,
    date_range::DateRangeQuery,
    money::Money,
    timezone::local_today,
    transaction::core::{
        PeriodTotals, Transaction, TransactionBuilder, TransactionId, TransactionKind,
        create_transaction, delete_transaction, get_period_totals, get_transaction,
        get_transactions_in_range, update_transaction,
    },
    user::UserID,
};

/// The state needed to manage transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: DbConnection,
    /// The timezone used to decide which month is the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The request body for creating or editing a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionForm {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The value of the transaction, e.g. "12.30".
    pub amount: Money,
    /// When the transaction ocurred.
    pub date: Date,
    /// Text detailing the transaction.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub credit_card_id: Option<CreditCardId>,
}

impl From<TransactionForm> for TransactionBuilder {
    fn from(form: TransactionForm) -> Self {
        Transaction::build(form.kind, form.amount, form.date, &form.description)
            .category_id(form.category_id)
            .account_id(form.account_id)
            .credit_card_id(form.credit_card_id)
    }
}

/// A route handler for recording a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(user_id, form.into(), &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing the user's transactions in a date range.
///
/// Lists the current month if the range is missing or invalid.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = query.resolve(today);
    let connection = lock_connection(&state.db_connection)?;

    get_transactions_in_range(user_id, range, &connection).map(Json)
}

/// A route handler for the income, expenses and net total over a date range.
pub async fn get_period_totals_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<PeriodTotals>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = query.resolve(today);
    let connection = lock_connection(&state.db_connection)?;

    get_period_totals(user_id, range, &connection).map(Json)
}

pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(user_id, transaction_id, &connection).map(Json)
}

/// A route handler for replacing the details of a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(form): Json<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(user_id, transaction_id, form.into(), &connection).map(Json)
}

pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(user_id, transaction_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

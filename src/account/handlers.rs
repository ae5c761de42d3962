//! Route handlers for accounts.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::core::{
        Account, AccountId, NewAccount, create_account, delete_account, get_account,
        get_accounts, get_total_account_balance, rename_account,
    },
    app_state::{DbConnection, lock_connection},
    money::Money,
    user::UserID,
};

/// The state needed to manage accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: DbConnection,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The user's accounts and their combined balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountsOverview {
    pub accounts: Vec<Account>,
    pub total_balance: Money,
}

/// The request body for renaming an account.
#[derive(Debug, Deserialize)]
pub struct RenameAccountForm {
    pub name: String,
}

/// A route handler for opening a new account.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NewAccount>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let account = create_account(user_id, &form, &connection).inspect_err(|error| {
        tracing::error!("Could not create account with {form:?}: {error}");
    })?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// A route handler for listing the user's accounts with their total balance.
pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<AccountsOverview>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let accounts = get_accounts(user_id, &connection)?;
    let total_balance = get_total_account_balance(user_id, &connection)?;

    Ok(Json(AccountsOverview {
        accounts,
        total_balance,
    }))
}

/// A route handler for getting a single account.
pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_account(user_id, account_id, &connection).map(Json)
}

/// A route handler for renaming an account.
pub async fn rename_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
    Json(form): Json<RenameAccountForm>,
) -> Result<Json<Account>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    rename_account(user_id, account_id, &form.name, &connection).map(Json)
}

/// A route handler for deleting an account.
///
/// Responds with 409 Conflict if transactions still refer to the account.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    Path(account_id): Path<AccountId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_account(user_id, account_id, &connection).inspect_err(|error| {
        tracing::warn!("Could not delete account {account_id}: {error}");
    })?;

    Ok(StatusCode::NO_CONTENT)
}

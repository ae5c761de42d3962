//! Route handlers for credit cards and their statements.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};

use crate::{
    AppState, Error,
    app_state::{DbConnection, lock_connection},
    credit_card::{
        core::{
            CreditCard, CreditCardId, NewCreditCard, create_credit_card, delete_credit_card,
            get_credit_card, get_credit_cards,
        },
        statement::{StatementSummary, get_statement_summary},
    },
    timezone::local_today,
    user::UserID,
};

/// The state needed to manage credit cards.
#[derive(Debug, Clone)]
pub struct CreditCardState {
    pub db_connection: DbConnection,
    /// The timezone used to decide which statement has most recently closed.
    pub local_timezone: String,
}

impl FromRef<AppState> for CreditCardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

pub async fn create_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NewCreditCard>,
) -> Result<(StatusCode, Json<CreditCard>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let card = create_credit_card(user_id, &form, &connection)?;

    Ok((StatusCode::CREATED, Json(card)))
}

pub async fn get_credit_cards_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<CreditCard>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_credit_cards(user_id, &connection).map(Json)
}

pub async fn get_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CreditCardId>,
) -> Result<Json<CreditCard>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_credit_card(user_id, card_id, &connection).map(Json)
}

pub async fn delete_credit_card_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CreditCardId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_credit_card(user_id, card_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for the balance due on the most recently closed statement.
pub async fn get_statement_endpoint(
    State(state): State<CreditCardState>,
    Extension(user_id): Extension<UserID>,
    Path(card_id): Path<CreditCardId>,
) -> Result<Json<StatementSummary>, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = lock_connection(&state.db_connection)?;

    let card = get_credit_card(user_id, card_id, &connection)?;

    get_statement_summary(&card, today, &connection).map(Json)
}

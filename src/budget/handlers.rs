//! Route handlers for budgets.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    app_state::{DbConnection, lock_connection},
    budget::{
        core::{
            Budget, BudgetId, BudgetLimitForm, NewBudget, create_budget, delete_budget,
            get_budgets, update_budget_limit,
        },
        progress::{BudgetProgress, get_budget_progress},
    },
    date_range::{DateRange, DateRangeQuery},
    timezone::local_today,
    user::UserID,
};

/// The state needed to manage budgets.
#[derive(Debug, Clone)]
pub struct BudgetState {
    pub db_connection: DbConnection,
    /// The timezone used to decide which month is the current month.
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The progress of every budget over one period.
#[derive(Debug, Serialize, Deserialize)]
pub struct BudgetProgressReport {
    pub range: DateRange,
    pub budgets: Vec<BudgetProgress>,
}

pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<NewBudget>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let connection = lock_connection(&state.db_connection)?;

    let budget = create_budget(user_id, &form, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn get_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_budgets(user_id, &connection).map(Json)
}

pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Json(form): Json<BudgetLimitForm>,
) -> Result<Json<Budget>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    update_budget_limit(user_id, budget_id, form.limit, &connection).map(Json)
}

pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_budget(user_id, budget_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for budget progress over a date range, the current month by default.
pub async fn get_budget_progress_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<BudgetProgressReport>, Error> {
    let today = local_today(&state.local_timezone)?;
    let range = query.resolve(today);
    let connection = lock_connection(&state.db_connection)?;

    let budgets = get_budget_progress(user_id, range, &connection)?;

    Ok(Json(BudgetProgressReport { range, budgets }))
}

//! Route handlers for categories.

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    app_state::{DbConnection, lock_connection},
    category::core::{
        Category, CategoryId, CategoryName, create_category, delete_category, get_categories,
    },
    user::UserID,
};

/// The state needed to manage categories.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: DbConnection,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let name = CategoryName::new(&form.name)?;
    let connection = lock_connection(&state.db_connection)?;

    let category = create_category(user_id, name, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// A route handler for listing the user's categories.
pub async fn get_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Category>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_categories(user_id, &connection).map(Json)
}

/// A route handler for deleting a category.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    Path(category_id): Path<CategoryId>,
) -> Result<StatusCode, Error> {
    let connection = lock_connection(&state.db_connection)?;

    delete_category(user_id, category_id, &connection).inspect_err(|error| {
        tracing::error!("Could not delete category {category_id}: {error}");
    })?;

    Ok(StatusCode::NO_CONTENT)
}

//! Middleware that resolves the user that owns the records a request works on.
//!
//! Every owner-scoped route expects the header `x-user-id`. The user ID is
//! checked against the database and placed into the request extensions, so
//! route handlers receive it with `Extension(user_id): Extension<UserID>` and
//! pass it explicitly to every query.

use axum::{
    extract::{FromRef, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState, Error,
    app_state::{DbConnection, lock_connection},
    user::{UserID, get_user_by_id},
};

/// The name of the header that carries the owner's user ID.
pub const OWNER_HEADER: &str = "x-user-id";

/// The state needed to resolve the owner of a request.
#[derive(Debug, Clone)]
pub struct OwnerState {
    pub db_connection: DbConnection,
}

impl FromRef<AppState> for OwnerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Middleware function that rejects requests without a valid owner.
///
/// Responds with 401 Unauthorized if the header is missing, malformed or
/// names a user that does not exist.
pub async fn owner_guard(
    State(state): State<OwnerState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match parse_owner_header(request.headers()) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    if let Err(error) = check_user_exists(user_id, &state.db_connection) {
        return error.into_response();
    }

    request.extensions_mut().insert(user_id);

    next.run(request).await
}

fn parse_owner_header(headers: &HeaderMap) -> Result<UserID, Error> {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .map(UserID::new)
        .ok_or(Error::MissingOwner)
}

fn check_user_exists(user_id: UserID, db_connection: &DbConnection) -> Result<(), Error> {
    let connection = lock_connection(db_connection)?;

    match get_user_by_id(user_id, &connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => {
            tracing::warn!("Rejected request for unknown user {user_id}");
            Err(Error::UnknownOwner(user_id))
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use crate::{Error, user::UserID};

    use super::{OWNER_HEADER, parse_owner_header};

    #[test]
    fn parses_numeric_header() {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static(" 7 "));

        assert_eq!(parse_owner_header(&headers), Ok(UserID::new(7)));
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert_eq!(parse_owner_header(&HeaderMap::new()), Err(Error::MissingOwner));

        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static("bob"));
        assert_eq!(parse_owner_header(&headers), Err(Error::MissingOwner));
    }
}

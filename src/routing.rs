//! Application router configuration with owner-scoped and public route definitions.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, get_account_endpoint,
        get_accounts_endpoint, rename_account_endpoint,
    },
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budget_progress_endpoint,
        get_budgets_endpoint, update_budget_endpoint,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint},
    credit_card::{
        create_credit_card_endpoint, delete_credit_card_endpoint, get_credit_card_endpoint,
        get_credit_cards_endpoint, get_statement_endpoint,
    },
    endpoints,
    owner::owner_guard,
    recurring::{
        create_recurring_endpoint, delete_recurring_endpoint, get_recurring_endpoint,
        get_recurring_transactions_endpoint, get_upcoming_endpoint, process_recurring_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_period_totals_endpoint,
        get_transaction_endpoint, get_transactions_endpoint, update_transaction_endpoint,
    },
    user::create_user_endpoint,
};

/// Return a router with all the app's routes.
///
/// Every route except user registration requires the `x-user-id` header.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new().route(endpoints::USERS, post(create_user_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(get_categories_endpoint).post(create_category_endpoint),
        )
        .route(endpoints::CATEGORY, delete(delete_category_endpoint))
        .route(
            endpoints::ACCOUNTS,
            get(get_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .put(rename_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_SUMMARY,
            get(get_period_totals_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::CREDIT_CARDS,
            get(get_credit_cards_endpoint).post(create_credit_card_endpoint),
        )
        .route(
            endpoints::CREDIT_CARD,
            get(get_credit_card_endpoint).delete(delete_credit_card_endpoint),
        )
        .route(endpoints::CREDIT_CARD_STATEMENT, get(get_statement_endpoint))
        .route(
            endpoints::RECURRING_TRANSACTIONS,
            get(get_recurring_transactions_endpoint).post(create_recurring_endpoint),
        )
        .route(endpoints::PROCESS_RECURRING, post(process_recurring_endpoint))
        .route(
            endpoints::RECURRING_TRANSACTION,
            get(get_recurring_endpoint).delete(delete_recurring_endpoint),
        )
        .route(endpoints::RECURRING_UPCOMING, get(get_upcoming_endpoint))
        .route(
            endpoints::BUDGETS,
            get(get_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET_PROGRESS,
            get(get_budget_progress_endpoint),
        )
        .route(
            endpoints::BUDGET,
            put(update_budget_endpoint).delete(delete_budget_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), owner_guard));

    protected_routes
        .merge(unprotected_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        account::Account,
        endpoints::{self, format_endpoint},
        money::Money,
        owner::OWNER_HEADER,
        transaction::Transaction,
        user::User,
    };

    use super::build_router;

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        let state = AppState::new(connection, "Etc/UTC").expect("Could not create app state");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    fn owner(user: &User) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(OWNER_HEADER),
            HeaderValue::from_str(&user.id.to_string()).unwrap(),
        )
    }

    async fn register(server: &TestServer, username: &str) -> User {
        let response = server
            .post(endpoints::USERS)
            .json(&json!({ "username": username }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.json::<User>()
    }

    #[tokio::test]
    async fn owner_header_is_required() {
        let server = get_test_server();

        let response = server.get(endpoints::ACCOUNTS).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body = response.json::<Value>();
        assert!(body["error"].as_str().unwrap().contains("x-user-id"));
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected() {
        let server = get_test_server();

        server
            .get(endpoints::ACCOUNTS)
            .add_header(
                HeaderName::from_static(OWNER_HEADER),
                HeaderValue::from_static("42"),
            )
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let server = get_test_server();
        register(&server, "alice").await;

        server
            .post(endpoints::USERS)
            .json(&json!({ "username": "alice" }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn transactions_update_account_balance() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let account = server
            .post(endpoints::ACCOUNTS)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "Bank", "opening_balance": "100.00" }))
            .await
            .json::<Account>();

        let transaction = server
            .post(endpoints::TRANSACTIONS)
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "kind": "expense",
                "amount": "25.50",
                "date": "2025-10-04",
                "description": "Groceries",
                "account_id": account.id,
            }))
            .await
            .json::<Transaction>();

        let account_url = format_endpoint(endpoints::ACCOUNT, account.id);
        let balance = server
            .get(&account_url)
            .add_header(name.clone(), value.clone())
            .await
            .json::<Account>()
            .balance;
        assert_eq!(balance, Money::from_cents(7_450));

        server
            .delete(&account_url)
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .delete(&format_endpoint(endpoints::TRANSACTION, transaction.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let balance = server
            .get(&account_url)
            .add_header(name, value)
            .await
            .json::<Account>()
            .balance;
        assert_eq!(balance, Money::from_cents(10_000));
    }

    #[tokio::test]
    async fn invalid_amount_is_a_bad_request() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        server
            .post(endpoints::TRANSACTIONS)
            .add_header(name, value)
            .json(&json!({
                "kind": "income",
                "amount": "0",
                "date": "2025-10-04",
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_amount_is_rejected() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let account = server
            .post(endpoints::ACCOUNTS)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "Bank", "opening_balance": "10" }))
            .await
            .json::<Account>();

        let response = server
            .post(endpoints::TRANSACTIONS)
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "kind": "income",
                "amount": "9000000000000000.00",
                "date": "2025-10-04",
                "account_id": account.id,
            }))
            .await;
        assert!(response.status_code().is_client_error());

        let balance = server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_header(name, value)
            .await
            .json::<Account>()
            .balance;
        assert_eq!(balance, Money::from_cents(1_000));
    }

    #[tokio::test]
    async fn records_are_scoped_to_owner() {
        let server = get_test_server();
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let (alice_name, alice_value) = owner(&alice);
        let (bob_name, bob_value) = owner(&bob);

        let account = server
            .post(endpoints::ACCOUNTS)
            .add_header(alice_name, alice_value)
            .json(&json!({ "name": "Bank" }))
            .await
            .json::<Account>();

        server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_header(bob_name.clone(), bob_value.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .post(endpoints::TRANSACTIONS)
            .add_header(bob_name, bob_value)
            .json(&json!({
                "kind": "income",
                "amount": "1",
                "date": "2025-10-04",
                "account_id": account.id,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_budget_is_a_conflict() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let category = server
            .post(endpoints::CATEGORIES)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "Groceries" }))
            .await
            .json::<Value>();
        let budget = json!({ "category_id": category["id"], "limit": "400" });

        server
            .post(endpoints::BUDGETS)
            .add_header(name.clone(), value.clone())
            .json(&budget)
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::BUDGETS)
            .add_header(name.clone(), value.clone())
            .json(&budget)
            .await
            .assert_status(StatusCode::CONFLICT);

        let progress = server
            .get(endpoints::BUDGET_PROGRESS)
            .add_header(name, value)
            .await
            .json::<Value>();
        assert_eq!(progress["budgets"][0]["spent"], "0.00");
        assert_eq!(progress["budgets"][0]["over_limit"], false);
    }

    #[tokio::test]
    async fn credit_card_statement() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let card = server
            .post(endpoints::CREDIT_CARDS)
            .add_header(name.clone(), value.clone())
            .json(&json!({ "name": "Visa", "closing_day": 25, "due_day": 10 }))
            .await
            .json::<Value>();
        let card_id = card["id"].as_i64().unwrap();

        let statement = server
            .get(&format_endpoint(endpoints::CREDIT_CARD_STATEMENT, card_id))
            .add_header(name.clone(), value.clone())
            .await
            .json::<Value>();
        assert_eq!(statement["balance_due"], "0.00");

        server
            .post(endpoints::CREDIT_CARDS)
            .add_header(name, value)
            .json(&json!({ "name": "Amex", "closing_day": 32, "due_day": 10 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recurring_upcoming_and_processing() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let recurring = server
            .post(endpoints::RECURRING_TRANSACTIONS)
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "kind": "expense",
                "amount": "1200",
                "description": "Rent",
                "frequency": "monthly",
                "start_date": "2020-01-31",
            }))
            .await
            .json::<Value>();
        let recurring_id = recurring["id"].as_i64().unwrap();

        let upcoming = server
            .get(&format_endpoint(endpoints::RECURRING_UPCOMING, recurring_id))
            .add_header(name.clone(), value.clone())
            .add_query_param("count", 3)
            .await
            .json::<Value>();
        assert_eq!(upcoming["dates"].as_array().unwrap().len(), 3);

        let first = server
            .post(endpoints::PROCESS_RECURRING)
            .add_header(name.clone(), value.clone())
            .await
            .json::<Value>();
        let second = server
            .post(endpoints::PROCESS_RECURRING)
            .add_header(name, value)
            .await
            .json::<Value>();
        assert_eq!(second["created"], 0);
        assert_eq!(second["skipped"], first["created"]);
    }

    #[tokio::test]
    async fn upcoming_occurrences_near_last_supported_date() {
        let server = get_test_server();
        let user = register(&server, "alice").await;
        let (name, value) = owner(&user);

        let recurring = server
            .post(endpoints::RECURRING_TRANSACTIONS)
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "kind": "expense",
                "amount": "10",
                "frequency": "monthly",
                "start_date": "9999-12-15",
            }))
            .await
            .json::<Value>();
        let recurring_id = recurring["id"].as_i64().unwrap();

        let upcoming = server
            .get(&format_endpoint(endpoints::RECURRING_UPCOMING, recurring_id))
            .add_header(name.clone(), value.clone())
            .await;
        upcoming.assert_status_ok();
        assert_eq!(upcoming.json::<Value>()["dates"], json!(["9999-12-15"]));

        server
            .get(endpoints::RECURRING_TRANSACTIONS)
            .add_header(name, value)
            .await
            .assert_status_ok();
    }
}

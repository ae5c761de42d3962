//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{account_id}', use [format_endpoint].

/// The route to register users.
pub const USERS: &str = "/api/users";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to delete a category.
pub const CATEGORY: &str = "/api/categories/{category_id}";

/// The route to list and open accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route to get, rename or delete an account.
pub const ACCOUNT: &str = "/api/accounts/{account_id}";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to get, edit or delete a transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for the income, expense and net totals over a period.
pub const TRANSACTION_SUMMARY: &str = "/api/transactions/summary";

/// The route to list and add credit cards.
pub const CREDIT_CARDS: &str = "/api/credit_cards";
/// The route to get or delete a credit card.
pub const CREDIT_CARD: &str = "/api/credit_cards/{card_id}";
/// The route for the balance due on a card's most recently closed statement.
pub const CREDIT_CARD_STATEMENT: &str = "/api/credit_cards/{card_id}/statement";

/// The route to list and create recurring transactions.
pub const RECURRING_TRANSACTIONS: &str = "/api/recurring";
/// The route to get or delete a recurring transaction.
pub const RECURRING_TRANSACTION: &str = "/api/recurring/{recurring_id}";
/// The route for the next dates a recurring transaction is due.
pub const RECURRING_UPCOMING: &str = "/api/recurring/{recurring_id}/upcoming";
/// The route to generate the recurring transactions due today.
pub const PROCESS_RECURRING: &str = "/api/recurring/process";

/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to change the limit of or delete a budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route for the progress of every budget over a period.
pub const BUDGET_PROGRESS: &str = "/api/budgets/progress";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

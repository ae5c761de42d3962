//! Monthly spending limits per category and the progress towards them.

mod core;
mod handlers;
mod progress;

pub use core::{
    Budget, BudgetId, BudgetLimitForm, NewBudget, create_budget, create_budget_table,
    delete_budget, get_budget, get_budgets, update_budget_limit,
};
pub use handlers::{
    BudgetProgressReport, create_budget_endpoint, delete_budget_endpoint,
    get_budget_progress_endpoint, get_budgets_endpoint, update_budget_endpoint,
};
pub use progress::{BudgetProgress, get_budget_progress, spent_percent};

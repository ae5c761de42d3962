//! Categories for grouping transactions, recurring transactions and budgets.

mod core;
mod handlers;

pub use core::{
    Category, CategoryId, CategoryName, create_category, create_category_table, delete_category,
    ensure_category_belongs_to, get_categories, get_category,
};
pub use handlers::{create_category_endpoint, delete_category_endpoint, get_categories_endpoint};

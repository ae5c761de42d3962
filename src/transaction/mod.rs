//! Transaction management.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions,
//!   which keep the balance of the linked account up to date
//! - Route handlers for the transaction API

mod core;
mod handlers;

pub use core::{
    PeriodTotals, Transaction, TransactionBuilder, TransactionId, TransactionKind,
    create_transaction, create_transaction_table, delete_transaction, get_period_totals,
    get_transaction, get_transactions_in_range, map_transaction_row, update_transaction,
};
pub use handlers::{
    TransactionForm, create_transaction_endpoint, delete_transaction_endpoint,
    get_period_totals_endpoint, get_transaction_endpoint, get_transactions_endpoint,
    update_transaction_endpoint,
};

#[cfg(test)]
pub use core::count_transactions;

//! Recurring transactions, such as rent or a salary, and the processor that
//! turns them into transactions when they are due.

mod core;
mod handlers;
mod processor;

pub use core::{
    Frequency, NewRecurringTransaction, RecurringTransaction, RecurringTransactionId,
    create_recurring_transaction, create_recurring_transaction_table,
    delete_recurring_transaction, get_active_recurring_transactions, get_recurring_transaction,
    get_recurring_transactions,
};
pub use handlers::{
    create_recurring_endpoint, delete_recurring_endpoint, get_recurring_endpoint,
    get_recurring_transactions_endpoint, get_upcoming_endpoint, process_recurring_endpoint,
};
pub use processor::{
    ProcessSummary, process_recurring_transactions, process_recurring_transactions_for_user,
};

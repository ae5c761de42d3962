//! Credit cards and the balance due on their monthly statements.

mod core;
mod handlers;
mod statement;

pub use core::{
    CreditCard, CreditCardId, NewCreditCard, create_credit_card, create_credit_card_table,
    delete_credit_card, ensure_credit_card_belongs_to, get_credit_card, get_credit_cards,
};
pub use handlers::{
    create_credit_card_endpoint, delete_credit_card_endpoint, get_credit_card_endpoint,
    get_credit_cards_endpoint, get_statement_endpoint,
};
pub use statement::{
    StatementSummary, StatementWindow, get_balance_due, get_statement_summary, payment_due_date,
    statement_window,
};

//! Bank and cash accounts, and the ledger that keeps their balances up to date.

mod core;
mod handlers;
pub mod ledger;

pub use core::{
    Account, AccountId, NewAccount, create_account, create_account_table, delete_account,
    ensure_account_belongs_to, get_account, get_accounts, get_total_account_balance,
    rename_account,
};
pub use handlers::{
    create_account_endpoint, delete_account_endpoint, get_account_endpoint,
    get_accounts_endpoint, rename_account_endpoint,
};

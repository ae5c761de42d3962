//! Keeps account balances in step with the transactions linked to them.
//!
//! An account's stored balance is its opening balance plus the signed amount
//! of every transaction linked to it: income adds to the balance and expenses
//! subtract from it. Balances are adjusted incrementally with
//! `balance = balance + delta` so that concurrent writers never overwrite each
//! other's changes with a stale value.
//!
//! Callers should run the ledger functions in the same SQL transaction as the
//! change to the transaction record so that the two cannot diverge.

use rusqlite::{Connection, OptionalExtension};

use crate::{
    Error, account::core::AccountId, money::Money, transaction::TransactionKind, user::UserID,
};

/// The change in account balance caused by a transaction.
pub fn signed_amount(kind: TransactionKind, amount: Money) -> Money {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// Apply the effect of a transaction to `account_id`.
///
/// Does nothing if the transaction is not linked to an account.
///
/// # Errors
/// Returns an [Error::InvalidAccount] if the account does not exist or belongs
/// to another user.
pub fn apply_effect(
    user_id: UserID,
    account_id: Option<AccountId>,
    kind: TransactionKind,
    amount: Money,
    connection: &Connection,
) -> Result<(), Error> {
    match account_id {
        Some(account_id) => {
            adjust_balance(user_id, account_id, signed_amount(kind, amount), connection)
        }
        None => Ok(()),
    }
}

/// Undo the effect of a transaction on `account_id`.
///
/// Does nothing if the transaction is not linked to an account.
///
/// # Errors
/// Returns an [Error::InvalidAccount] if the account does not exist or belongs
/// to another user.
pub fn reverse_effect(
    user_id: UserID,
    account_id: Option<AccountId>,
    kind: TransactionKind,
    amount: Money,
    connection: &Connection,
) -> Result<(), Error> {
    match account_id {
        Some(account_id) => {
            adjust_balance(user_id, account_id, -signed_amount(kind, amount), connection)
        }
        None => Ok(()),
    }
}

fn adjust_balance(
    user_id: UserID,
    account_id: AccountId,
    delta: Money,
    connection: &Connection,
) -> Result<(), Error> {
    // SQLite turns integers that overflow into floats instead of failing.
    let balance_type: Option<String> = connection
        .query_row(
            "UPDATE account SET balance = balance + ?1 WHERE id = ?2 AND user_id = ?3 \
             RETURNING typeof(balance)",
            (delta, account_id, user_id),
            |row| row.get(0),
        )
        .optional()?;

    match balance_type.as_deref() {
        None => return Err(Error::InvalidAccount(account_id)),
        Some("integer") => {}
        Some(_) => {
            tracing::warn!("Adjusting the balance of account {account_id} by {delta} overflowed");
            return Err(Error::AmountTooLarge(delta));
        }
    }

    tracing::debug!("Adjusted balance of account {account_id} by {delta}");

    Ok(())
}

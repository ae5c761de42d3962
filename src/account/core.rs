use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, database_id::DatabaseId, money::Money, user::UserID};

pub type AccountId = DatabaseId;

/// A bank account or cash wallet with a running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The name of the account, unique for each user.
    pub name: String,
    /// The current balance.
    ///
    /// This is the opening balance plus the effect of every transaction linked
    /// to the account. It is only ever changed through the ledger functions in
    /// [crate::account::ledger].
    pub balance: Money,
}

/// The data needed to open a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// The name of the account.
    pub name: String,
    /// The balance of the account before any transactions are recorded.
    #[serde(default)]
    pub opening_balance: Money,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;
    let balance = row.get(3)?;

    Ok(Account {
        id,
        user_id,
        name,
        balance,
    })
}

/// Create an account for `user_id`.
///
/// # Errors
/// Returns an:
/// - [Error::EmptyName] if the account name is empty,
/// - [Error::AmountTooLarge] if the opening balance is larger than [Money::MAX],
/// - [Error::DuplicateAccountName] if the user already has an account with the same name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    user_id: UserID,
    new_account: &NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_account_name(&new_account.name)?;
    new_account.opening_balance.ensure_within_limit()?;

    connection
        .execute(
            "INSERT INTO account (user_id, name, balance) VALUES (?1, ?2, ?3)",
            (user_id, &name, new_account.opening_balance),
        )
        .map_err(|error| map_duplicate_name_error(error, &name))?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        user_id,
        name,
        balance: new_account.opening_balance,
    })
}

/// Retrieve one of the user's accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, user_id, name, balance FROM account WHERE id = ?1 AND user_id = ?2")?
        .query_row((account_id, user_id), map_row_to_account)
        .map_err(Error::from)
}

/// Retrieve the user's accounts ordered by name.
pub fn get_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, balance FROM account WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map((user_id,), map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Change the name of one of the user's accounts.
///
/// The balance cannot be edited directly, it only changes through transactions.
///
/// # Errors
/// Returns an:
/// - [Error::UpdateMissingAccount] if the account does not exist or belongs to another user,
/// - [Error::DuplicateAccountName] if the user already has an account with the new name,
/// - [Error::SqlError] if there is some other SQL error.
pub fn rename_account(
    user_id: UserID,
    account_id: AccountId,
    name: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_account_name(name)?;

    let rows_affected = connection
        .execute(
            "UPDATE account SET name = ?1 WHERE id = ?2 AND user_id = ?3",
            (&name, account_id, user_id),
        )
        .map_err(|error| map_duplicate_name_error(error, &name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    get_account(user_id, account_id, connection)
}

/// Delete one of the user's accounts.
///
/// Accounts that transactions still refer to are not deleted, since the
/// transactions would otherwise lose the account their amounts were applied to.
/// Recurring transactions that post to the account are detached from it.
///
/// # Errors
/// Returns an:
/// - [Error::DeleteMissingAccount] if the account does not exist or belongs to another user,
/// - [Error::AccountHasTransactions] if any transaction refers to the account,
/// - [Error::SqlError] if there is some other SQL error.
pub fn delete_account(
    user_id: UserID,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    match get_account(user_id, account_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::DeleteMissingAccount),
        Err(error) => return Err(error),
    }

    let transaction_count: i64 = connection.query_row(
        "SELECT COUNT(id) FROM \"transaction\" WHERE account_id = ?1",
        (account_id,),
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::AccountHasTransactions(account_id));
    }

    connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (account_id, user_id),
    )?;

    Ok(())
}

/// Get the total balance across all of the user's accounts.
///
/// # Errors
/// Returns [Error] if:
/// - Database connection fails
/// - SQL query preparation or execution fails
pub fn get_total_account_balance(user_id: UserID, connection: &Connection) -> Result<Money, Error> {
    let mut stmt =
        connection.prepare("SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1")?;

    let total: Money = stmt.query_row((user_id,), |row| row.get(0))?;

    Ok(total)
}

/// Check that `account_id`, if given, refers to one of the user's accounts.
///
/// # Errors
/// Returns [Error::InvalidAccount] if the account does not exist or belongs to another user.
pub fn ensure_account_belongs_to(
    user_id: UserID,
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(account_id) = account_id else {
        return Ok(());
    };

    match get_account(user_id, account_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidAccount(account_id)),
        Err(error) => Err(error),
    }
}

fn validate_account_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else {
        Ok(name.to_owned())
    }
}

fn map_duplicate_name_error(error: rusqlite::Error, name: &str) -> Error {
    match error {
        // Handle unique account name constraint violation
        rusqlite::Error::SqliteFailure(error, Some(_))
            if error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateAccountName(name.to_owned())
        }
        error => error.into(),
    }
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use crate::user::create_user_table;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_user_table(&connection).unwrap();

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}

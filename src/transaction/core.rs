//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row,
    ffi::SQLITE_CONSTRAINT_UNIQUE,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountId, ensure_account_belongs_to, ledger},
    category::{CategoryId, ensure_category_belongs_to},
    credit_card::{CreditCardId, ensure_credit_card_belongs_to},
    database_id::DatabaseId,
    date_range::DateRange,
    money::Money,
    recurring::RecurringTransactionId,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

pub type TransactionId = DatabaseId;

/// Whether a transaction brings money in or takes money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserID,
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,
    /// The amount of money spent or earned in this transaction, always positive.
    pub amount: Money,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
    /// The account the money came out of or went into.
    pub account_id: Option<AccountId>,
    /// The credit card used to pay for an expense.
    pub credit_card_id: Option<CreditCardId>,
    /// The recurring transaction that generated this transaction.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionKind,
        amount: Money,
        date: Date,
        description: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            amount,
            date,
            description: description.to_owned(),
            category_id: None,
            account_id: None,
            credit_card_id: None,
            recurring_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::{money::Money, transaction::{Transaction, TransactionKind}};
///
/// let builder = Transaction::build(
///         TransactionKind::Expense,
///         Money::from_cents(4_599),
///         date!(2025-01-15),
///         "Coffee beans",
///     )
///     .category_id(Some(3))
///     .account_id(Some(1));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// Whether the money was earned or spent.
    pub kind: TransactionKind,

    /// The monetary amount of the transaction.
    ///
    /// Must be greater than zero, the direction of the money is given by `kind`.
    pub amount: Money,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The category of the transaction, e.g. "Groceries", "Transport", "Rent".
    pub category_id: Option<CategoryId>,

    /// The account to debit or credit.
    ///
    /// Transactions without an account do not affect any account balance.
    pub account_id: Option<AccountId>,

    /// The credit card the expense was charged to.
    pub credit_card_id: Option<CreditCardId>,

    /// The recurring transaction this transaction was generated from.
    ///
    /// Only set by the recurring transaction processor.
    pub recurring_id: Option<RecurringTransactionId>,
}

impl TransactionBuilder {
    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Set the account ID for the transaction.
    pub fn account_id(mut self, account_id: Option<AccountId>) -> Self {
        self.account_id = account_id;
        self
    }

    /// Set the credit card ID for the transaction.
    pub fn credit_card_id(mut self, credit_card_id: Option<CreditCardId>) -> Self {
        self.credit_card_id = credit_card_id;
        self
    }

    /// Set the recurring transaction ID for the transaction.
    pub fn recurring_id(mut self, recurring_id: Option<RecurringTransactionId>) -> Self {
        self.recurring_id = recurring_id;
        self
    }

    /// Check the amount and that every referenced record belongs to `user_id`.
    fn validate(&self, user_id: UserID, connection: &Connection) -> Result<(), Error> {
        if !self.amount.is_positive() {
            return Err(Error::NonPositiveAmount(self.amount));
        }
        self.amount.ensure_within_limit()?;

        ensure_category_belongs_to(user_id, self.category_id, connection)?;
        ensure_account_belongs_to(user_id, self.account_id, connection)?;
        ensure_credit_card_belongs_to(user_id, self.credit_card_id, connection)?;

        Ok(())
    }
}

/// The income, expenses and their difference over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub range: DateRange,
    pub income: Money,
    pub expenses: Money,
    /// Income minus expenses.
    pub net: Money,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, kind, amount, date, description, category_id, \
    account_id, credit_card_id, recurring_id";

/// Create a new transaction for `user_id` and apply it to the linked account.
///
/// The insert and the balance update happen in one SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::AmountTooLarge] if the amount is larger than [Money::MAX] or
///   would overflow the account balance,
/// - [Error::InvalidCategory], [Error::InvalidAccount] or [Error::InvalidCreditCard]
///   if a referenced record does not belong to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate(user_id, connection)?;

    let sql_transaction = connection.unchecked_transaction()?;

    let transaction = sql_transaction
        .prepare(&format!(
            "INSERT INTO \"transaction\" \
                (user_id, kind, amount, date, description, category_id, account_id, credit_card_id, recurring_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                builder.kind,
                builder.amount,
                builder.date,
                &builder.description,
                builder.category_id,
                builder.account_id,
                builder.credit_card_id,
                builder.recurring_id,
            ),
            map_transaction_row,
        )?;

    ledger::apply_effect(
        user_id,
        transaction.account_id,
        transaction.kind,
        transaction.amount,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(transaction)
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_one((id, user_id), map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve the user's transactions dated within `range`, newest first.
pub fn get_transactions_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 \
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((user_id, range.start, range.end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Replace the details of one of the user's transactions.
///
/// The effect of the old version on its account (if any) is reversed before the
/// effect of the new version is applied to its account (if any), so editing a
/// transaction has the same effect on balances as deleting it and creating
/// the new version. The recurring source of the transaction is kept.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - the same validation errors as [create_transaction],
/// - [Error::DuplicateRecurringOccurrence] if the transaction was generated from a
///   recurring transaction that already has a transaction on the new date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let old = match get_transaction(user_id, id, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    builder.validate(user_id, connection)?;

    let sql_transaction = connection.unchecked_transaction()?;

    ledger::reverse_effect(user_id, old.account_id, old.kind, old.amount, &sql_transaction)?;

    let updated = sql_transaction
        .prepare(&format!(
            "UPDATE \"transaction\" SET \
                kind = ?1, \
                amount = ?2, \
                date = ?3, \
                description = ?4, \
                category_id = ?5, \
                account_id = ?6, \
                credit_card_id = ?7 \
             WHERE id = ?8 AND user_id = ?9 \
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.kind,
                builder.amount,
                builder.date,
                &builder.description,
                builder.category_id,
                builder.account_id,
                builder.credit_card_id,
                id,
                user_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| match (error, old.recurring_id) {
            (rusqlite::Error::SqliteFailure(sql_error, _), Some(recurring_id))
                if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateRecurringOccurrence {
                    recurring_id,
                    date: builder.date,
                }
            }
            (error, _) => error.into(),
        })?;

    ledger::apply_effect(
        user_id,
        updated.account_id,
        updated.kind,
        updated.amount,
        &sql_transaction,
    )?;

    sql_transaction.commit()?;

    Ok(updated)
}

/// Delete one of the user's transactions after reversing its effect on its account.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = match get_transaction(user_id, id, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(Error::DeleteMissingTransaction),
        Err(error) => return Err(error),
    };

    let sql_transaction = connection.unchecked_transaction()?;

    ledger::reverse_effect(
        user_id,
        transaction.account_id,
        transaction.kind,
        transaction.amount,
        &sql_transaction,
    )?;

    sql_transaction.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    sql_transaction.commit()?;

    Ok(())
}

/// Sum the user's income and expenses dated within `range`.
pub fn get_period_totals(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<PeriodTotals, Error> {
    let (income, expenses): (Money, Money) = connection.query_row(
        "SELECT \
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount END), 0), \
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0) \
         FROM \"transaction\" \
         WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        (user_id, range.start, range.end),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(PeriodTotals {
        range,
        income,
        expenses,
        net: income - expenses,
    })
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
                amount INTEGER NOT NULL CHECK (amount > 0),
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id INTEGER,
                account_id INTEGER,
                credit_card_id INTEGER,
                recurring_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE RESTRICT,
                FOREIGN KEY(credit_card_id) REFERENCES credit_card(id) ON UPDATE CASCADE ON DELETE SET NULL,
                FOREIGN KEY(recurring_id) REFERENCES recurring_transaction(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_card_date ON \"transaction\"(credit_card_id, date);",
        (),
    )?;

    // A recurring transaction produces at most one transaction per day.
    connection.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_recurring_date \
         ON \"transaction\"(recurring_id, date) WHERE recurring_id IS NOT NULL;",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        description: row.get(5)?,
        category_id: row.get(6)?,
        account_id: row.get(7)?,
        credit_card_id: row.get(8)?,
        recurring_id: row.get(9)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

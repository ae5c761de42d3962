//! Recurring transaction templates and their schedules.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Error,
    account::{AccountId, ensure_account_belongs_to},
    calendar::{clamped_date, next_month},
    category::{CategoryId, ensure_category_belongs_to},
    database_id::DatabaseId,
    money::Money,
    transaction::TransactionKind,
    user::UserID,
};

pub type RecurringTransactionId = DatabaseId;

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Once a month on the day of the month of the start date.
    Monthly,
    /// Once a week on the weekday of the start date.
    Weekly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
        }
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Frequency {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "monthly" => Ok(Frequency::Monthly),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A template for an income or expense that repeats on a schedule, e.g. rent or salary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: RecurringTransactionId,
    pub user_id: UserID,
    pub kind: TransactionKind,
    pub amount: Money,
    pub description: String,
    pub category_id: Option<CategoryId>,
    /// The account generated transactions are applied to.
    pub account_id: Option<AccountId>,
    pub frequency: Frequency,
    /// The first occurrence.
    pub start_date: Date,
    /// The last day the template is active, if it ends.
    pub end_date: Option<Date>,
}

impl RecurringTransaction {
    /// Whether the template has started and not yet ended on `date`.
    pub fn is_active_on(&self, date: Date) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end_date| date <= end_date)
    }

    /// Whether a transaction should be generated on `date`.
    ///
    /// Monthly templates whose start day does not exist in a month fall on
    /// the last day of that month instead, e.g. a template starting on the
    /// 31st is due on April 30.
    pub fn is_due_on(&self, date: Date) -> bool {
        if !self.is_active_on(date) {
            return false;
        }

        match self.frequency {
            Frequency::Monthly => {
                clamped_date(date.year(), date.month(), self.start_date.day()) == Some(date)
            }
            Frequency::Weekly => date.weekday() == self.start_date.weekday(),
        }
    }

    /// The first date on or after `from` that the template is due.
    ///
    /// Returns `None` if the template ends before then or the next occurrence
    /// is past the last date [Date] supports.
    pub fn next_occurrence(&self, from: Date) -> Option<Date> {
        let from = from.max(self.start_date);

        let candidate = match self.frequency {
            Frequency::Monthly => {
                let this_month = clamped_date(from.year(), from.month(), self.start_date.day())?;

                if this_month >= from {
                    this_month
                } else {
                    let (year, month) = next_month(from)?;
                    clamped_date(year, month, self.start_date.day())?
                }
            }
            Frequency::Weekly => {
                let days_ahead = (self.start_date.weekday().number_days_from_monday() + 7
                    - from.weekday().number_days_from_monday())
                    % 7;

                from.checked_add(Duration::days(days_ahead.into()))?
            }
        };

        self.is_active_on(candidate).then_some(candidate)
    }

    /// An iterator over the dates the template is due, starting from `from`.
    pub fn occurrences_from(&self, from: Date) -> impl Iterator<Item = Date> + '_ {
        std::iter::successors(self.next_occurrence(from), |previous| {
            previous
                .next_day()
                .and_then(|day| self.next_occurrence(day))
        })
    }

    /// The dates the template is due between `from` and `until` (inclusive).
    pub fn upcoming_occurrences(&self, from: Date, until: Date) -> Vec<Date> {
        self.occurrences_from(from)
            .take_while(|date| *date <= until)
            .collect()
    }
}

/// The request body for creating a recurring transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecurringTransaction {
    pub kind: TransactionKind,
    pub amount: Money,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    pub frequency: Frequency,
    pub start_date: Date,
    #[serde(default)]
    pub end_date: Option<Date>,
}

const RECURRING_COLUMNS: &str = "id, user_id, kind, amount, description, category_id, account_id, \
    frequency, start_date, end_date";

/// Create a recurring transaction for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::AmountTooLarge] if the amount is larger than [Money::MAX],
/// - [Error::EndBeforeStart] if the end date is before the start date,
/// - [Error::InvalidCategory] or [Error::InvalidAccount] if a referenced record
///   does not belong to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_transaction(
    user_id: UserID,
    new: &NewRecurringTransaction,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    if !new.amount.is_positive() {
        return Err(Error::NonPositiveAmount(new.amount));
    }
    new.amount.ensure_within_limit()?;

    match new.end_date {
        Some(end_date) if end_date < new.start_date => {
            return Err(Error::EndBeforeStart {
                start: new.start_date,
                end: end_date,
            });
        }
        _ => {}
    }

    ensure_category_belongs_to(user_id, new.category_id, connection)?;
    ensure_account_belongs_to(user_id, new.account_id, connection)?;

    let recurring = connection
        .prepare(&format!(
            "INSERT INTO recurring_transaction \
                (user_id, kind, amount, description, category_id, account_id, frequency, start_date, end_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
             RETURNING {RECURRING_COLUMNS}"
        ))?
        .query_row(
            (
                user_id,
                new.kind,
                new.amount,
                new.description.trim(),
                new.category_id,
                new.account_id,
                new.frequency,
                new.start_date,
                new.end_date,
            ),
            map_recurring_row,
        )?;

    Ok(recurring)
}

pub fn get_recurring_transaction(
    user_id: UserID,
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<RecurringTransaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id), map_recurring_row)
        .map_err(Error::from)
}

/// Retrieve the user's recurring transactions ordered by start date.
pub fn get_recurring_transactions(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction \
             WHERE user_id = ?1 ORDER BY start_date ASC, id ASC"
        ))?
        .query_map((user_id,), map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Retrieve the recurring transactions of every user that are active on `date`.
///
/// If `user_id` is given, only that user's recurring transactions are returned.
pub fn get_active_recurring_transactions(
    date: Date,
    user_id: Option<UserID>,
    connection: &Connection,
) -> Result<Vec<RecurringTransaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_transaction \
             WHERE start_date <= ?1 \
                AND (end_date IS NULL OR end_date >= ?1) \
                AND (?2 IS NULL OR user_id = ?2) \
             ORDER BY id ASC"
        ))?
        .query_map((date, user_id), map_recurring_row)?
        .map(|maybe_recurring| maybe_recurring.map_err(Error::from))
        .collect()
}

/// Delete one of the user's recurring transactions.
///
/// Transactions that were generated from it are kept.
///
/// # Errors
/// Returns [Error::DeleteMissingRecurringTransaction] if it does not exist or belongs to another user.
pub fn delete_recurring_transaction(
    user_id: UserID,
    id: RecurringTransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM recurring_transaction WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecurringTransaction);
    }

    Ok(())
}

pub fn create_recurring_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            amount INTEGER NOT NULL CHECK (amount > 0),
            description TEXT NOT NULL,
            category_id INTEGER,
            account_id INTEGER,
            frequency TEXT NOT NULL CHECK (frequency IN ('monthly', 'weekly')),
            start_date TEXT NOT NULL,
            end_date TEXT,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_recurring_row(row: &Row) -> Result<RecurringTransaction, rusqlite::Error> {
    Ok(RecurringTransaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        category_id: row.get(5)?,
        account_id: row.get(6)?,
        frequency: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
    })
}

#[cfg(test)]
mod schedule_tests {
    use time::{Date, macros::date};

    use crate::{money::Money, transaction::TransactionKind, user::UserID};

    use super::{Frequency, RecurringTransaction};

    fn template(frequency: Frequency, start_date: Date, end_date: Option<Date>) -> RecurringTransaction {
        RecurringTransaction {
            id: 1,
            user_id: UserID::new(1),
            kind: TransactionKind::Expense,
            amount: Money::from_cents(100_000),
            description: "Rent".to_owned(),
            category_id: None,
            account_id: None,
            frequency,
            start_date,
            end_date,
        }
    }

    #[test]
    fn active_between_start_and_end_inclusive() {
        let rent = template(
            Frequency::Monthly,
            date!(2025 - 01 - 15),
            Some(date!(2025 - 06 - 15)),
        );

        assert!(!rent.is_active_on(date!(2025 - 01 - 14)));
        assert!(rent.is_active_on(date!(2025 - 01 - 15)));
        assert!(rent.is_active_on(date!(2025 - 06 - 15)));
        assert!(!rent.is_active_on(date!(2025 - 06 - 16)));
    }

    #[test]
    fn monthly_due_on_start_day() {
        let rent = template(Frequency::Monthly, date!(2025 - 01 - 15), None);

        assert!(rent.is_due_on(date!(2025 - 01 - 15)));
        assert!(rent.is_due_on(date!(2025 - 02 - 15)));
        assert!(!rent.is_due_on(date!(2025 - 02 - 16)));
        assert!(!rent.is_due_on(date!(2024 - 12 - 15)));
    }

    #[test]
    fn monthly_start_day_is_clamped_to_short_months() {
        let rent = template(Frequency::Monthly, date!(2025 - 01 - 31), None);

        assert!(rent.is_due_on(date!(2025 - 04 - 30)));
        assert!(rent.is_due_on(date!(2025 - 02 - 28)));
        assert!(rent.is_due_on(date!(2028 - 02 - 29)));
        assert!(!rent.is_due_on(date!(2028 - 02 - 28)));
        assert!(!rent.is_due_on(date!(2025 - 05 - 30)));
        assert!(rent.is_due_on(date!(2025 - 05 - 31)));
    }

    #[test]
    fn weekly_due_on_start_weekday() {
        // 2025-10-06 is a Monday.
        let gym = template(Frequency::Weekly, date!(2025 - 10 - 06), None);

        assert!(gym.is_due_on(date!(2025 - 10 - 13)));
        assert!(gym.is_due_on(date!(2025 - 12 - 29)));
        assert!(!gym.is_due_on(date!(2025 - 10 - 14)));
    }

    #[test]
    fn not_due_after_end_date() {
        let gym = template(
            Frequency::Weekly,
            date!(2025 - 10 - 06),
            Some(date!(2025 - 10 - 19)),
        );

        assert!(gym.is_due_on(date!(2025 - 10 - 13)));
        assert!(!gym.is_due_on(date!(2025 - 10 - 20)));
    }

    #[test]
    fn next_occurrence_monthly() {
        let rent = template(Frequency::Monthly, date!(2025 - 01 - 31), None);

        assert_eq!(rent.next_occurrence(date!(2024 - 06 - 01)), Some(date!(2025 - 01 - 31)));
        assert_eq!(rent.next_occurrence(date!(2025 - 01 - 31)), Some(date!(2025 - 01 - 31)));
        assert_eq!(rent.next_occurrence(date!(2025 - 02 - 01)), Some(date!(2025 - 02 - 28)));
        assert_eq!(rent.next_occurrence(date!(2025 - 12 - 31)), Some(date!(2025 - 12 - 31)));
        assert_eq!(rent.next_occurrence(date!(2026 - 01 - 01)), Some(date!(2026 - 01 - 31)));
    }

    #[test]
    fn next_occurrence_weekly() {
        let gym = template(Frequency::Weekly, date!(2025 - 10 - 06), None);

        assert_eq!(gym.next_occurrence(date!(2025 - 10 - 06)), Some(date!(2025 - 10 - 06)));
        assert_eq!(gym.next_occurrence(date!(2025 - 10 - 07)), Some(date!(2025 - 10 - 13)));
        assert_eq!(gym.next_occurrence(date!(2025 - 10 - 12)), Some(date!(2025 - 10 - 13)));
    }

    #[test]
    fn no_next_occurrence_after_end_date() {
        let rent = template(
            Frequency::Monthly,
            date!(2025 - 01 - 10),
            Some(date!(2025 - 03 - 05)),
        );

        assert_eq!(rent.next_occurrence(date!(2025 - 02 - 11)), None);
    }

    #[test]
    fn upcoming_occurrences_within_range() {
        let rent = template(Frequency::Monthly, date!(2025 - 01 - 31), None);

        assert_eq!(
            rent.upcoming_occurrences(date!(2025 - 01 - 15), date!(2025 - 05 - 30)),
            vec![
                date!(2025 - 01 - 31),
                date!(2025 - 02 - 28),
                date!(2025 - 03 - 31),
                date!(2025 - 04 - 30),
            ]
        );
    }

    #[test]
    fn occurrences_stop_at_end_date() {
        let gym = template(
            Frequency::Weekly,
            date!(2025 - 10 - 06),
            Some(date!(2025 - 10 - 20)),
        );

        let occurrences: Vec<_> = gym.occurrences_from(date!(2025 - 10 - 01)).take(10).collect();

        assert_eq!(
            occurrences,
            vec![date!(2025 - 10 - 06), date!(2025 - 10 - 13), date!(2025 - 10 - 20)]
        );
    }

    #[test]
    fn occurrences_end_at_last_supported_date() {
        let rent = template(Frequency::Monthly, date!(9999 - 12 - 15), None);

        assert_eq!(rent.next_occurrence(date!(9999 - 12 - 16)), None);
        assert_eq!(
            rent.occurrences_from(date!(9999 - 12 - 01)).collect::<Vec<_>>(),
            vec![date!(9999 - 12 - 15)]
        );
        assert!(rent.is_due_on(date!(9999 - 12 - 15)));
    }

    #[test]
    fn every_occurrence_is_due() {
        let rent = template(Frequency::Monthly, date!(2024 - 01 - 30), None);

        for date in rent.occurrences_from(date!(2024 - 01 - 01)).take(24) {
            assert!(rent.is_due_on(date), "{date}");
        }
    }
}

//! Credit card statement cycles.
//!
//! A statement covers the charges made after one closing date up to and
//! including the next. With a closing day of 25, the statement that closed on
//! October 25 covers September 26 to October 25.
//!
//! Until the closing day of the current month has passed, the most recently
//! closed statement is the one that closed in the previous month. The closing
//! day itself still belongs to the open statement.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    calendar::{DayOfMonth, next_month, previous_month},
    credit_card::core::{CreditCard, CreditCardId},
    money::Money,
};

/// The dates covered by a closed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementWindow {
    /// The closing date of the statement before, not part of the window.
    pub start: Date,
    /// The closing date of the statement, part of the window.
    pub end: Date,
}

impl StatementWindow {
    pub fn contains(&self, date: Date) -> bool {
        self.start < date && date <= self.end
    }
}

/// The most recently closed statement of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub card_id: CreditCardId,
    pub window: StatementWindow,
    /// The sum of the expenses charged to the card within the window.
    pub balance_due: Money,
    /// When the balance due must be paid.
    pub due_date: Date,
}

/// The window of the most recently closed statement as of `today`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the window would start before the first
/// date that can be represented.
pub fn statement_window(closing_day: DayOfMonth, today: Date) -> Result<StatementWindow, Error> {
    let out_of_range = || Error::DateOutOfRange(today);

    let end = if today.day() <= closing_day.get() {
        let (year, month) = previous_month(today).ok_or_else(out_of_range)?;
        closing_day.in_month(year, month)
    } else {
        closing_day.in_month(today.year(), today.month())
    }
    .ok_or_else(out_of_range)?;

    let (year, month) = previous_month(end).ok_or_else(out_of_range)?;
    let start = closing_day.in_month(year, month).ok_or_else(out_of_range)?;

    Ok(StatementWindow { start, end })
}

/// The first date after the statement closed that falls on `due_day`.
///
/// # Errors
/// Returns [Error::DateOutOfRange] if the due date would be after the last
/// date that can be represented.
pub fn payment_due_date(window: StatementWindow, due_day: DayOfMonth) -> Result<Date, Error> {
    let out_of_range = || Error::DateOutOfRange(window.end);

    let same_month = due_day
        .in_month(window.end.year(), window.end.month())
        .ok_or_else(out_of_range)?;

    if same_month > window.end {
        Ok(same_month)
    } else {
        let (year, month) = next_month(window.end).ok_or_else(out_of_range)?;
        due_day.in_month(year, month).ok_or_else(out_of_range)
    }
}

/// Sum the expenses charged to `card` within the most recently closed statement.
///
/// Income charged to the card, such as refunds, is not counted.
pub fn get_balance_due(
    card: &CreditCard,
    today: Date,
    connection: &Connection,
) -> Result<Money, Error> {
    let window = statement_window(card.closing_day, today)?;

    sum_expenses_in_window(card, window, connection)
}

/// Summarize the most recently closed statement of `card`.
pub fn get_statement_summary(
    card: &CreditCard,
    today: Date,
    connection: &Connection,
) -> Result<StatementSummary, Error> {
    let window = statement_window(card.closing_day, today)?;
    let balance_due = sum_expenses_in_window(card, window, connection)?;
    let due_date = payment_due_date(window, card.due_day)?;

    tracing::debug!(
        "Statement for card {} from {} to {}: {balance_due} due on {due_date}",
        card.id,
        window.start,
        window.end
    );

    Ok(StatementSummary {
        card_id: card.id,
        window,
        balance_due,
        due_date,
    })
}

fn sum_expenses_in_window(
    card: &CreditCard,
    window: StatementWindow,
    connection: &Connection,
) -> Result<Money, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\" \
             WHERE user_id = ?1 AND credit_card_id = ?2 AND kind = 'expense' \
                AND date > ?3 AND date <= ?4",
            (card.user_id, card.id, window.start, window.end),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod window_tests {
    use time::{Date, macros::date};

    use crate::{Error, calendar::DayOfMonth};

    use super::{StatementWindow, payment_due_date, statement_window};

    fn day(day: u8) -> DayOfMonth {
        DayOfMonth::new(day).unwrap()
    }

    #[test]
    fn before_closing_day_uses_previous_month() {
        let window = statement_window(day(25), date!(2025 - 11 - 04)).unwrap();

        assert_eq!(
            window,
            StatementWindow {
                start: date!(2025 - 09 - 25),
                end: date!(2025 - 10 - 25),
            }
        );
    }

    #[test]
    fn after_closing_day_uses_current_month() {
        let window = statement_window(day(25), date!(2025 - 11 - 28)).unwrap();

        assert_eq!(
            window,
            StatementWindow {
                start: date!(2025 - 10 - 25),
                end: date!(2025 - 11 - 25),
            }
        );
    }

    #[test]
    fn closing_day_belongs_to_open_statement() {
        let window = statement_window(day(25), date!(2025 - 11 - 25)).unwrap();

        assert_eq!(window.end, date!(2025 - 10 - 25));
    }

    #[test]
    fn window_spans_new_year() {
        let window = statement_window(day(15), date!(2026 - 01 - 10)).unwrap();

        assert_eq!(
            window,
            StatementWindow {
                start: date!(2025 - 11 - 15),
                end: date!(2025 - 12 - 15),
            }
        );
    }

    #[test]
    fn closing_day_is_clamped_to_short_months() {
        let window = statement_window(day(31), date!(2025 - 03 - 15)).unwrap();

        assert_eq!(
            window,
            StatementWindow {
                start: date!(2025 - 01 - 31),
                end: date!(2025 - 02 - 28),
            }
        );

        let leap_year = statement_window(day(30), date!(2024 - 03 - 31)).unwrap();
        assert_eq!(
            leap_year,
            StatementWindow {
                start: date!(2024 - 02 - 29),
                end: date!(2024 - 03 - 30),
            }
        );
    }

    #[test]
    fn consecutive_windows_do_not_overlap_or_leave_gaps() {
        let closing_day = day(31);
        let mut today = date!(2024 - 01 - 01);
        let mut windows: Vec<StatementWindow> = Vec::new();

        while today < date!(2025 - 12 - 31) {
            let window = statement_window(closing_day, today).unwrap();
            if windows.last() != Some(&window) {
                windows.push(window);
            }
            today = today.next_day().unwrap();
        }

        assert_eq!(windows.len(), 24);
        for pair in windows.windows(2) {
            assert_eq!(pair[1].start, pair[0].end, "{:?}", pair);
        }
    }

    #[test]
    fn window_excludes_start_and_includes_end() {
        let window = statement_window(day(25), date!(2025 - 11 - 04)).unwrap();

        assert!(!window.contains(date!(2025 - 09 - 25)));
        assert!(window.contains(date!(2025 - 09 - 26)));
        assert!(window.contains(date!(2025 - 10 - 25)));
        assert!(!window.contains(date!(2025 - 10 - 26)));
    }

    #[test]
    fn due_date_later_in_closing_month() {
        let window = statement_window(day(5), date!(2025 - 11 - 20)).unwrap();

        assert_eq!(payment_due_date(window, day(25)).unwrap(), date!(2025 - 11 - 25));
    }

    #[test]
    fn due_date_in_month_after_closing() {
        let window = statement_window(day(25), date!(2025 - 11 - 04)).unwrap();

        assert_eq!(payment_due_date(window, day(10)).unwrap(), date!(2025 - 11 - 10));
        assert_eq!(payment_due_date(window, day(25)).unwrap(), date!(2025 - 11 - 25));
    }

    #[test]
    fn due_date_is_clamped() {
        let window = statement_window(day(31), date!(2025 - 02 - 01)).unwrap();

        assert_eq!(window.end, date!(2025 - 01 - 31));
        assert_eq!(payment_due_date(window, day(30)).unwrap(), date!(2025 - 02 - 28));
    }

    #[test]
    fn dates_outside_supported_range_are_errors() {
        let first_month = Date::MIN.replace_day(10).unwrap();

        assert_eq!(
            statement_window(day(25), first_month),
            Err(Error::DateOutOfRange(first_month))
        );

        let last_window = StatementWindow {
            start: date!(9999 - 11 - 25),
            end: date!(9999 - 12 - 25),
        };
        assert_eq!(
            payment_due_date(last_window, day(10)),
            Err(Error::DateOutOfRange(date!(9999 - 12 - 25)))
        );
        assert_eq!(payment_due_date(last_window, day(31)), Ok(date!(9999 - 12 - 31)));
    }
}

#[cfg(test)]
mod balance_due_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        credit_card::core::{CreditCard, NewCreditCard, create_credit_card},
        db::initialize,
        money::Money,
        transaction::{Transaction, TransactionKind, create_transaction},
        user::{User, create_user},
    };

    use super::{get_balance_due, get_statement_summary};

    fn get_test_connection() -> (Connection, User, CreditCard) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test", &conn).unwrap();
        let card = create_credit_card(
            user.id,
            &NewCreditCard {
                name: "Visa".to_owned(),
                closing_day: 25,
                due_day: 10,
            },
            &conn,
        )
        .unwrap();
        (conn, user, card)
    }

    fn charge(
        user: &User,
        card: &CreditCard,
        kind: TransactionKind,
        cents: i64,
        date: Date,
        conn: &Connection,
    ) {
        create_transaction(
            user.id,
            Transaction::build(kind, Money::from_cents(cents), date, "")
                .credit_card_id(Some(card.id)),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn no_charges_is_zero() {
        let (conn, _, card) = get_test_connection();

        assert_eq!(
            get_balance_due(&card, date!(2025 - 11 - 04), &conn),
            Ok(Money::ZERO)
        );
    }

    #[test]
    fn sums_expenses_within_window_only() {
        let (conn, user, card) = get_test_connection();
        // Outside: on the previous closing date and after the closing date.
        charge(&user, &card, TransactionKind::Expense, 1_000, date!(2025 - 09 - 25), &conn);
        charge(&user, &card, TransactionKind::Expense, 2_000, date!(2025 - 10 - 26), &conn);
        // Inside.
        charge(&user, &card, TransactionKind::Expense, 3_000, date!(2025 - 09 - 26), &conn);
        charge(&user, &card, TransactionKind::Expense, 4_000, date!(2025 - 10 - 25), &conn);
        // Refunds are not counted.
        charge(&user, &card, TransactionKind::Income, 500, date!(2025 - 10 - 01), &conn);

        let balance_due = get_balance_due(&card, date!(2025 - 11 - 04), &conn);

        assert_eq!(balance_due, Ok(Money::from_cents(7_000)));
    }

    #[test]
    fn ignores_expenses_without_the_card() {
        let (conn, user, card) = get_test_connection();
        create_transaction(
            user.id,
            Transaction::build(
                TransactionKind::Expense,
                Money::from_cents(1_000),
                date!(2025 - 10 - 10),
                "",
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_balance_due(&card, date!(2025 - 11 - 04), &conn),
            Ok(Money::ZERO)
        );
    }

    #[test]
    fn summary_includes_due_date() {
        let (conn, user, card) = get_test_connection();
        charge(&user, &card, TransactionKind::Expense, 4_000, date!(2025 - 10 - 25), &conn);

        let summary = get_statement_summary(&card, date!(2025 - 11 - 04), &conn).unwrap();

        assert_eq!(summary.card_id, card.id);
        assert_eq!(summary.window.start, date!(2025 - 09 - 25));
        assert_eq!(summary.window.end, date!(2025 - 10 - 25));
        assert_eq!(summary.balance_due, Money::from_cents(4_000));
        assert_eq!(summary.due_date, date!(2025 - 11 - 10));
    }
}

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, calendar::DayOfMonth, database_id::DatabaseId, user::UserID};

pub type CreditCardId = DatabaseId;

/// A credit card with a monthly statement cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCard {
    pub id: CreditCardId,
    pub user_id: UserID,
    pub name: String,
    /// The day of the month the statement is finalized.
    pub closing_day: DayOfMonth,
    /// The day of the month the closed statement must be paid by.
    pub due_day: DayOfMonth,
}

/// The request body for adding a credit card.
///
/// The days are kept as plain numbers so that out of range values are
/// reported as [Error::InvalidDayOfMonth].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCreditCard {
    pub name: String,
    pub closing_day: u8,
    pub due_day: u8,
}

const CREDIT_CARD_COLUMNS: &str = "id, user_id, name, closing_day, due_day";

/// Add a credit card for `user_id`.
///
/// # Errors
/// Returns an:
/// - [Error::EmptyName] if the name is empty,
/// - [Error::InvalidDayOfMonth] if the closing or due day is not between 1 and 31,
/// - [Error::SqlError] if there is some other SQL error.
pub fn create_credit_card(
    user_id: UserID,
    new_card: &NewCreditCard,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    let name = new_card.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    let closing_day = DayOfMonth::new(new_card.closing_day)?;
    let due_day = DayOfMonth::new(new_card.due_day)?;

    let card = connection
        .prepare(&format!(
            "INSERT INTO credit_card (user_id, name, closing_day, due_day) VALUES (?1, ?2, ?3, ?4) \
             RETURNING {CREDIT_CARD_COLUMNS}"
        ))?
        .query_row((user_id, name, closing_day, due_day), map_credit_card_row)?;

    Ok(card)
}

/// Retrieve one of the user's credit cards.
///
/// # Errors
/// Returns [Error::NotFound] if the card does not exist or belongs to another user.
pub fn get_credit_card(
    user_id: UserID,
    card_id: CreditCardId,
    connection: &Connection,
) -> Result<CreditCard, Error> {
    connection
        .prepare(&format!(
            "SELECT {CREDIT_CARD_COLUMNS} FROM credit_card WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((card_id, user_id), map_credit_card_row)
        .map_err(Error::from)
}

pub fn get_credit_cards(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<CreditCard>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CREDIT_CARD_COLUMNS} FROM credit_card WHERE user_id = ?1 ORDER BY name ASC"
        ))?
        .query_map((user_id,), map_credit_card_row)?
        .map(|maybe_card| maybe_card.map_err(Error::from))
        .collect()
}

/// Delete one of the user's credit cards.
///
/// Transactions charged to the card are kept and no longer refer to a card.
///
/// # Errors
/// Returns [Error::DeleteMissingCreditCard] if the card does not exist or belongs to another user.
pub fn delete_credit_card(
    user_id: UserID,
    card_id: CreditCardId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM credit_card WHERE id = ?1 AND user_id = ?2",
        (card_id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCreditCard);
    }

    Ok(())
}

/// Check that `card_id`, if given, refers to one of the user's credit cards.
///
/// # Errors
/// Returns [Error::InvalidCreditCard] if the card does not exist or belongs to another user.
pub fn ensure_credit_card_belongs_to(
    user_id: UserID,
    card_id: Option<CreditCardId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(card_id) = card_id else {
        return Ok(());
    };

    match get_credit_card(user_id, card_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::InvalidCreditCard(card_id)),
        Err(error) => Err(error),
    }
}

pub fn create_credit_card_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS credit_card (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            closing_day INTEGER NOT NULL CHECK (closing_day BETWEEN 1 AND 31),
            due_day INTEGER NOT NULL CHECK (due_day BETWEEN 1 AND 31),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_credit_card_row(row: &Row) -> Result<CreditCard, rusqlite::Error> {
    Ok(CreditCard {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        closing_day: row.get(3)?,
        due_day: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        money::Money,
        transaction::{Transaction, TransactionKind, create_transaction, get_transaction},
        user::{User, create_user},
    };

    use super::{
        NewCreditCard, create_credit_card, delete_credit_card, ensure_credit_card_belongs_to,
        get_credit_card, get_credit_cards,
    };

    fn get_test_connection() -> (Connection, User) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("test", &conn).unwrap();
        (conn, user)
    }

    fn new_card(name: &str, closing_day: u8, due_day: u8) -> NewCreditCard {
        NewCreditCard {
            name: name.to_owned(),
            closing_day,
            due_day,
        }
    }

    #[test]
    fn create_and_get_card() {
        let (conn, user) = get_test_connection();

        let card = create_credit_card(user.id, &new_card(" Visa ", 25, 10), &conn).unwrap();

        assert_eq!(card.name, "Visa");
        assert_eq!(card.closing_day.get(), 25);
        assert_eq!(card.due_day.get(), 10);
        assert_eq!(get_credit_card(user.id, card.id, &conn), Ok(card.clone()));
        assert_eq!(get_credit_cards(user.id, &conn), Ok(vec![card]));
    }

    #[test]
    fn create_rejects_invalid_days() {
        let (conn, user) = get_test_connection();

        assert_eq!(
            create_credit_card(user.id, &new_card("Visa", 0, 10), &conn),
            Err(Error::InvalidDayOfMonth(0))
        );
        assert_eq!(
            create_credit_card(user.id, &new_card("Visa", 25, 32), &conn),
            Err(Error::InvalidDayOfMonth(32))
        );
    }

    #[test]
    fn create_rejects_empty_name() {
        let (conn, user) = get_test_connection();

        assert_eq!(
            create_credit_card(user.id, &new_card("", 25, 10), &conn),
            Err(Error::EmptyName)
        );
    }

    #[test]
    fn cards_are_scoped_to_owner() {
        let (conn, user) = get_test_connection();
        let other = create_user("other", &conn).unwrap();
        let card = create_credit_card(user.id, &new_card("Visa", 25, 10), &conn).unwrap();

        assert_eq!(get_credit_card(other.id, card.id, &conn), Err(Error::NotFound));
        assert_eq!(
            ensure_credit_card_belongs_to(other.id, Some(card.id), &conn),
            Err(Error::InvalidCreditCard(card.id))
        );
        assert_eq!(
            delete_credit_card(other.id, card.id, &conn),
            Err(Error::DeleteMissingCreditCard)
        );
    }

    #[test]
    fn delete_detaches_transactions() {
        let (conn, user) = get_test_connection();
        let card = create_credit_card(user.id, &new_card("Visa", 25, 10), &conn).unwrap();
        let transaction = create_transaction(
            user.id,
            Transaction::build(
                TransactionKind::Expense,
                Money::from_cents(5_000),
                date!(2025 - 10 - 20),
                "Groceries",
            )
            .credit_card_id(Some(card.id)),
            &conn,
        )
        .unwrap();

        delete_credit_card(user.id, card.id, &conn).unwrap();

        let transaction = get_transaction(user.id, transaction.id, &conn).unwrap();
        assert_eq!(transaction.credit_card_id, None);
    }
}

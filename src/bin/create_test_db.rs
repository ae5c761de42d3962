use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{
    Money,
    account::{NewAccount, create_account},
    budget::{NewBudget, create_budget},
    category::{CategoryName, create_category},
    count_users, create_user,
    credit_card::{NewCreditCard, create_credit_card},
    initialize_db,
    recurring::{Frequency, NewRecurringTransaction, create_recurring_transaction},
    transaction::{Transaction, TransactionKind, create_transaction},
};

/// A utility for creating a test database for the JSON API server of finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path.extension().is_none_or(|extension| extension.is_empty()) {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");
    let user = create_user("test", &conn)?;

    println!("Creating accounts, categories and budgets...");
    let bank = create_account(
        user.id,
        &NewAccount {
            name: "Bank".to_owned(),
            opening_balance: Money::from_cents(250_000),
        },
        &conn,
    )?;
    create_account(
        user.id,
        &NewAccount {
            name: "Cash".to_owned(),
            opening_balance: Money::from_cents(8_000),
        },
        &conn,
    )?;

    let groceries = create_category(user.id, CategoryName::new("Groceries")?, &conn)?;
    let housing = create_category(user.id, CategoryName::new("Housing")?, &conn)?;
    let salary = create_category(user.id, CategoryName::new("Salary")?, &conn)?;

    create_budget(
        user.id,
        &NewBudget {
            category_id: groceries.id,
            limit: Money::from_cents(60_000),
        },
        &conn,
    )?;

    let card = create_credit_card(
        user.id,
        &NewCreditCard {
            name: "Visa".to_owned(),
            closing_day: 25,
            due_day: 10,
        },
        &conn,
    )?;

    println!("Creating recurring transactions...");
    let today = OffsetDateTime::now_utc().date();
    let start_of_year = today.replace_ordinal(1)?;

    create_recurring_transaction(
        user.id,
        &NewRecurringTransaction {
            kind: TransactionKind::Income,
            amount: Money::from_cents(450_000),
            description: "Salary".to_owned(),
            category_id: Some(salary.id),
            account_id: Some(bank.id),
            frequency: Frequency::Monthly,
            start_date: start_of_year,
            end_date: None,
        },
        &conn,
    )?;
    create_recurring_transaction(
        user.id,
        &NewRecurringTransaction {
            kind: TransactionKind::Expense,
            amount: Money::from_cents(180_000),
            description: "Rent".to_owned(),
            category_id: Some(housing.id),
            account_id: Some(bank.id),
            frequency: Frequency::Monthly,
            start_date: start_of_year,
            end_date: None,
        },
        &conn,
    )?;

    println!("Creating transactions...");
    for days_ago in (0..60).step_by(4) {
        let date = today - Duration::days(days_ago);
        let amount = Money::from_cents(2_500 + days_ago * 137);

        create_transaction(
            user.id,
            Transaction::build(TransactionKind::Expense, amount, date, "Supermarket")
                .category_id(Some(groceries.id))
                .credit_card_id(Some(card.id)),
            &conn,
        )?;
    }

    println!(
        "Success! The database has {} user(s). Send requests with the header 'x-user-id: {}'.",
        count_users(&conn)?,
        user.id
    );

    Ok(())
}

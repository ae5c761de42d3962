use std::error::Error;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, macros::format_description};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{initialize_db, local_today, process_recurring_transactions};

/// Generate the transactions that recurring transactions are due to produce today.
///
/// Meant to be run once a day by a scheduler such as cron. Running it more
/// than once on the same day does not create duplicate transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// Process this date (YYYY-MM-DD) instead of today.
    #[arg(long, value_parser = parse_date)]
    date: Option<Date>,

    /// The canonical timezone used to decide what day it is today.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, format_description!("[year]-[month]-[day]"))
        .map_err(|error| format!("expected a date formatted as YYYY-MM-DD: {error}"))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let today = match args.date {
        Some(date) => date,
        None => local_today(&args.timezone)?,
    };

    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    let summary = process_recurring_transactions(today, &conn)?;

    println!(
        "Processed recurring transactions for {today}: {} created, {} skipped, {} failed.",
        summary.created, summary.skipped, summary.failed
    );

    Ok(())
}

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finity::{
    DEFAULT_INITIAL_BALANCE, NewAccount, NewExpense, PasswordHash, ValidatedPassword,
    create_account, initialize_db, insert_expense,
};

/// A utility for creating a test database for the REST API server of Finity.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The name of the demo account.
    #[arg(long, default_value = "test")]
    username: String,
}

/// Expenses for the demo account as (description, amount, category, days ago).
const DEMO_EXPENSES: [(&str, f64, &str, i64); 6] = [
    ("Textbooks", 120.0, "shopping", 20),
    ("Campus cafe", 8.5, "merchant", 12),
    ("Groceries", 64.25, "shopping", 9),
    ("Phone plan", 30.0, "other", 6),
    ("Concert tickets", 75.0, "other", 3),
    ("Bookshop", 22.0, "merchant", 1),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test account \"{}\"...", args.username);

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let total_spent: f64 = DEMO_EXPENSES.iter().map(|(_, amount, _, _)| amount).sum();

    let transaction = conn.transaction()?;
    let account = create_account(
        NewAccount {
            username: args.username.clone(),
            password_hash,
            phone: None,
            initial_balance: DEFAULT_INITIAL_BALANCE - total_spent,
        },
        &transaction,
    )?;

    println!("Adding {} expenses...", DEMO_EXPENSES.len());

    let now = OffsetDateTime::now_utc();
    for (description, amount, category, days_ago) in DEMO_EXPENSES {
        let expense = NewExpense::new(
            account.id,
            Some(description.to_owned()),
            amount,
            category,
        )?;
        insert_expense(&expense, now - Duration::days(days_ago), &transaction)?;
    }

    transaction.commit()?;

    println!("Success! Log in with username \"{}\" and password \"test\".", args.username);

    Ok(())
}

use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use email_address::EmailAddress;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use fintrack_rs::{
    Amount, InvestmentType, NewUser, PasswordHash, Transaction, TransactionKind,
    ValidatedPassword, create_transaction, create_user, initialize_db,
};

/// A utility for creating a demo database for the fintrack_rs server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// A transaction repeated on the same day of every seeded month.
struct MonthlyEntry {
    title: &'static str,
    /// Amount in cents.
    cents: i64,
    kind: TransactionKind,
    method: &'static str,
    category: &'static str,
    day: u8,
}

const MONTHLY_ENTRIES: [MonthlyEntry; 8] = [
    MonthlyEntry {
        title: "Salário",
        cents: 485075,
        kind: TransactionKind::Income,
        method: "pix",
        category: "salary",
        day: 5,
    },
    MonthlyEntry {
        title: "Freelance Design",
        cents: 120000,
        kind: TransactionKind::Income,
        method: "transfer",
        category: "freelancing",
        day: 10,
    },
    MonthlyEntry {
        title: "Aluguel",
        cents: 135000,
        kind: TransactionKind::Expense,
        method: "transfer",
        category: "rent",
        day: 5,
    },
    MonthlyEntry {
        title: "Supermercado",
        cents: 64312,
        kind: TransactionKind::Expense,
        method: "card",
        category: "market",
        day: 12,
    },
    MonthlyEntry {
        title: "Uber",
        cents: 8790,
        kind: TransactionKind::Expense,
        method: "card",
        category: "uber",
        day: 18,
    },
    MonthlyEntry {
        title: "Conta de luz",
        cents: 18732,
        kind: TransactionKind::Expense,
        method: "boleto",
        category: "other",
        day: 8,
    },
    MonthlyEntry {
        title: "Bitcoin",
        cents: 25000,
        kind: TransactionKind::Investment {
            investment_type: Some(InvestmentType::Crypto),
        },
        method: "crypto",
        category: "bitcoin",
        day: 20,
    },
    MonthlyEntry {
        title: "CDB",
        cents: 50000,
        kind: TransactionKind::Investment {
            investment_type: Some(InvestmentType::National),
        },
        method: "transfer",
        category: "cdb",
        day: 25,
    },
];

const DEMO_EMAIL: &str = "usuario@exemplo.com";
const DEMO_PASSWORD: &str = "demonstration-password-2024";

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
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating demo user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(DEMO_PASSWORD),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            email: EmailAddress::new_unchecked(DEMO_EMAIL),
            username: Some("usuario".to_owned()),
            password_hash: Some(password_hash),
            first_name: Some("Usuário".to_owned()),
            last_name: Some("Teste".to_owned()),
            phone: None,
            onboarding_completed: true,
        },
        &conn,
    )?;

    println!("Creating transactions for the last three months...");

    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for month_offset in 0..3 {
        let (year, month) = months_before(today.year(), today.month(), month_offset);

        for entry in &MONTHLY_ENTRIES {
            let date = Date::from_calendar_date(year, month, entry.day)?;

            // Only seed what has already happened.
            if date > today {
                continue;
            }

            let amount = Amount::new(Decimal::new(entry.cents, 2))?;
            let builder = Transaction::build(entry.title, amount, entry.kind, date)
                .method(entry.method)
                .category(Some(entry.category));

            create_transaction(builder, user.id, &conn)?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Log in with {DEMO_EMAIL} and the password {DEMO_PASSWORD:?}");
    println!("Success!");

    Ok(())
}

fn months_before(year: i32, month: Month, count: u8) -> (i32, Month) {
    (0..count).fold((year, month), |(year, month), _| match month {
        Month::January => (year - 1, Month::December),
        month => (year, month.previous()),
    })
}

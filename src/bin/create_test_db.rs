use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use time::Duration;

use ops_api::{
    Database, NewTransaction, Timestamp, TransactionStatus, count_transactions, create_transaction,
    initialize_db,
};

/// A utility for creating a test database for the ops_api server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The number of generated transactions to add on top of the demo rows.
    #[arg(long, short, default_value_t = 0)]
    count: u32,
}

const USER_IDS: [&str; 5] = ["U-001", "U-002", "U-003", "U-004", "U-005"];

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
    let mut conn = Database::new(output_path).connect()?;

    initialize_db(&mut conn, true)?;

    if args.count > 0 {
        println!("Creating {} transactions...", args.count);
    }

    let start = Timestamp::now().as_offset_date_time() - Duration::minutes(i64::from(args.count));

    for i in 0..args.count {
        let index = i as usize;
        let new_transaction = NewTransaction {
            order_id: format!("ORD-T{i:06}"),
            user_id: USER_IDS[index % USER_IDS.len()].to_owned(),
            amount_cents: 100 + i64::from(i) * 37 % 99_900,
            status: TransactionStatus::ALL[index % TransactionStatus::ALL.len()],
        };
        let created_at = Timestamp::from(start + Duration::minutes(i64::from(i)));

        create_transaction(&new_transaction, created_at, &conn)?;
    }

    println!("Success! {} transactions in total.", count_transactions(&conn)?);

    Ok(())
}

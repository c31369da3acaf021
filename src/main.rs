use booking_payments::application::validation::{ValidationHandler, ValidationRequest};
use booking_payments::domain::ports::ReservationStoreBox;
use booking_payments::infrastructure::in_memory::{InMemoryDirectory, InMemoryReservationStore};
use booking_payments::interfaces::csv::request_reader::RequestReader;
use booking_payments::interfaces::json::request::parse_body;
use booking_payments::interfaces::json::response::{Outcome, OutcomeWriter};
use booking_payments::interfaces::json::seed::Seed;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use serde_json::json;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON seed with users, fields, bearer tokens and reservations
    seed: PathBuf,

    /// CSV of validation requests (reservation_id, token, action, admin_notes)
    requests: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn open_store(db_path: Option<PathBuf>) -> Result<ReservationStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = booking_payments::infrastructure::rocksdb::RocksDBStore::open(path)
                .into_diagnostic()?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryReservationStore::new()))
        }
        None => Ok(Box::new(InMemoryReservationStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store = open_store(cli.db_path)?;
    let directory = InMemoryDirectory::new();
    let seed = Seed::from_reader(File::open(&cli.seed).into_diagnostic()?).into_diagnostic()?;
    let authenticator = seed
        .install(&*store, &directory)
        .await
        .into_diagnostic()?;

    let handler = ValidationHandler::new(store, Box::new(directory), Box::new(authenticator));

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    let file = File::open(cli.requests).into_diagnostic()?;
    for record in RequestReader::new(file).requests() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                eprintln!("Error reading request: {}", e);
                continue;
            }
        };

        let reservation_id = record.reservation_id;
        let body = parse_body(json!({
            "action": record.action,
            "adminNotes": record.admin_notes,
        }));
        let result = match body {
            Ok(body) => {
                handler
                    .handle(ValidationRequest {
                        reservation_id,
                        token: record.token,
                        body,
                    })
                    .await
            }
            Err(e) => {
                tracing::warn!(reservation_id, error = %e, "invalid request body");
                Err(e)
            }
        };
        writer
            .write_outcome(&Outcome::from_result(reservation_id, &result))
            .into_diagnostic()?;
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}

//! Binary entrypoint: walk an export tree and load it into Postgres.
//!
//! # Environment variables
//!
//! | Variable       | Required | Description                                  |
//! |----------------|----------|----------------------------------------------|
//! | `DATABASE_URL` | yes      | Postgres connection string                   |
//! | `INPUT_DIR`    | yes      | Root folder of `YYYY-MM-DD` export subfolders |

use std::path::Path;

use chrono::NaiveDate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remanet_db::repositories::ColdSprayRepo;
use remanet_db::DbPool;
use remanet_ingest::parse;

/// Date format of the export folder names.
const FOLDER_DATE_FORMAT: &str = "%Y-%m-%d";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remanet_ingest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        tracing::error!("DATABASE_URL environment variable is required");
        std::process::exit(1);
    });

    let input_dir = std::env::var("INPUT_DIR").unwrap_or_else(|_| {
        tracing::error!("INPUT_DIR environment variable is required");
        std::process::exit(1);
    });

    let pool = remanet_db::create_pool(&database_url)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            std::process::exit(1);
        });

    remanet_db::run_migrations(&pool).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to run database migrations");
        std::process::exit(1);
    });

    tracing::info!(%input_dir, "Starting cold-spray ingestion");

    let total = ingest_tree(&pool, Path::new(&input_dir)).await;
    tracing::info!(total, "Ingestion complete");
}

/// Walk the export tree and ingest every date folder.
///
/// Returns the total number of readings inserted. Unreadable folders
/// and files are logged and skipped; one bad export never aborts the
/// run.
async fn ingest_tree(pool: &DbPool, input_dir: &Path) -> usize {
    let entries = match std::fs::read_dir(input_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, path = %input_dir.display(), "Cannot read input directory");
            std::process::exit(1);
        }
    };

    let mut total = 0usize;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let folder_name = entry.file_name().to_string_lossy().into_owned();
        let Ok(date) = NaiveDate::parse_from_str(&folder_name, FOLDER_DATE_FORMAT) else {
            tracing::warn!(folder = %folder_name, "Skipping folder without a YYYY-MM-DD name");
            continue;
        };

        let machine_dir = path.join("coldspray");
        if !machine_dir.is_dir() {
            tracing::warn!(folder = %folder_name, "No coldspray/ directory, skipping");
            continue;
        }

        total += ingest_date_folder(pool, &machine_dir, date).await;
    }

    total
}

/// Ingest every CSV file in one date folder.
async fn ingest_date_folder(pool: &DbPool, machine_dir: &Path, date: NaiveDate) -> usize {
    let entries = match std::fs::read_dir(machine_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(error = %e, path = %machine_dir.display(), "Cannot read machine directory");
            return 0;
        }
    };

    let mut inserted = 0usize;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, file = %path.display(), "Cannot read CSV file");
                continue;
            }
        };

        let parsed = match parse::parse_cold_spray_csv(&content, date) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(error = %e, file = %path.display(), "Cannot parse CSV file");
                continue;
            }
        };

        if parsed.skipped > 0 {
            tracing::warn!(
                skipped = parsed.skipped,
                file = %path.display(),
                "Skipped unparseable lines"
            );
        }

        match ColdSprayRepo::insert_batch(pool, &parsed.readings).await {
            Ok(()) => {
                tracing::info!(
                    count = parsed.readings.len(),
                    file = %path.display(),
                    %date,
                    "Inserted readings"
                );
                inserted += parsed.readings.len();
            }
            Err(e) => {
                tracing::error!(error = %e, file = %path.display(), "Insert failed");
            }
        }
    }

    inserted
}

//! Load an ingredient catalogue (JSON) into the database.
//!
//! Existing (name, measurement_unit) pairs are skipped, so the command can be
//! re-run against the same file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use diesel::prelude::*;
use foodgram_core::parse_catalogue;
use foodgram_server::db;
use foodgram_server::models::NewIngredient;
use foodgram_server::schema::ingredients;

#[derive(Parser)]
#[command(name = "import-ingredients")]
#[command(about = "Import an ingredient catalogue", long_about = None)]
struct Args {
    /// Catalogue file: a JSON list of {name, measurement_unit} records
    file: PathBuf,

    /// Database to import into
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("Failed to read .env");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let json = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let records = parse_catalogue(&json)
        .with_context(|| format!("Invalid catalogue {}", args.file.display()))?;

    let pool = db::create_pool(&args.database_url)?;
    let mut conn = pool.get().context("Failed to get database connection")?;

    let inserted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut inserted = 0;
        for record in &records {
            inserted += diesel::insert_into(ingredients::table)
                .values(NewIngredient {
                    name: &record.name,
                    measurement_unit: &record.measurement_unit,
                })
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        Ok(inserted)
    })?;

    tracing::info!(
        inserted,
        skipped = records.len() - inserted,
        "Imported ingredient catalogue from {}",
        args.file.display()
    );
    println!(
        "Imported {} ingredient(s), skipped {} existing",
        inserted,
        records.len() - inserted
    );

    Ok(())
}

//! Seed data script - loads the JSON fixtures into the database
//!
//! Run with: cargo run --bin seed-data -- --data-dir data
//!
//! Existing rows are cleared first unless `--no-reset` is given. Rows are
//! upserted by id, so running the script twice yields the same data.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use stayhub_api::{
    config,
    db::{self, DbConfig},
    services::seed::{Fixtures, SeedOrchestrator},
};

#[derive(Debug, Parser)]
#[command(name = "seed-data", about = "Populate the StayHub database from JSON fixtures")]
struct Cli {
    /// Directory holding users.json, hosts.json, amenities.json,
    /// properties.json, reviews.json and bookings.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Keep existing rows instead of clearing every table first
    #[arg(long)]
    no_reset: bool,

    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    info!("=== StayHub Seed Data ===");

    let fixtures = Fixtures::load_dir(&cli.data_dir)
        .with_context(|| format!("failed to load fixtures from {}", cli.data_dir.display()))?;

    let mut db_config = DbConfig::from(&cfg);
    if let Some(url) = cli.database_url {
        db_config.url = url;
    }
    let pool = db::establish_connection_with_config(&db_config)
        .await
        .context("failed to connect to the database")?;
    db::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    let outcome = SeedOrchestrator::new(&pool).run(&fixtures, !cli.no_reset).await;
    db::close_pool(pool).await?;

    match outcome {
        Ok(report) => {
            info!(
                users = report.users,
                hosts = report.hosts,
                amenities = report.amenities,
                properties = report.properties,
                property_amenities = report.property_amenities,
                reviews = report.reviews,
                bookings = report.bookings,
                "=== Seed Data Complete ==="
            );
            Ok(())
        }
        Err(e) => {
            error!(step = %e.step, "seeding aborted: {}", e.source);
            Err(e.into())
        }
    }
}

//! Schema migration runner
//!
//! Run with: cargo run --bin migration -- [up|down|status|fresh]

use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use stayhub_api::{
    config,
    db::{self, DbConfig},
    migrator::Migrator,
};

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Apply or roll back StayHub schema migrations")]
struct Cli {
    /// Overrides the configured database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back applied migrations, one by default
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Print applied and pending migrations
    Status,
    /// Drop every table and re-apply all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let mut db_config = DbConfig::from(&cfg);
    if let Some(url) = cli.database_url {
        db_config.url = url;
    }
    info!("Connecting to database");
    let pool = db::establish_connection_with_config(&db_config)
        .await
        .context("failed to connect to the database")?;

    match cli.command.unwrap_or(Command::Up { steps: None }) {
        Command::Up { steps } => {
            Migrator::up(&pool, steps).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&pool, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        Command::Status => {
            Migrator::status(&pool).await?;
        }
        Command::Fresh => {
            Migrator::fresh(&pool).await?;
            info!("Schema rebuilt from scratch");
        }
    }

    db::close_pool(pool).await?;
    Ok(())
}

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use restaurant_api::{
    config::{self, AppConfig},
    db::{self, DbConfig},
    events, AppState,
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    match cli.command {
        Commands::Migrate => {
            let pool = db::establish_connection_with_config(&DbConfig::from(&cfg)).await?;
            db::run_migrations(&pool).await?;
            println!("Migrations applied");
        }
        Commands::Seed => {
            let state = connect(&cfg).await?;
            let report = state.services.admin.seed_demo_data().await?;
            render(&report, cli.json, || {
                if report.created {
                    format!("Demo company {} created", report.company_id)
                } else {
                    format!("Demo company {} already present", report.company_id)
                }
            })?;
        }
        Commands::CreateAdmin { email, password } => {
            let state = connect(&cfg).await?;
            match state
                .services
                .users
                .bootstrap_super_admin(&email, &password)
                .await?
            {
                Some(admin) => render(&admin, cli.json, || {
                    format!("Super admin {} created (id {})", admin.email, admin.id)
                })?,
                None => println!("A super admin already exists; nothing to do"),
            }
        }
        Commands::Archive => {
            let state = connect(&cfg).await?;
            let archived = state
                .services
                .archival
                .archive_stale_orders(Utc::now())
                .await?;
            println!("Archived {} orders", archived);
        }
        Commands::Backup => {
            let state = connect(&cfg).await?;
            let report = state.services.backups.run_backup(Utc::now()).await?;
            render(&report, cli.json, || {
                format!("Backup written to {} ({} bytes)", report.path, report.size_bytes)
            })?;
        }
        Commands::DbStatus => {
            let state = connect(&cfg).await?;
            let status = state.services.admin.database_status().await?;
            render(&status, cli.json, || {
                let mut lines = vec![format!(
                    "{} reachable in {:.1} ms",
                    status.backend, status.latency_ms
                )];
                lines.extend(
                    status
                        .tables
                        .iter()
                        .map(|t| format!("  {:<24} {}", t.table, t.rows)),
                );
                lines.join("\n")
            })?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "restaurant", about = "Operations CLI for the restaurant API", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create the demo company, branch, menu and tables
    Seed,
    /// Create the first super admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Move finished orders into the sales archive now
    Archive,
    /// Write a database backup into the configured directory
    Backup,
    /// Show connectivity and row counts
    DbStatus,
}

async fn connect(cfg: &AppConfig) -> Result<AppState> {
    let pool = db::establish_connection_with_config(&DbConfig::from(cfg))
        .await
        .context("failed to connect to the database")?;
    let (sender, rx) = events::channel(64);
    tokio::spawn(events::process_events(rx));
    debug!("CLI connected to database");
    Ok(AppState::new(pool, cfg.clone(), sender))
}

fn render<T: Serialize>(value: &T, json: bool, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

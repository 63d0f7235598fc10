use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use registry_common::session::session_cookie;
use registry_common::LinkCheckPolicy;
use registry_links::LinkChecker;
use registry_store::{SearchCriteria, StatementStore, User, MIGRATOR};

#[derive(Parser)]
#[command(name = "registry", about = "Modern Slavery Registry operator tools")]
struct Cli {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Check statement URLs now instead of waiting for the server's worker
    RecheckUrls {
        /// Check every statement, not just the pending ones
        #[arg(long)]
        all: bool,

        /// Per-attempt timeout in seconds
        #[arg(long, env = "URL_CHECK_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,
    },

    /// Write the newest-per-company CSV export
    Export {
        /// Include unpublished statements and the verification columns
        #[arg(long)]
        admin: bool,

        /// Only companies whose name contains this text
        #[arg(long)]
        company_name: Option<String>,

        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print a Set-Cookie value signing in an existing user
    Session {
        #[arg(long)]
        email: String,

        #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries exports and cookies; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&cli.database_url)
        .await
        .context("Failed to connect to Postgres")?;

    match cli.command {
        Command::Migrate => {
            MIGRATOR.run(&pool).await.context("Failed to run migrations")?;
            info!("Migrations complete");
        }
        Command::RecheckUrls { all, timeout_secs } => {
            recheck_urls(pool, all, Duration::from_secs(timeout_secs)).await?;
        }
        Command::Export {
            admin,
            company_name,
            output,
        } => {
            export(pool, admin, company_name, output).await?;
        }
        Command::Session { email, secret } => {
            let user = User::find_by_email(&email, &pool)
                .await?
                .with_context(|| format!("No user with email {email}"))?;
            println!("{}", session_cookie(user.id, &secret));
        }
    }

    Ok(())
}

async fn recheck_urls(pool: PgPool, all: bool, timeout: Duration) -> Result<()> {
    let store = StatementStore::new(pool, LinkCheckPolicy::default().with_timeout(timeout));
    let checker = LinkChecker::http(store.clone())?;

    if !all {
        let attempted = checker.sweep_pending().await?;
        info!(attempted, "Pending statement URLs checked");
        return Ok(());
    }

    let ids = store.all_ids().await?;
    let mut broken = 0;
    for &id in &ids {
        match checker.check_statement(id).await {
            Ok(Some(outcome)) if outcome.broken_url => broken += 1,
            Ok(_) => {}
            Err(e) => warn!(statement_id = id, error = %e, "Link check failed"),
        }
    }

    info!(checked = ids.len(), broken, "All statement URLs checked");
    Ok(())
}

async fn export(
    pool: PgPool,
    admin: bool,
    company_name: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let store = StatementStore::new(pool, LinkCheckPolicy::disabled());
    let criteria = SearchCriteria {
        company_name,
        ..SearchCriteria::default()
    };
    let statements = store.search(&criteria, admin).await?;

    let out: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    registry_export::write_csv(out, &statements, admin)?;

    info!(rows = statements.len(), admin, "Export written");
    Ok(())
}

//! prayer-guard CLI
//!
//! Operator tool for checking passwords, inspecting spam scores and driving
//! prayer commitments against a database.
//!
//! # Usage
//!
//! ```bash
//! # Validate a password
//! prayer-guard check-password 'BlueSky!Prayer2026'
//!
//! # Score a user's next commitment
//! prayer-guard --db sqlite://prayer.db check-spam 6f1c...
//!
//! # Admin report of users who rarely confirm their prayers
//! prayer-guard stats
//! ```

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use prayer_guard::config::{Config, LoggingConfig};
use prayer_guard::password::validate_password;
use prayer_guard::prayer::PrayerService;
use prayer_guard::spam::SpamManager;
use prayer_guard::store::SqliteCommitmentStore;
use prayer_guard::GuardError;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "prayer-guard")]
#[command(about = "Prayer commitment spam checks and password policy", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL, overrides the config file (e.g., sqlite://prayer.db)
    #[arg(short, long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a password against the account policy
    CheckPassword {
        password: String,
    },
    /// Score a user's next prayer commitment
    CheckSpam {
        /// User ID
        user: String,
    },
    /// Create or update a profile
    AddProfile {
        /// User ID
        user: String,
        /// Account creation time (RFC 3339), defaults to now
        #[arg(long)]
        created_at: Option<DateTime<Utc>>,
    },
    /// Commit a user to pray for a request
    Commit {
        user: String,
        request_id: i64,
    },
    /// Confirm that a user prayed for a request
    Confirm {
        user: String,
        request_id: i64,
        /// Optional note shown in the activity feed
        #[arg(long)]
        note: Option<String>,
    },
    /// Withdraw a commitment
    Uncommit {
        user: String,
        request_id: i64,
    },
    /// Show users with a suspiciously low confirmation ratio
    Stats,
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("prayer_guard={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn open(config: &Config) -> anyhow::Result<(Arc<SqliteCommitmentStore>, SpamManager)> {
    let store = Arc::new(
        SqliteCommitmentStore::connect(&config.storage.database_url)
            .await
            .with_context(|| format!("Failed to open {}", config.storage.database_url))?,
    );
    let spam = SpamManager::new(store.clone(), config.spam.clone());
    Ok((store, spam))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.storage.database_url = db;
    }

    init_logging(&config.logging);
    debug!("Configuration loaded: {:?}", config);

    match cli.command {
        Commands::CheckPassword { password } => {
            let result = validate_password(&password);
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.valid {
                std::process::exit(1);
            }
        }
        Commands::CheckSpam { user } => {
            let (_, spam) = open(&config).await?;
            let result = spam.check_prayer_commitment_spam(&user).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::AddProfile { user, created_at } => {
            let (store, _) = open(&config).await?;
            let created_at = created_at.unwrap_or_else(Utc::now);
            store.upsert_profile(&user, created_at).await?;
            println!("✓ Profile {} created at {}", user, created_at.to_rfc3339());
        }
        Commands::Commit { user, request_id } => {
            let (store, spam) = open(&config).await?;
            let service = PrayerService::new(store, spam);
            match service.commit_to_pray(&user, request_id).await {
                Ok(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                Err(GuardError::CommitmentBlocked(reason)) => {
                    eprintln!("✗ {}", reason);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Confirm {
            user,
            request_id,
            note,
        } => {
            let (store, spam) = open(&config).await?;
            let service = PrayerService::new(store, spam);
            let commitment = service
                .confirm_prayed(&user, request_id, note.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&commitment)?);
        }
        Commands::Uncommit { user, request_id } => {
            let (store, spam) = open(&config).await?;
            let service = PrayerService::new(store, spam);
            if service.uncommit(&user, request_id).await? {
                println!("✓ Commitment removed");
            } else {
                println!("✗ No commitment by {} for request {}", user, request_id);
                std::process::exit(1);
            }
        }
        Commands::Stats => {
            let (_, spam) = open(&config).await?;
            let stats = spam.spam_statistics().await;
            info!("{} of {} users flagged", stats.suspicious_users, stats.total_users);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

//! Tamarind Market CLI - Schema and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the database schema (same statements the server runs at startup)
//! tamarind-cli schema
//!
//! # Promote a registered user to admin
//! tamarind-cli admin promote -e admin@example.com
//!
//! # Seed the catalog with sample categories and products
//! tamarind-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `SERVER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tamarind-cli")]
#[command(author, version, about = "Tamarind Market CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the database schema
    Schema,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the catalog with sample data
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Promote an existing user to the admin role
    Promote {
        /// Email of the user to promote
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tamarind_cli=info,tamarind_server=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Schema => commands::schema::run().await,
        Commands::Admin {
            action: AdminAction::Promote { email },
        } => commands::admin::promote(&email).await,
        Commands::Seed => commands::seed::run().await,
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

//! Real Taste CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! real-taste-cli migrate
//!
//! # Create (or promote) an admin account
//! real-taste-cli admin create -e owner@realtastecafe.com -n "Owner" -p "s3cret-pass"
//!
//! # Insert default settings and a starter menu
//! real-taste-cli seed
//!
//! # Bulk import from a JSON array file
//! real-taste-cli import categories menu/categories.json
//! real-taste-cli import products menu/products.json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users
//! - `seed` - Seed settings and a demo menu
//! - `import` - Import products or categories from JSON

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "real-taste-cli")]
#[command(author, version, about = "Real Taste CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert default settings, plus a demo menu when the catalog is empty
    Seed {
        /// Only write the settings rows
        #[arg(long)]
        settings_only: bool,
    },
    /// Import catalog data from a JSON file
    Import {
        #[command(subcommand)]
        target: ImportTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user, or promote an existing account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Password (falls back to `ADMIN_PASSWORD`)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ImportTarget {
    /// Import products from a JSON array
    Products {
        /// Path to the JSON file
        file: String,
    },
    /// Import categories from a JSON array (parents before children)
    Categories {
        /// Path to the JSON file
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&email, &name, password.as_deref()).await?;
            }
        },
        Commands::Seed { settings_only } => commands::seed::run(settings_only).await?,
        Commands::Import { target } => match target {
            ImportTarget::Products { file } => {
                commands::import::products(&file).await?;
            }
            ImportTarget::Categories { file } => {
                commands::import::categories(&file).await?;
            }
        },
    }
    Ok(())
}

//! Pazar CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! pazar-cli migrate
//!
//! # Insert default store settings and a demo product type
//! pazar-cli seed
//!
//! # Create a discount code (code is generated when omitted)
//! pazar-cli discount create --kind percentage --value 10 --code SPRING10
//! ```
//!
//! Every command reads `PAZAR_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` first when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use pazar_core::DiscountKind;

mod commands;

#[derive(Parser)]
#[command(name = "pazar-cli")]
#[command(author, version, about = "Pazar CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert default store settings and a demo product type
    Seed,
    /// Manage discount codes
    Discount {
        #[command(subcommand)]
        action: DiscountAction,
    },
}

#[derive(Subcommand)]
enum DiscountAction {
    /// Create a new discount code
    Create {
        /// Code customers type at checkout (generated if omitted)
        #[arg(short, long)]
        code: Option<String>,

        /// `percentage` or `fixed`
        #[arg(short, long)]
        kind: DiscountKind,

        /// Percent off (0-100] or fixed amount off
        #[arg(short, long)]
        value: Decimal,

        /// Maximum number of orders that may use the code
        #[arg(long)]
        usage_limit: Option<i32>,

        /// Start of validity (RFC 3339)
        #[arg(long)]
        starts_at: Option<DateTime<Utc>>,

        /// End of validity (RFC 3339)
        #[arg(long)]
        ends_at: Option<DateTime<Utc>>,

        /// Create the code switched off
        #[arg(long)]
        inactive: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed => commands::seed::run().await?,
        Commands::Discount { action } => match action {
            DiscountAction::Create {
                code,
                kind,
                value,
                usage_limit,
                starts_at,
                ends_at,
                inactive,
            } => {
                commands::discount::create(commands::discount::NewDiscount {
                    code,
                    kind,
                    value,
                    usage_limit,
                    starts_at,
                    ends_at,
                    is_active: !inactive,
                })
                .await?;
            }
        },
    }
    Ok(())
}

//! Fuki CLI - drive the storefront views from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Place an order for the lines in a cart file
//! fuki checkout --cart cart.yaml --name "Lan" --phone 0901234567 \
//!     --address "12 Hang Bac, Hanoi" --payment-method 1
//!
//! # Show a product with its reviews and comments
//! fuki product show 5 --html
//!
//! # Comment on, review, or like a product (needs FUKI_API_TOKEN)
//! fuki product comment 5 "Arrived quickly"
//! fuki product review 5 --rate 4 --content "Fresh and fragrant"
//! fuki product like 5
//! ```
//!
//! # Environment Variables
//!
//! - `FUKI_API_BASE_URL` - storefront API root (required)
//! - `FUKI_API_TOKEN` - user token for authenticated actions
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - error reporting
//! - `RUST_LOG` - log filter (defaults to `fuki=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fuki_core::ProductId;
use fuki_storefront::{ApiClient, StorefrontConfig};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;
use commands::checkout::CheckoutArgs;

#[derive(Parser)]
#[command(name = "fuki")]
#[command(version, about = "Fuki storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place an order for the lines in a cart file
    Checkout(CheckoutArgs),
    /// Show and interact with a product
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// Show a product with its reviews and comments
    Show {
        /// Product ID
        id: ProductId,

        /// Print the rendered HTML page instead of a summary
        #[arg(long)]
        html: bool,
    },
    /// Post a comment
    Comment {
        /// Product ID
        id: ProductId,

        /// Comment text
        content: String,
    },
    /// Post a review
    Review {
        /// Product ID
        id: ProductId,

        /// Star rating (1-5)
        #[arg(short, long)]
        rate: u8,

        /// Review text
        #[arg(short, long)]
        content: String,
    },
    /// Toggle your like
    Like {
        /// Product ID
        id: ProductId,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first so Sentry is up before the subscriber
    let config = StorefrontConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fuki=info,fuki_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(CliError::from(fuki_storefront::AppError::from(e))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CliError> {
    let api = ApiClient::new(&config.api).map_err(fuki_storefront::AppError::from)?;

    match cli.command {
        Commands::Checkout(args) => commands::checkout::run(api, args).await,
        Commands::Product { action } => match action {
            ProductAction::Show { id, html } => commands::product::show(api, id, html).await,
            ProductAction::Comment { id, content } => {
                commands::product::comment(api, id, content).await
            }
            ProductAction::Review { id, rate, content } => {
                commands::product::review(api, id, rate, content).await
            }
            ProductAction::Like { id } => commands::product::like(api, id).await,
        },
    }
}

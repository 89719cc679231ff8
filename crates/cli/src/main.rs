//! Girlz Love Tech CLI - chat, shop and sandbox from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in (prompts for the password when --password is omitted)
//! glt login -e ada@example.org
//!
//! # Ask the assistant something, or start an interactive chat
//! glt chat "show me beginner robotics kits"
//! glt chat
//!
//! # Manage the cart and check out
//! glt cart add 12 --quantity 2
//! glt cart show
//! glt checkout
//!
//! # Start a sandbox and wait for it to come up
//! glt sandbox create
//! glt sandbox wait --target running
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `register` - Account session
//! - `chat` - Talk to the shopping assistant
//! - `cart` / `products` / `checkout` - Shopping
//! - `schools` / `profile` / `dashboard` - Account information
//! - `sandbox` - Development sandbox lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use glt_client::{ClientConfig, ClientError, ClientState};
use glt_core::{ProductId, SandboxStatus};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "glt")]
#[command(author, version, about = "Girlz Love Tech command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Log out and forget stored tokens
    Logout,
    /// Register a new student account
    Register {
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// School grade
        #[arg(short, long)]
        grade: String,

        /// School name (see `glt schools`)
        #[arg(short, long)]
        school: String,

        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Chat with the shopping assistant
    Chat {
        /// Message to send; starts an interactive session when omitted
        message: Vec<String>,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List products
    Products,
    /// Place an order for everything in the cart
    Checkout,
    /// List schools available at registration
    Schools,
    /// Show the logged-in user's profile
    Profile,
    /// Show badges, orders and chat activity
    Dashboard,
    /// Manage the development sandbox
    Sandbox {
        #[command(subcommand)]
        action: SandboxCommand,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add units of a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set the quantity for a product (0 or less removes it)
    Set {
        product_id: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove one unit of a product
    Remove { product_id: ProductId },
    /// Show cart contents
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum SandboxCommand {
    /// Show sandbox status and URLs
    Status,
    /// Create the sandbox
    Create,
    /// Pause a running sandbox
    Pause,
    /// Resume a paused sandbox
    Resume,
    /// Rebuild the sandbox from a clean image
    Reset,
    /// Delete the sandbox
    Delete,
    /// Wait until the sandbox reaches a status
    Wait {
        /// Status to wait for (`running`, `paused`, `deleted`)
        #[arg(short, long, default_value = "running")]
        target: SandboxStatus,

        /// Seconds between checks
        #[arg(short, long, default_value_t = 2)]
        interval: u64,

        /// Maximum number of checks
        #[arg(short, long, default_value_t = 30)]
        max_polls: u32,
    },
}

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "glt_client=info,glt_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let state = ClientState::new(config)?;
    state.restore_session();

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&state, &email, password).await?;
        }
        Commands::Logout => commands::account::logout(&state).await,
        Commands::Register {
            email,
            name,
            grade,
            school,
            password,
        } => {
            commands::account::register(&state, email, name, grade, school, password).await?;
        }
        Commands::Chat { message } => {
            if message.is_empty() {
                commands::chat::interactive(&state).await?;
            } else {
                commands::chat::one_shot(&state, &message.join(" ")).await?;
            }
        }
        Commands::Cart { action } => match action {
            CartAction::Add {
                product_id,
                quantity,
            } => commands::shop::add(&state, product_id, quantity),
            CartAction::Set {
                product_id,
                quantity,
            } => commands::shop::set(&state, product_id, quantity),
            CartAction::Remove { product_id } => commands::shop::remove(&state, product_id),
            CartAction::Show => commands::shop::show(&state).await,
            CartAction::Clear => commands::shop::clear(&state),
        },
        Commands::Products => commands::shop::products(&state).await?,
        Commands::Checkout => commands::shop::checkout(&state).await?,
        Commands::Schools => commands::account::schools(&state).await?,
        Commands::Profile => commands::account::profile(&state).await?,
        Commands::Dashboard => commands::account::dashboard(&state).await?,
        Commands::Sandbox { action } => match action {
            SandboxCommand::Status => commands::sandbox::status(&state).await?,
            SandboxCommand::Create => commands::sandbox::create(&state).await?,
            SandboxCommand::Pause => commands::sandbox::pause(&state).await?,
            SandboxCommand::Resume => commands::sandbox::resume(&state).await?,
            SandboxCommand::Reset => commands::sandbox::reset(&state).await?,
            SandboxCommand::Delete => commands::sandbox::delete(&state).await?,
            SandboxCommand::Wait {
                target,
                interval,
                max_polls,
            } => commands::sandbox::wait(&state, target, interval, max_polls).await?,
        },
    }
    Ok(())
}

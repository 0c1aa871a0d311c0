//! Address book CLI - manage your account and postal addresses.
//!
//! # Usage
//!
//! ```bash
//! # Create an account and log in
//! abook register -n "Ana Souza" -e ana@example.com -p secret
//! abook login -e ana@example.com -p secret
//!
//! # Show the profile and addresses
//! abook show
//!
//! # Manage addresses
//! abook address add --street "Rua da Praia" --number 10 --city "Porto Alegre"
//! abook address edit 3 --city "Recife"
//! abook address delete 3
//!
//! # Profile
//! abook profile update -n "Ana S." -e ana.s@example.com
//! abook profile delete
//!
//! abook logout
//! ```
//!
//! # Environment Variables
//!
//! - `ADDRESSBOOK_API_URL` - Base URL of the account service (required)
//! - `ADDRESSBOOK_SESSION_FILE` - Where the session token is kept
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `RUST_LOG` - Log filter (default: `addressbook_client=info,addressbook_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use addressbook_client::{ClientConfig, FileSessionStore, HttpAccountApi};
use clap::{Args, Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use commands::View;
use error::CliError;

#[derive(Parser)]
#[command(name = "abook")]
#[command(author, version, about = "Address book account and address management")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the profile and all addresses
    Show,
    /// Manage the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage addresses
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change name and email
    Update {
        /// New display name
        #[arg(short, long)]
        name: String,

        /// New email
        #[arg(short, long)]
        email: String,
    },
    /// Delete the account and log out
    Delete,
}

#[derive(Subcommand)]
enum AddressAction {
    /// Add a new address
    Add(AddressFieldArgs),
    /// Edit an existing address; omitted fields keep their value
    Edit {
        /// Address id
        id: u64,

        #[command(flatten)]
        fields: AddressFieldArgs,
    },
    /// Delete an address
    Delete {
        /// Address id
        id: u64,
    },
}

/// Address fields settable from the command line.
#[derive(Args, Debug, Default)]
pub struct AddressFieldArgs {
    /// Street name
    #[arg(long)]
    pub street: Option<String>,

    /// House or building number
    #[arg(long)]
    pub number: Option<String>,

    /// Apartment, suite, floor
    #[arg(long)]
    pub complement: Option<String>,

    /// City
    #[arg(long)]
    pub city: Option<String>,

    /// State or province
    #[arg(long)]
    pub state: Option<String>,

    /// Postal code
    #[arg(long)]
    pub zipcode: Option<String>,

    /// Country
    #[arg(long)]
    pub country: Option<String>,
}

impl AddressFieldArgs {
    /// The given fields as `(name, value)` pairs.
    pub fn provided(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("street", &self.street),
            ("number", &self.number),
            ("complement", &self.complement),
            ("city", &self.city),
            ("state", &self.state),
            ("zipcode", &self.zipcode),
            ("country", &self.country),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so stdout carries only command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "addressbook_client=info,addressbook_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration first: the Sentry DSN is needed before tracing starts
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CliError> {
    let view = View::new(
        HttpAccountApi::new(config),
        FileSessionStore::new(&config.session_file),
    );

    match cli.command {
        Commands::Login { email, password } => {
            commands::session::login(&view, &email, password).await
        }
        Commands::Register {
            name,
            email,
            password,
        } => commands::session::register(&view, &name, &email, password).await,
        Commands::Logout => {
            commands::session::logout(&view).await;
            Ok(())
        }
        Commands::Show => commands::account::show(&view).await,
        Commands::Profile { action } => match action {
            ProfileAction::Update { name, email } => {
                commands::account::update_profile(&view, &name, &email).await
            }
            ProfileAction::Delete => commands::account::delete_account(&view).await,
        },
        Commands::Address { action } => match action {
            AddressAction::Add(fields) => commands::address::add(&view, &fields).await,
            AddressAction::Edit { id, fields } => {
                commands::address::edit(&view, id, &fields).await
            }
            AddressAction::Delete { id } => commands::address::delete(&view, id).await,
        },
    }
}

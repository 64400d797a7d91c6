//! Scholar CLI - accounts and sessions in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{account, admin, config, logs, session};

/// Scholar - accounts, sessions and roles
#[derive(Parser)]
#[command(name = "scholar", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account (does not sign in)
    Register(account::RegisterArgs),

    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        /// Password (falls back to SCHOLAR_PASSWORD, then a prompt)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change the signed-in user's password
    Passwd {
        #[arg(long)]
        current_password: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit the signed-in user's profile
    Profile(account::ProfileArgs),

    /// List all accounts (admins only)
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show login history, newest first (admins only)
    Logins {
        /// Show at most N records
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Role administration (admins only)
    Admin {
        #[command(subcommand)]
        command: admin::AdminCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SCHOLAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register(args) => account::run_register(args),
        Commands::Login { email, password, json } => session::run_login(&email, password, json),
        Commands::Logout { json } => session::run_logout(json),
        Commands::Whoami { json } => session::run_whoami(json),
        Commands::Passwd { current_password, new_password, json } => {
            session::run_passwd(current_password, new_password, json)
        }
        Commands::Profile(args) => account::run_profile(args),
        Commands::Users { json } => admin::run_users(json),
        Commands::Logins { limit, json } => admin::run_logins(limit, json),
        Commands::Admin { command } => admin::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Config { command } => config::run(command),
    }
}

mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod session;
mod sync;
#[cfg(test)]
mod testing;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::auth::{self as auth_cmd, LoginArgs, SignupArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::tickets::{self, TicketsArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::http::HttpTicketClient;
use crate::session::SessionStore;

const LOG_ENV: &str = "TICKETDESK_LOG";

#[derive(Parser)]
#[command(name = "ticketdesk", author, version, about = "Support desk client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session.
    Login(LoginArgs),
    /// Create an account and log in with it.
    Signup(SignupArgs),
    /// Forget the stored session.
    Logout,
    /// Show the logged-in identity.
    Whoami,
    /// Work with tickets in the view for your role.
    Tickets(TicketsArgs),
    /// List agents available for assignment (admins).
    Agents,
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(error) = run().await {
        eprintln!("Error: {}", error.user_message());
        if error.is_retryable() {
            eprintln!("Set {LOG_ENV}=debug for request details.");
        }
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    if let Commands::Config(args) = cli.command {
        return config_cmd::run(args.command);
    }

    let context = build_context()?;
    match cli.command {
        Commands::Login(args) => auth_cmd::run_login(&context, args).await,
        Commands::Signup(args) => auth_cmd::run_signup(&context, args).await,
        Commands::Logout => auth_cmd::run_logout(&context),
        Commands::Whoami => auth_cmd::run_whoami(&context),
        Commands::Tickets(args) => tickets::run(&context, args.command).await,
        Commands::Agents => tickets::run_agents(&context).await,
        Commands::Config(_) => Ok(()),
    }
}

fn build_context() -> AppResult<AppContext> {
    let config = AppConfig::load()?;
    let sessions = Arc::new(SessionStore::open_default()?);
    let session = sessions.load()?;
    if session.is_none() {
        debug!("no stored session; only login and signup will work");
    }

    let client = Arc::new(HttpTicketClient::new(
        &config.api_base_url,
        config.request_timeout,
        session.clone(),
    )?);

    Ok(AppContext::new(
        config,
        sessions,
        session,
        client.clone(),
        client,
    ))
}

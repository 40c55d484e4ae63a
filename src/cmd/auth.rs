use std::io::{self, Write};

use clap::Args;
use tracing::info;

use crate::context::AppContext;
use crate::domain::role::Role;
use crate::domain::session::Session;
use crate::error::{AppError, AppResult};
use crate::services::NewAccount;

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,
    /// Prompted for when omitted.
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub name: String,
    #[arg(short, long)]
    pub email: String,
    /// Prompted for when omitted.
    #[arg(short, long)]
    pub password: Option<String>,
    /// Requested role (user, agent or admin); the service may ignore it.
    #[arg(short, long, value_parser = parse_role)]
    pub role: Option<Role>,
}

pub async fn run_login(ctx: &AppContext, args: LoginArgs) -> AppResult<()> {
    let password = password_or_prompt(args.password)?;
    let session = ctx.auth.login(&args.email, &password).await?;
    persist(ctx, &session)
}

pub async fn run_signup(ctx: &AppContext, args: SignupArgs) -> AppResult<()> {
    let password = password_or_prompt(args.password)?;
    let session = ctx
        .auth
        .signup(NewAccount {
            name: args.name,
            email: args.email,
            password,
            role: args.role,
        })
        .await?;
    persist(ctx, &session)
}

pub fn run_logout(ctx: &AppContext) -> AppResult<()> {
    ctx.sessions.clear()?;
    println!("Logged out.");
    Ok(())
}

pub fn run_whoami(ctx: &AppContext) -> AppResult<()> {
    let session = ctx.require_session()?;
    let identity = &session.identity;
    println!(
        "{} ({}) role: {}",
        identity.name.as_deref().unwrap_or("<unnamed>"),
        identity.email.as_deref().unwrap_or(identity.id.as_str()),
        identity.role
    );
    Ok(())
}

fn persist(ctx: &AppContext, session: &Session) -> AppResult<()> {
    ctx.sessions.save(session)?;
    info!(user = %session.user_id(), role = %session.role(), "logged in");
    println!(
        "Logged in as {} ({} view).",
        session
            .identity
            .name
            .as_deref()
            .unwrap_or(session.identity.id.as_str()),
        session.role()
    );
    Ok(())
}

fn password_or_prompt(password: Option<String>) -> AppResult<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut stdout = io::stdout();
    write!(stdout, "Password: ")?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let password = input.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::Validation("password must not be empty".to_string()));
    }
    Ok(password)
}

fn parse_role(value: &str) -> Result<Role, String> {
    Role::from_str(value).ok_or_else(|| format!("unknown role '{value}'"))
}

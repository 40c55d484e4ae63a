use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{API_URL_ENV, StoredConfig, TIMEOUT_ENV, config_file_path};
use crate::domain::status::StatusFilter;
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration.
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring ticketdesk.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    apply_prompt(
        "Ticket service URL (e.g., https://support.example.com/api/v1)",
        &mut cfg.api_base_url,
    )?;

    let mut timeout = cfg.request_timeout_secs.map(|secs| secs.to_string());
    apply_prompt("Request timeout in seconds", &mut timeout)?;
    cfg.request_timeout_secs = match timeout {
        Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
            AppError::Configuration(format!("'{raw}' is not a number of seconds"))
        })?),
        None => None,
    };

    apply_prompt(
        "Default status filter (all/open/in_progress/resolved/closed)",
        &mut cfg.default_status_filter,
    )?;
    if let Some(raw) = cfg.default_status_filter.as_deref() {
        let filter = StatusFilter::from_str(raw)
            .ok_or_else(|| AppError::Configuration(format!("unknown status filter '{raw}'")))?;
        cfg.default_status_filter = Some(filter.as_str().to_string());
    }

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Ticket service URL: {}", display_value(&cfg.api_base_url));
    println!(
        "Request timeout: {}",
        display_value(&cfg.request_timeout_secs.map(|secs| format!("{secs}s")))
    );
    println!(
        "Default status filter: {}",
        display_value(&cfg.default_status_filter)
    );
    println!("({API_URL_ENV} and {TIMEOUT_ENV} override the stored values.)");

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>) -> AppResult<()> {
    match prompt(field, target.as_deref())? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match current {
        Some(value) => write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?,
        None => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(PromptAction::parse(&input))
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use crate::context::AppContext;
use crate::domain::role::Role;
use crate::domain::status::{StatusFilter, TicketStatus};
use crate::domain::ticket::{Priority, Ticket, TicketId, UserId};
use crate::error::AppResult;
use crate::sync::controller::{DetailView, MutationOutcome};
use crate::workflow::dashboard::Dashboard;

#[derive(Args, Debug, Clone)]
pub struct TicketsArgs {
    #[command(subcommand)]
    pub command: TicketsCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketsCommand {
    /// List visible tickets with per-status counts.
    List {
        /// all, open, in_progress, resolved or closed.
        #[arg(short, long, value_parser = parse_filter)]
        status: Option<StatusFilter>,
        /// Case-insensitive match on title, id and description.
        #[arg(short = 'q', long)]
        search: Option<String>,
    },
    /// Show one ticket with its discussion.
    Show { id: String },
    /// Open a new ticket.
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        description: String,
        #[arg(short, long, value_parser = parse_priority, default_value = "low")]
        priority: Priority,
    },
    /// Add a comment to a ticket.
    Comment { id: String, text: String },
    /// Set a ticket's status (agents and admins).
    Status {
        id: String,
        #[arg(value_parser = parse_status)]
        status: TicketStatus,
    },
    /// Resolve an open ticket or reopen a closed one.
    Toggle { id: String },
    /// Set a ticket's priority (agents and admins).
    Priority {
        id: String,
        #[arg(value_parser = parse_priority)]
        priority: Priority,
    },
    /// Assign a ticket to an agent (admins).
    Assign { id: String, agent_id: String },
}

pub async fn run(ctx: &AppContext, command: TicketsCommand) -> AppResult<()> {
    let mut dashboard = ctx.dashboard()?;
    dashboard.set_status_filter(ctx.config.default_status_filter);
    dashboard.mount().await?;

    match command {
        TicketsCommand::List { status, search } => {
            if let Some(filter) = status {
                dashboard.set_status_filter(filter);
            }
            if let Some(search) = search {
                dashboard.set_search(search);
            }
            print_list(&dashboard);
            Ok(())
        }
        TicketsCommand::Show { id } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            dashboard.reload_selection().await?;
            print_detail(&dashboard);
            Ok(())
        }
        TicketsCommand::Create {
            title,
            description,
            priority,
        } => {
            let ticket = dashboard
                .create_ticket(&title, &description, priority)
                .await?;
            println!("Ticket {} created ({}).", ticket.id, ticket.status);
            Ok(())
        }
        TicketsCommand::Comment { id, text } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            let outcome = dashboard.submit_comment(&text).await;
            report(&dashboard, outcome, "Comment added.")
        }
        TicketsCommand::Status { id, status } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            let outcome = dashboard.change_status(status).await;
            report(&dashboard, outcome, "Status updated.")
        }
        TicketsCommand::Toggle { id } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            let outcome = dashboard.toggle_status().await;
            report(&dashboard, outcome, "Status updated.")
        }
        TicketsCommand::Priority { id, priority } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            let outcome = dashboard.change_priority(priority).await;
            report(&dashboard, outcome, "Priority updated.")
        }
        TicketsCommand::Assign { id, agent_id } => {
            dashboard.select_by_id(&TicketId::new(id))?;
            let outcome = dashboard.assign(&UserId::new(agent_id)).await;
            report(&dashboard, outcome, "Ticket assigned.")
        }
    }
}

pub async fn run_agents(ctx: &AppContext) -> AppResult<()> {
    let mut dashboard = ctx.dashboard()?;
    let agents = dashboard.load_agents().await?;
    if agents.is_empty() {
        println!("No agents found.");
    }
    for agent in agents {
        println!(
            "{:<26} {} {}",
            agent.id,
            agent.name,
            agent.email.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn report(
    dashboard: &Dashboard,
    outcome: AppResult<MutationOutcome>,
    done: &str,
) -> AppResult<()> {
    match outcome? {
        MutationOutcome::Applied(_) => {
            println!("{done}");
            print_detail(dashboard);
        }
        MutationOutcome::Unchanged => println!("Nothing to change."),
        MutationOutcome::Stale => println!("A newer change superseded this one."),
    }
    Ok(())
}

fn print_list(dashboard: &Dashboard) {
    let counts = dashboard.status_counts();
    let summary = dashboard
        .status_vocabulary()
        .iter()
        .map(|status| format!("{}: {}", status.label(), counts.get(*status)))
        .collect::<Vec<_>>()
        .join("  ");
    println!("All: {}  {summary}", counts.total);
    println!();

    if dashboard.collection().is_empty() {
        println!("No tickets yet.");
        return;
    }
    let filter = dashboard.status_filter();
    let visible = dashboard.visible();
    if visible.is_empty() {
        println!("No tickets found for status \"{}\".", filter.as_str());
        return;
    }
    for ticket in &visible {
        println!("{}", list_line(ticket));
    }
    println!();
    println!(
        "{} shown of {} {} tickets.",
        visible.len(),
        counts.for_filter(&filter),
        filter.as_str()
    );
}

fn list_line(ticket: &Ticket) -> String {
    format!(
        "{:<26} {:<12} {:<7} {}",
        ticket.id,
        ticket.status.label(),
        ticket.priority,
        ticket.title
    )
}

fn print_detail(dashboard: &Dashboard) {
    match dashboard.detail() {
        Some(view) => print!("{}", render_detail(&view, dashboard.role())),
        None => println!("Select a ticket to view details."),
    }
}

fn render_detail(view: &DetailView, role: Role) -> String {
    let ticket = &view.ticket;
    let mut out = String::new();
    out.push_str(&format!("{}\n", ticket.title));
    out.push_str(&format!("Ticket ID: {}\n", ticket.id));
    out.push_str(&format!(
        "Status: {}  Priority: {}\n",
        ticket.status, ticket.priority
    ));
    out.push_str(&format!(
        "User: {}  Created: {}  Updated: {}\n",
        ticket
            .owner_user_id
            .as_ref()
            .map(|id| id.as_str())
            .unwrap_or("N/A"),
        format_time(ticket.created_at),
        format_time(ticket.updated_at)
    ));
    match &ticket.assigned_agent {
        Some(agent) => out.push_str(&format!(
            "Assigned to: {}\n",
            agent.name.as_deref().unwrap_or(agent.id.as_str())
        )),
        None => out.push_str("Not assigned yet\n"),
    }
    out.push_str(&format!("\n{}\n", ticket.description));
    out.push_str(&format!("\nDiscussion ({})\n", ticket.comments.len()));
    if ticket.comments.is_empty() {
        out.push_str("No comments yet.\n");
    }
    for comment in &ticket.comments {
        out.push_str(&format!(
            "- [{}] {}: {}\n",
            comment
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "Just now".to_string()),
            comment
                .author_id
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("unknown"),
            comment.text
        ));
    }
    if view.comment_busy {
        out.push_str("Sending comment...\n");
    } else if !view.comments_enabled {
        out.push_str("Ticket is closed, reopen to add comments.\n");
    }
    if !view.comment_busy && !view.draft_comment.trim().is_empty() {
        out.push_str(&format!("Unsent comment: {}\n", view.draft_comment.trim()));
    }
    if role.can_change_status() {
        let action = if view.status_busy {
            "Updating..."
        } else {
            view.toggle_label
        };
        out.push_str(&format!("Action: {action} (ticketdesk tickets toggle {})\n", ticket.id));
    }
    if let Some(error) = &view.error {
        out.push_str(&format!("! {error}\n"));
    }
    out
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn parse_filter(value: &str) -> Result<StatusFilter, String> {
    StatusFilter::from_str(value).ok_or_else(|| format!("unknown status filter '{value}'"))
}

fn parse_status(value: &str) -> Result<TicketStatus, String> {
    TicketStatus::from_str(value).ok_or_else(|| format!("unknown status '{value}'"))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::from_str(value).ok_or_else(|| format!("unknown priority '{value}'"))
}

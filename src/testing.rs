//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::domain::role::Role;
use crate::domain::session::{Identity, Session};
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{Agent, NewTicket, Priority, Ticket, TicketId, TicketPatch, UserId};
use crate::error::{AppError, AppResult};
use crate::services::TicketTransport;

pub fn ticket(id: &str, status: TicketStatus) -> Ticket {
    Ticket {
        id: TicketId::new(id),
        title: format!("Ticket {id}"),
        description: String::new(),
        status,
        priority: Priority::Medium,
        owner_user_id: Some(UserId::new("owner")),
        assigned_agent: None,
        comments: Vec::new(),
        created_at: None,
        updated_at: None,
    }
}

pub fn ticket_updated_at(id: &str, status: TicketStatus, day: u32) -> Ticket {
    let mut t = ticket(id, status);
    t.updated_at = Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).single();
    t
}

pub fn session(role: Role) -> Session {
    Session {
        identity: Identity {
            id: UserId::new(format!("{}-1", role.as_str())),
            name: None,
            email: None,
            role,
        },
        token: "token".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListTickets,
    GetTicket(TicketId),
    CreateTicket(NewTicket),
    UpdateStatus(TicketId, TicketStatus),
    UpdateFields(TicketId, TicketPatch),
    Assign(TicketId, UserId),
    AddComment(TicketId, String),
    ListAgents,
}

/// Records every call and answers from queued responses.
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    lists: Mutex<VecDeque<AppResult<Vec<Ticket>>>>,
    tickets: Mutex<VecDeque<AppResult<Ticket>>>,
    agents: Mutex<Vec<Agent>>,
    agents_failure: Mutex<Option<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_list(&self, result: AppResult<Vec<Ticket>>) {
        self.lists.lock().unwrap().push_back(result);
    }

    pub fn push_ticket(&self, result: AppResult<Ticket>) {
        self.tickets.lock().unwrap().push_back(result);
    }

    pub fn set_agents(&self, agents: Vec<Agent>) {
        *self.agents.lock().unwrap() = agents;
    }

    pub fn fail_agents(&self, message: &str) {
        *self.agents_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_ticket(&self) -> AppResult<Ticket> {
        self.tickets
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Transport("no scripted response".to_string())))
    }
}

#[async_trait]
impl TicketTransport for ScriptedTransport {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        self.record(Call::ListTickets);
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Transport("no scripted list".to_string())))
    }

    async fn get_ticket(&self, id: &TicketId) -> AppResult<Ticket> {
        self.record(Call::GetTicket(id.clone()));
        self.next_ticket()
    }

    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket> {
        self.record(Call::CreateTicket(ticket));
        self.next_ticket()
    }

    async fn update_ticket_status(&self, id: &TicketId, status: TicketStatus) -> AppResult<Ticket> {
        self.record(Call::UpdateStatus(id.clone(), status));
        self.next_ticket()
    }

    async fn update_ticket_fields(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket> {
        self.record(Call::UpdateFields(id.clone(), patch));
        self.next_ticket()
    }

    async fn assign_ticket(&self, id: &TicketId, agent_id: &UserId) -> AppResult<Ticket> {
        self.record(Call::Assign(id.clone(), agent_id.clone()));
        self.next_ticket()
    }

    async fn add_comment(&self, id: &TicketId, text: &str) -> AppResult<Ticket> {
        self.record(Call::AddComment(id.clone(), text.to_string()));
        self.next_ticket()
    }

    async fn list_agents(&self) -> AppResult<Vec<Agent>> {
        self.record(Call::ListAgents);
        if let Some(message) = self.agents_failure.lock().unwrap().clone() {
            return Err(AppError::Transport(message));
        }
        Ok(self.agents.lock().unwrap().clone())
    }
}

use async_trait::async_trait;

use crate::domain::status::TicketStatus;
use crate::domain::ticket::{Agent, NewTicket, Ticket, TicketId, TicketPatch, UserId};
use crate::error::AppResult;

/// Remote ticket operations. Every mutation returns the full updated ticket.
#[async_trait]
pub trait TicketTransport: Send + Sync {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>>;
    async fn get_ticket(&self, id: &TicketId) -> AppResult<Ticket>;
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket>;
    async fn update_ticket_status(&self, id: &TicketId, status: TicketStatus) -> AppResult<Ticket>;
    async fn update_ticket_fields(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket>;
    async fn assign_ticket(&self, id: &TicketId, agent_id: &UserId) -> AppResult<Ticket>;
    async fn add_comment(&self, id: &TicketId, text: &str) -> AppResult<Ticket>;
    async fn list_agents(&self) -> AppResult<Vec<Agent>>;
}

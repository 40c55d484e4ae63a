use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::domain::status::{StatusFilter, TicketStatus};
use crate::domain::ticket::{Ticket, TicketId};
use crate::error::AppResult;
use crate::services::TicketTransport;
use crate::sync::filter;

/// Snapshot of every ticket visible to the current identity. The service
/// scopes the list by role; the cache only ever replaces it wholesale or swaps
/// single entries for server-confirmed copies.
#[derive(Debug, Default)]
pub struct TicketCollection {
    tickets: Vec<Ticket>,
    last_error: Option<String>,
}

impl TicketCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_tickets(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets,
            last_error: None,
        }
    }

    /// On failure the previous snapshot stays in place and the error is kept
    /// for the view.
    pub async fn refresh(&mut self, transport: &dyn TicketTransport) -> AppResult<()> {
        match transport.list_tickets().await {
            Ok(mut tickets) => {
                tickets.sort_by(newest_first);
                debug!(count = tickets.len(), "ticket collection refreshed");
                self.tickets = tickets;
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "ticket refresh failed; keeping previous snapshot");
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub fn filter(&self, status: &StatusFilter, search: &str) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|ticket| filter::matches(ticket, status, search))
            .collect()
    }

    /// Swaps in the confirmed copy at the same position. Returns `false` when
    /// the ticket is not cached.
    pub fn apply_server_update(&mut self, updated: Ticket) -> bool {
        match self.tickets.iter_mut().find(|ticket| ticket.id == updated.id) {
            Some(slot) => {
                *slot = updated;
                true
            }
            None => {
                debug!(ticket = %updated.id, "update for uncached ticket ignored");
                false
            }
        }
    }

    /// New tickets go to the front: they are the most recently updated.
    pub fn insert_created(&mut self, ticket: Ticket) {
        if !self.apply_server_update(ticket.clone()) {
            self.tickets.insert(0, ticket);
        }
    }

    pub fn get(&self, id: &TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| &ticket.id == id)
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts {
            total: self.tickets.len(),
            ..StatusCounts::default()
        };
        for ticket in &self.tickets {
            counts.per_status[status_index(ticket.status)] += 1;
        }
        counts
    }
}

/// Per-status totals for the navigation sidebar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    per_status: [usize; 4],
}

impl StatusCounts {
    pub fn get(&self, status: TicketStatus) -> usize {
        self.per_status[status_index(status)]
    }

    pub fn for_filter(&self, filter: &StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total,
            StatusFilter::Only(status) => self.get(*status),
        }
    }
}

fn status_index(status: TicketStatus) -> usize {
    match status {
        TicketStatus::Open => 0,
        TicketStatus::InProgress => 1,
        TicketStatus::Resolved => 2,
        TicketStatus::Closed => 3,
    }
}

/// `updated_at` descending; tickets without a timestamp sink to the end.
fn newest_first(a: &Ticket, b: &Ticket) -> Ordering {
    match (&a.updated_at, &b.updated_at) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

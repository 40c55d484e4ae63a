use std::collections::HashMap;

use crate::domain::ticket::TicketId;

/// Hands out monotonically increasing numbers per dispatched mutation and
/// remembers the latest one for each ticket, so an older response can be
/// recognised and dropped.
#[derive(Debug, Default)]
pub struct MutationSequencer {
    next: u64,
    latest: HashMap<TicketId, u64>,
}

impl MutationSequencer {
    pub fn issue(&mut self, ticket_id: &TicketId) -> u64 {
        self.next += 1;
        self.latest.insert(ticket_id.clone(), self.next);
        self.next
    }

    pub fn is_current(&self, ticket_id: &TicketId, sequence: u64) -> bool {
        self.latest
            .get(ticket_id)
            .is_none_or(|latest| sequence >= *latest)
    }
}

use crate::domain::status::StatusFilter;
use crate::domain::ticket::Ticket;

/// Case-insensitive substring search over title, id and description.
/// Blank input matches everything.
pub fn matches_search(ticket: &Ticket, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [
        ticket.title.as_str(),
        ticket.id.as_str(),
        ticket.description.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

pub fn matches(ticket: &Ticket, status: &StatusFilter, search: &str) -> bool {
    status.accepts(ticket.status) && matches_search(ticket, search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::status::TicketStatus;
    use crate::testing::ticket;

    #[test]
    fn blank_search_passes_everything() {
        let t = ticket("t1", TicketStatus::Open);
        assert!(matches_search(&t, ""));
        assert!(matches_search(&t, "   "));
    }

    #[test]
    fn search_covers_title_id_and_description() {
        let mut t = ticket("TCK-42", TicketStatus::Open);
        t.title = "Laptop will not boot".to_string();
        t.description = "Blue screen after the update".to_string();

        assert!(matches_search(&t, "LAPTOP"));
        assert!(matches_search(&t, "tck-4"));
        assert!(matches_search(&t, "blue screen"));
        assert!(!matches_search(&t, "printer"));
    }

    #[test]
    fn status_and_search_combine_with_and() {
        let mut t = ticket("t1", TicketStatus::Resolved);
        t.title = "Reset password".to_string();

        let resolved = StatusFilter::Only(TicketStatus::Resolved);
        let open = StatusFilter::Only(TicketStatus::Open);
        assert!(matches(&t, &resolved, "password"));
        assert!(!matches(&t, &open, "password"));
        assert!(!matches(&t, &resolved, "vpn"));
        assert!(matches(&t, &StatusFilter::All, ""));
    }
}

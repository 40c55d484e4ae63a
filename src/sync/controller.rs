use std::collections::HashSet;

use tracing::{info, warn};

use crate::domain::session::Identity;
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{Comment, Priority, Ticket, TicketId, TicketPatch, UserId};
use crate::error::{AppError, AppResult};
use crate::services::TicketTransport;
use crate::sync::cache::TicketCollection;
use crate::sync::sequence::MutationSequencer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Comment,
    Status,
    Fields,
    Assign,
}

impl MutationKind {
    fn describe(&self) -> &'static str {
        match self {
            MutationKind::Comment => "comment",
            MutationKind::Status => "status change",
            MutationKind::Fields => "field update",
            MutationKind::Assign => "assignment",
        }
    }
}

/// A dispatched mutation waiting for its response.
#[derive(Debug)]
#[must_use]
pub struct PendingMutation {
    pub ticket_id: TicketId,
    pub kind: MutationKind,
    sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The confirmed ticket now backs both the cache and the selection.
    Applied(Ticket),
    /// Nothing to send: the ticket already had the requested value.
    Unchanged,
    /// A newer mutation for the same ticket was dispatched meanwhile.
    Stale,
}

/// What the detail pane renders for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub ticket: Ticket,
    pub comments_enabled: bool,
    pub toggle_label: &'static str,
    pub status_busy: bool,
    pub comment_busy: bool,
    /// Comment text kept after a rejected or failed submission.
    pub draft_comment: String,
    pub error: Option<String>,
}

/// Tracks the single selected ticket and runs mutations against it.
///
/// Every confirmed response is written to both the selection and the
/// collection, so the list and detail views never disagree about a ticket.
/// Optimistic state (a pending status, an echoed comment) lives beside the
/// selection and is dropped once the service answers.
#[derive(Debug)]
pub struct SelectionController {
    identity: Option<Identity>,
    selection: Option<Ticket>,
    draft_comment: String,
    error: Option<String>,
    optimistic_status: Option<(TicketId, TicketStatus)>,
    pending_comment: Option<(TicketId, Comment)>,
    in_flight: HashSet<(TicketId, MutationKind)>,
    sequencer: MutationSequencer,
}

impl SelectionController {
    pub fn new(identity: Option<Identity>) -> Self {
        Self {
            identity,
            selection: None,
            draft_comment: String::new(),
            error: None,
            optimistic_status: None,
            pending_comment: None,
            in_flight: HashSet::new(),
            sequencer: MutationSequencer::default(),
        }
    }

    pub fn selection(&self) -> Option<&Ticket> {
        self.selection.as_ref()
    }

    pub fn is_in_flight(&self, ticket_id: &TicketId, kind: MutationKind) -> bool {
        self.in_flight.contains(&(ticket_id.clone(), kind))
    }

    /// `None` means no ticket is open (user views show the creation form).
    /// In-flight requests are not cancelled.
    pub fn select(&mut self, ticket: Option<Ticket>) {
        self.selection = ticket;
        self.error = None;
        self.draft_comment.clear();
        self.optimistic_status = None;
        self.pending_comment = None;
    }

    pub fn on_external_update(&mut self, updated: &Ticket) -> bool {
        match &mut self.selection {
            Some(selected) if selected.id == updated.id => {
                *selected = updated.clone();
                true
            }
            _ => false,
        }
    }

    pub fn begin_comment(&mut self, text: &str) -> AppResult<PendingMutation> {
        self.draft_comment = text.to_string();
        let text = text.trim();
        if text.is_empty() {
            return self.reject(AppError::Validation(
                "The comment message cannot be empty.".to_string(),
            ));
        }
        let author = match self.identity.as_ref() {
            Some(identity) => identity.id.clone(),
            None => {
                return self.reject(AppError::Session(
                    "no authenticated user to comment as".to_string(),
                ));
            }
        };
        let (ticket_id, closed) = {
            let ticket = self.require_selection()?;
            (ticket.id.clone(), ticket.is_closed())
        };
        if closed {
            return self.reject(AppError::Validation(
                "Ticket is closed, reopen it to add comments.".to_string(),
            ));
        }

        let pending = self.dispatch(ticket_id.clone(), MutationKind::Comment)?;
        self.pending_comment = Some((ticket_id, Comment::pending(author, text)));
        Ok(pending)
    }

    /// Returns `None` when the ticket already has `status`.
    pub fn begin_status_change(
        &mut self,
        status: TicketStatus,
    ) -> AppResult<Option<PendingMutation>> {
        let (ticket_id, current) = {
            let ticket = self.require_selection()?;
            (ticket.id.clone(), ticket.status)
        };
        if current == status {
            return Ok(None);
        }
        self.require_role(|identity| identity.role.can_change_status(), "change ticket status")?;

        let pending = self.dispatch(ticket_id.clone(), MutationKind::Status)?;
        self.optimistic_status = Some((ticket_id, status));
        Ok(Some(pending))
    }

    pub fn begin_priority_change(
        &mut self,
        priority: Priority,
    ) -> AppResult<Option<PendingMutation>> {
        let (ticket_id, current) = {
            let ticket = self.require_selection()?;
            (ticket.id.clone(), ticket.priority)
        };
        if current == priority {
            return Ok(None);
        }
        self.require_role(|identity| identity.role.can_edit_fields(), "change ticket priority")?;
        self.dispatch(ticket_id, MutationKind::Fields).map(Some)
    }

    pub fn begin_assign(&mut self, agent_id: &UserId) -> AppResult<PendingMutation> {
        if agent_id.as_str().trim().is_empty() {
            return self.reject(AppError::Validation("Select an agent.".to_string()));
        }
        let (ticket_id, already_assigned) = {
            let ticket = self.require_selection()?;
            (ticket.id.clone(), ticket.assigned_agent_id() == Some(agent_id))
        };
        if already_assigned {
            return self.reject(AppError::Validation(format!(
                "Ticket is already assigned to {agent_id}."
            )));
        }
        self.require_role(|identity| identity.role.can_assign(), "assign tickets")?;
        self.dispatch(ticket_id, MutationKind::Assign)
    }

    /// Settles a mutation with the transport's answer. A confirmed ticket is
    /// applied to `cache` and to the selection unless a newer mutation for the
    /// same ticket has been dispatched since.
    pub fn complete(
        &mut self,
        pending: PendingMutation,
        result: AppResult<Ticket>,
        cache: &mut TicketCollection,
    ) -> AppResult<MutationOutcome> {
        let PendingMutation {
            ticket_id,
            kind,
            sequence,
        } = pending;
        self.in_flight.remove(&(ticket_id.clone(), kind));
        self.clear_optimistic(&ticket_id, kind);

        let result = result.and_then(|ticket| {
            if ticket.id == ticket_id {
                Ok(ticket)
            } else {
                Err(AppError::Transport(format!(
                    "service answered with ticket {} for ticket {ticket_id}",
                    ticket.id
                )))
            }
        });
        let ticket = match result {
            Ok(ticket) => ticket,
            Err(err) => {
                warn!(ticket = %ticket_id, kind = kind.describe(), error = %err, "mutation failed");
                if self.is_selected(&ticket_id) {
                    self.error = Some(err.user_message());
                }
                return Err(err);
            }
        };

        if !self.sequencer.is_current(&ticket_id, sequence) {
            warn!(ticket = %ticket_id, kind = kind.describe(), sequence, "discarding stale response");
            return Ok(MutationOutcome::Stale);
        }

        cache.apply_server_update(ticket.clone());
        if self.on_external_update(&ticket) {
            self.error = None;
            if kind == MutationKind::Comment {
                self.draft_comment.clear();
            }
        }
        info!(ticket = %ticket.id, kind = kind.describe(), "mutation applied");
        Ok(MutationOutcome::Applied(ticket))
    }

    pub async fn submit_comment(
        &mut self,
        transport: &dyn TicketTransport,
        cache: &mut TicketCollection,
        text: &str,
    ) -> AppResult<MutationOutcome> {
        let pending = self.begin_comment(text)?;
        let result = transport.add_comment(&pending.ticket_id, text.trim()).await;
        self.complete(pending, result, cache)
    }

    pub async fn change_status(
        &mut self,
        transport: &dyn TicketTransport,
        cache: &mut TicketCollection,
        status: TicketStatus,
    ) -> AppResult<MutationOutcome> {
        let Some(pending) = self.begin_status_change(status)? else {
            return Ok(MutationOutcome::Unchanged);
        };
        let result = transport
            .update_ticket_status(&pending.ticket_id, status)
            .await;
        self.complete(pending, result, cache)
    }

    /// Resolve/reopen toggle offered by the detail view.
    pub async fn toggle_status(
        &mut self,
        transport: &dyn TicketTransport,
        cache: &mut TicketCollection,
    ) -> AppResult<MutationOutcome> {
        let target = self.require_selection()?.status.toggled();
        self.change_status(transport, cache, target).await
    }

    pub async fn change_priority(
        &mut self,
        transport: &dyn TicketTransport,
        cache: &mut TicketCollection,
        priority: Priority,
    ) -> AppResult<MutationOutcome> {
        let Some(pending) = self.begin_priority_change(priority)? else {
            return Ok(MutationOutcome::Unchanged);
        };
        let patch = TicketPatch {
            status: None,
            priority: Some(priority),
        };
        let result = transport
            .update_ticket_fields(&pending.ticket_id, patch)
            .await;
        self.complete(pending, result, cache)
    }

    pub async fn assign(
        &mut self,
        transport: &dyn TicketTransport,
        cache: &mut TicketCollection,
        agent_id: &UserId,
    ) -> AppResult<MutationOutcome> {
        let pending = self.begin_assign(agent_id)?;
        let result = transport.assign_ticket(&pending.ticket_id, agent_id).await;
        self.complete(pending, result, cache)
    }

    pub fn detail_view(&self) -> Option<DetailView> {
        let selected = self.selection.as_ref()?;
        let mut ticket = selected.clone();

        if let Some((id, status)) = &self.optimistic_status {
            if *id == ticket.id {
                ticket.status = *status;
            }
        }
        if let Some((id, comment)) = &self.pending_comment {
            if *id == ticket.id {
                ticket.comments.push(comment.clone());
            }
        }

        let comments_enabled = !selected.is_closed() && self.identity.is_some();
        let toggle_label = if selected.is_closed() {
            "Reopen Ticket"
        } else {
            "Resolve Ticket"
        };
        Some(DetailView {
            status_busy: self.is_in_flight(&selected.id, MutationKind::Status),
            comment_busy: self.is_in_flight(&selected.id, MutationKind::Comment),
            ticket,
            comments_enabled,
            toggle_label,
            draft_comment: self.draft_comment.clone(),
            error: self.error.clone(),
        })
    }

    fn dispatch(&mut self, ticket_id: TicketId, kind: MutationKind) -> AppResult<PendingMutation> {
        if !self.in_flight.insert((ticket_id.clone(), kind)) {
            return self.reject(AppError::Validation(format!(
                "A {} is already in progress for this ticket.",
                kind.describe()
            )));
        }
        self.error = None;
        let sequence = self.sequencer.issue(&ticket_id);
        Ok(PendingMutation {
            ticket_id,
            kind,
            sequence,
        })
    }

    fn require_selection(&mut self) -> AppResult<&Ticket> {
        if self.selection.is_none() {
            return self.reject(AppError::Validation("No ticket selected.".to_string()));
        }
        self.selection
            .as_ref()
            .ok_or_else(|| AppError::Validation("No ticket selected.".to_string()))
    }

    fn require_role(&mut self, allowed: impl Fn(&Identity) -> bool, action: &str) -> AppResult<()> {
        match self.identity.as_ref() {
            Some(identity) if allowed(identity) => Ok(()),
            Some(identity) => {
                let role = identity.role;
                self.reject(AppError::Authorization(format!(
                    "role {role} may not {action}"
                )))
            }
            None => self.reject(AppError::Session("no authenticated user".to_string())),
        }
    }

    fn clear_optimistic(&mut self, ticket_id: &TicketId, kind: MutationKind) {
        match kind {
            MutationKind::Status => {
                if matches!(&self.optimistic_status, Some((id, _)) if id == ticket_id) {
                    self.optimistic_status = None;
                }
            }
            MutationKind::Comment => {
                if matches!(&self.pending_comment, Some((id, _)) if id == ticket_id) {
                    self.pending_comment = None;
                }
            }
            MutationKind::Fields | MutationKind::Assign => {}
        }
    }

    fn is_selected(&self, ticket_id: &TicketId) -> bool {
        self.selection
            .as_ref()
            .is_some_and(|ticket| &ticket.id == ticket_id)
    }

    fn reject<T>(&mut self, err: AppError) -> AppResult<T> {
        self.error = Some(err.user_message());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::role::Role;
    use crate::domain::ticket::AgentRef;
    use crate::testing::{Call, ScriptedTransport, session, ticket};

    fn controller(role: Role) -> SelectionController {
        SelectionController::new(Some(session(role).identity))
    }

    fn with_comment(mut t: Ticket, author: &str, text: &str) -> Ticket {
        t.comments.push(Comment {
            author_id: Some(UserId::new(author)),
            text: text.to_string(),
            created_at: chrono::Utc::now().into(),
        });
        t
    }

    #[test]
    fn select_clears_transient_state() {
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Closed)));
        let _ = controller.begin_comment("half written");
        let view = controller.detail_view().unwrap();
        assert!(view.error.is_some());
        assert_eq!(view.draft_comment, "half written");

        controller.select(Some(ticket("2", TicketStatus::Open)));

        let view = controller.detail_view().unwrap();
        assert_eq!(view.draft_comment, "");
        assert!(view.error.is_none());
        assert_eq!(controller.selection().unwrap().id.as_str(), "2");
    }

    #[test]
    fn external_update_only_touches_matching_selection() {
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        assert!(!controller.on_external_update(&ticket("2", TicketStatus::Closed)));
        assert_eq!(controller.selection().unwrap().status, TicketStatus::Open);

        assert!(controller.on_external_update(&ticket("1", TicketStatus::Resolved)));
        assert_eq!(controller.selection().unwrap().status, TicketStatus::Resolved);
    }

    #[tokio::test]
    async fn whitespace_comment_never_reaches_transport() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::User);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let err = controller
            .submit_comment(&transport, &mut cache, "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(transport.calls().is_empty());
        assert!(controller.selection().unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn closed_ticket_rejects_comments() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Closed)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Closed)));

        let err = controller
            .submit_comment(&transport, &mut cache, "anything")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(transport.calls().is_empty());
        assert!(!controller.detail_view().unwrap().comments_enabled);
    }

    #[tokio::test]
    async fn comment_without_identity_is_rejected() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::new();
        let mut controller = SelectionController::new(None);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let err = controller
            .submit_comment(&transport, &mut cache, "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Session(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn comment_response_replaces_echo_without_duplicates() {
        let selected = with_comment(ticket("2", TicketStatus::InProgress), "owner", "earlier");
        let confirmed = with_comment(selected.clone(), "agent-1", "hello");
        let transport = ScriptedTransport::new();
        transport.push_ticket(Ok(confirmed.clone()));
        let mut cache = TicketCollection::from_tickets(vec![selected.clone()]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(selected));

        let outcome = controller
            .submit_comment(&transport, &mut cache, "hello")
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied(confirmed.clone()));
        let view = controller.detail_view().unwrap();
        assert_eq!(view.ticket.comments.len(), 2);
        assert_eq!(view.ticket.comments[1].text, "hello");
        assert_eq!(controller.selection(), Some(&confirmed));
        assert_eq!(cache.get(&TicketId::new("2")), Some(&confirmed));
        assert_eq!(
            transport.calls(),
            vec![Call::AddComment(TicketId::new("2"), "hello".to_string())]
        );
    }

    #[test]
    fn echo_is_visible_while_in_flight_and_dropped_on_failure() {
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::User);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let pending = controller.begin_comment("  on my way  ").unwrap();
        let view = controller.detail_view().unwrap();
        assert_eq!(view.ticket.comments.len(), 1);
        assert_eq!(view.ticket.comments[0].text, "on my way");
        assert_eq!(view.ticket.comments[0].created_at, None);
        assert!(view.comment_busy);

        let err = controller
            .complete(pending, Err(AppError::Transport("reset".to_string())), &mut cache)
            .unwrap_err();

        assert!(err.is_retryable());
        let view = controller.detail_view().unwrap();
        assert!(view.ticket.comments.is_empty());
        assert!(view.error.is_some());
        assert_eq!(cache.tickets()[0], ticket("1", TicketStatus::Open));
    }

    #[tokio::test]
    async fn same_status_is_a_no_op() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let outcome = controller
            .change_status(&transport, &mut cache, TicketStatus::Open)
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert!(transport.calls().is_empty());
        assert_eq!(controller.selection(), Some(&ticket("1", TicketStatus::Open)));
    }

    #[tokio::test]
    async fn users_cannot_change_status() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::new();
        let mut controller = controller(Role::User);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let err = controller
            .change_status(&transport, &mut cache, TicketStatus::Closed)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Authorization(_)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn status_change_updates_cache_and_selection() {
        let transport = ScriptedTransport::new();
        transport.push_ticket(Ok(ticket("1", TicketStatus::Resolved)));
        let mut cache = TicketCollection::from_tickets(vec![
            ticket("0", TicketStatus::Open),
            ticket("1", TicketStatus::Open),
        ]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        controller
            .change_status(&transport, &mut cache, TicketStatus::Resolved)
            .await
            .unwrap();

        assert_eq!(controller.selection(), cache.get(&TicketId::new("1")));
        assert_eq!(cache.tickets()[1].status, TicketStatus::Resolved);
    }

    #[test]
    fn optimistic_status_reverts_on_failure() {
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let pending = controller
            .begin_status_change(TicketStatus::Closed)
            .unwrap()
            .unwrap();
        let view = controller.detail_view().unwrap();
        assert_eq!(view.ticket.status, TicketStatus::Closed);
        assert!(view.status_busy);

        let _ = controller.complete(
            pending,
            Err(AppError::Transport("timeout".to_string())),
            &mut cache,
        );

        let view = controller.detail_view().unwrap();
        assert_eq!(view.ticket.status, TicketStatus::Open);
        assert!(!view.status_busy);
    }

    #[test]
    fn duplicate_submission_is_blocked_but_other_kinds_run() {
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let _status = controller
            .begin_status_change(TicketStatus::Closed)
            .unwrap()
            .unwrap();
        let again = controller.begin_status_change(TicketStatus::Resolved);
        assert!(matches!(again, Err(AppError::Validation(_))));

        assert!(controller.begin_comment("meanwhile").is_ok());
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        let comment = controller.begin_comment("first").unwrap();
        let status = controller
            .begin_status_change(TicketStatus::Resolved)
            .unwrap()
            .unwrap();

        let newest = with_comment(ticket("1", TicketStatus::Resolved), "agent-1", "first");
        let applied = controller
            .complete(status, Ok(newest.clone()), &mut cache)
            .unwrap();
        assert_eq!(applied, MutationOutcome::Applied(newest.clone()));

        let older = with_comment(ticket("1", TicketStatus::Open), "agent-1", "first");
        let outcome = controller.complete(comment, Ok(older), &mut cache).unwrap();

        assert_eq!(outcome, MutationOutcome::Stale);
        assert_eq!(controller.selection(), Some(&newest));
        assert_eq!(cache.get(&TicketId::new("1")), Some(&newest));
    }

    #[test]
    fn response_for_previous_selection_still_updates_cache() {
        let mut cache = TicketCollection::from_tickets(vec![
            ticket("1", TicketStatus::Open),
            ticket("2", TicketStatus::Open),
        ]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));
        let pending = controller
            .begin_status_change(TicketStatus::Closed)
            .unwrap()
            .unwrap();

        controller.select(Some(ticket("2", TicketStatus::Open)));
        controller
            .complete(pending, Ok(ticket("1", TicketStatus::Closed)), &mut cache)
            .unwrap();

        assert_eq!(controller.selection().unwrap().id.as_str(), "2");
        assert_eq!(cache.tickets()[0].status, TicketStatus::Closed);
    }

    #[test]
    fn answer_for_another_ticket_is_rejected() {
        let mut cache = TicketCollection::from_tickets(vec![
            ticket("1", TicketStatus::Open),
            ticket("2", TicketStatus::Open),
        ]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));
        let pending = controller
            .begin_status_change(TicketStatus::Closed)
            .unwrap()
            .unwrap();

        let err = controller
            .complete(pending, Ok(ticket("2", TicketStatus::Closed)), &mut cache)
            .unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        assert_eq!(cache.tickets()[1], ticket("2", TicketStatus::Open));
        assert_eq!(controller.selection(), Some(&ticket("1", TicketStatus::Open)));
        assert!(controller.detail_view().unwrap().error.is_some());
    }

    #[tokio::test]
    async fn admin_assignment_propagates_everywhere() {
        let mut assigned = ticket("1", TicketStatus::Open);
        assigned.assigned_agent = Some(AgentRef {
            id: UserId::new("agentA"),
            name: None,
        });
        let transport = ScriptedTransport::new();
        transport.push_ticket(Ok(assigned.clone()));
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::Admin);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        controller
            .assign(&transport, &mut cache, &UserId::new("agentA"))
            .await
            .unwrap();

        let agent = UserId::new("agentA");
        assert_eq!(controller.selection().unwrap().assigned_agent_id(), Some(&agent));
        assert_eq!(
            cache.get(&TicketId::new("1")).unwrap().assigned_agent_id(),
            Some(&agent)
        );
    }

    #[tokio::test]
    async fn assignment_guards() {
        let transport = ScriptedTransport::new();
        let mut cache = TicketCollection::new();
        let mut selected = ticket("1", TicketStatus::Open);
        selected.assigned_agent = Some(AgentRef {
            id: UserId::new("agentA"),
            name: None,
        });

        let mut admin = controller(Role::Admin);
        admin.select(Some(selected.clone()));
        let empty = admin.assign(&transport, &mut cache, &UserId::new(" ")).await;
        assert!(matches!(empty, Err(AppError::Validation(_))));
        let same = admin
            .assign(&transport, &mut cache, &UserId::new("agentA"))
            .await;
        assert!(matches!(same, Err(AppError::Validation(_))));

        let mut agent = controller(Role::Agent);
        agent.select(Some(selected));
        let denied = agent
            .assign(&transport, &mut cache, &UserId::new("agentB"))
            .await;
        assert!(matches!(denied, Err(AppError::Authorization(_))));

        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn priority_patch_sends_only_priority() {
        let mut raised = ticket("1", TicketStatus::Open);
        raised.priority = Priority::Urgent;
        let transport = ScriptedTransport::new();
        transport.push_ticket(Ok(raised.clone()));
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Open)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Open)));

        controller
            .change_priority(&transport, &mut cache, Priority::Urgent)
            .await
            .unwrap();

        assert_eq!(
            transport.calls(),
            vec![Call::UpdateFields(
                TicketId::new("1"),
                TicketPatch {
                    status: None,
                    priority: Some(Priority::Urgent),
                }
            )]
        );
        assert_eq!(cache.tickets()[0].priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn toggle_reopens_closed_ticket() {
        let transport = ScriptedTransport::new();
        transport.push_ticket(Ok(ticket("1", TicketStatus::Open)));
        let mut cache = TicketCollection::from_tickets(vec![ticket("1", TicketStatus::Closed)]);
        let mut controller = controller(Role::Agent);
        controller.select(Some(ticket("1", TicketStatus::Closed)));
        assert_eq!(controller.detail_view().unwrap().toggle_label, "Reopen Ticket");

        controller.toggle_status(&transport, &mut cache).await.unwrap();

        assert_eq!(
            transport.calls(),
            vec![Call::UpdateStatus(TicketId::new("1"), TicketStatus::Open)]
        );
        assert!(controller.detail_view().unwrap().comments_enabled);
    }
}

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::role::Role;
use crate::domain::session::Session;
use crate::domain::status::{StatusFilter, TicketStatus};
use crate::domain::ticket::{Agent, NewTicket, Priority, Ticket, TicketId, UserId};
use crate::error::{AppError, AppResult};
use crate::services::TicketTransport;
use crate::sync::cache::{StatusCounts, TicketCollection};
use crate::sync::controller::{DetailView, MutationOutcome, SelectionController};

/// One role view: a ticket list and a detail pane over the same collection.
/// Each dashboard owns its own cache and controller for its whole lifetime.
pub struct Dashboard {
    transport: Arc<dyn TicketTransport>,
    role: Role,
    collection: TicketCollection,
    controller: SelectionController,
    status_filter: StatusFilter,
    search: String,
    agents: Vec<Agent>,
}

impl Dashboard {
    pub fn new(transport: Arc<dyn TicketTransport>, session: &Session) -> Self {
        Self {
            transport,
            role: session.role(),
            collection: TicketCollection::new(),
            controller: SelectionController::new(Some(session.identity.clone())),
            status_filter: StatusFilter::All,
            search: String::new(),
            agents: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Initial load. A failed refresh is returned, but the dashboard keeps its
    /// previous list and the error stays on the collection. The admin agent
    /// list is best effort: without it the tickets are still usable.
    pub async fn mount(&mut self) -> AppResult<()> {
        let loaded = self.refresh().await;
        if self.role.can_assign() {
            if let Err(err) = self.load_agents().await {
                warn!(error = %err, "agent list unavailable");
            }
        }
        loaded
    }

    /// Refetches the collection and re-syncs the selection with it.
    pub async fn refresh(&mut self) -> AppResult<()> {
        self.collection.refresh(self.transport.as_ref()).await?;
        let current = self
            .controller
            .selection()
            .and_then(|selected| self.collection.get(&selected.id))
            .cloned();
        if let Some(ticket) = current {
            self.controller.on_external_update(&ticket);
        }
        Ok(())
    }

    pub async fn load_agents(&mut self) -> AppResult<&[Agent]> {
        if !self.role.can_assign() {
            return Err(AppError::Authorization(format!(
                "role {} may not list agents",
                self.role
            )));
        }
        self.agents = self.transport.list_agents().await?;
        debug!(count = self.agents.len(), "agents loaded");
        Ok(&self.agents)
    }

    /// Changing the filter drops the selection so the detail pane never shows
    /// a ticket hidden by the list.
    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        if self.status_filter != filter {
            self.status_filter = filter;
            self.controller.select(None);
        }
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status_filter
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn visible(&self) -> Vec<&Ticket> {
        self.collection.filter(&self.status_filter, &self.search)
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.collection.status_counts()
    }

    pub fn status_vocabulary(&self) -> &'static [TicketStatus] {
        &TicketStatus::ALL
    }

    pub fn collection(&self) -> &TicketCollection {
        &self.collection
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn select_by_id(&mut self, id: &TicketId) -> AppResult<&Ticket> {
        let ticket = self
            .collection
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        self.controller.select(Some(ticket));
        self.controller
            .selection()
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    /// Refetches the selected ticket alone and applies it like any other
    /// server-confirmed copy.
    pub async fn reload_selection(&mut self) -> AppResult<()> {
        let Some(id) = self.controller.selection().map(|ticket| ticket.id.clone()) else {
            return Err(AppError::Validation("No ticket selected.".to_string()));
        };
        let ticket = self.transport.get_ticket(&id).await?;
        self.collection.apply_server_update(ticket.clone());
        self.controller.on_external_update(&ticket);
        Ok(())
    }

    pub fn detail(&self) -> Option<DetailView> {
        self.controller.detail_view()
    }

    pub async fn create_ticket(
        &mut self,
        title: &str,
        description: &str,
        priority: Priority,
    ) -> AppResult<Ticket> {
        let (title, description) = (title.trim(), description.trim());
        if title.is_empty() || description.is_empty() {
            return Err(AppError::Validation(
                "A ticket needs a title and a description.".to_string(),
            ));
        }

        let ticket = self
            .transport
            .create_ticket(NewTicket {
                title: title.to_string(),
                description: description.to_string(),
                priority,
            })
            .await?;
        info!(ticket = %ticket.id, "ticket created");
        self.collection.insert_created(ticket.clone());
        self.controller.select(None);
        Ok(ticket)
    }

    pub async fn submit_comment(&mut self, text: &str) -> AppResult<MutationOutcome> {
        self.controller
            .submit_comment(self.transport.as_ref(), &mut self.collection, text)
            .await
    }

    pub async fn change_status(&mut self, status: TicketStatus) -> AppResult<MutationOutcome> {
        self.controller
            .change_status(self.transport.as_ref(), &mut self.collection, status)
            .await
    }

    pub async fn toggle_status(&mut self) -> AppResult<MutationOutcome> {
        self.controller
            .toggle_status(self.transport.as_ref(), &mut self.collection)
            .await
    }

    pub async fn change_priority(&mut self, priority: Priority) -> AppResult<MutationOutcome> {
        self.controller
            .change_priority(self.transport.as_ref(), &mut self.collection, priority)
            .await
    }

    pub async fn assign(&mut self, agent_id: &UserId) -> AppResult<MutationOutcome> {
        self.controller
            .assign(self.transport.as_ref(), &mut self.collection, agent_id)
            .await
    }
}

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::session::Session;
use crate::error::{AppError, AppResult};
use crate::services::{AuthService, TicketTransport};
use crate::session::SessionStore;
use crate::workflow::dashboard::Dashboard;

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub sessions: Arc<SessionStore>,
    pub session: Option<Session>,
    pub transport: Arc<dyn TicketTransport>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        sessions: Arc<SessionStore>,
        session: Option<Session>,
        transport: Arc<dyn TicketTransport>,
        auth: Arc<dyn AuthService>,
    ) -> Self {
        Self {
            config,
            sessions,
            session,
            transport,
            auth,
        }
    }

    pub fn require_session(&self) -> AppResult<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| AppError::Session("not logged in; run `ticketdesk login`".to_string()))
    }

    /// A fresh role view for the logged-in identity.
    pub fn dashboard(&self) -> AppResult<Dashboard> {
        let session = self.require_session()?;
        Ok(Dashboard::new(self.transport.clone(), session))
    }
}

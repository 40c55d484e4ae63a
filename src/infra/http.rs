use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::session::Session;
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{Agent, NewTicket, Ticket, TicketId, TicketPatch, UserId};
use crate::error::{AppError, AppResult};
use crate::infra::wire;
use crate::services::{AuthService, NewAccount, TicketTransport};

/// REST client for the ticket service. Authenticated calls carry the
/// session's bearer token; login and signup go out without one.
pub struct HttpTicketClient {
    http: Client,
    base_url: String,
    session: Option<Session>,
}

impl HttpTicketClient {
    pub fn new(base_url: &str, timeout: Duration, session: Option<Session>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn ticket_endpoint(&self, id: &TicketId, suffix: &str) -> String {
        self.endpoint(&format!("tickets/{}{suffix}", id.as_str()))
    }

    fn authorized(&self, request: RequestBuilder) -> AppResult<RequestBuilder> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::Session("not logged in".to_string()))?;
        Ok(request.header(AUTHORIZATION, session.bearer()))
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> AppResult<Value> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| AppError::Transport(format!("failed to {what}: {err}")))?;
        read_json(response, what).await
    }

    async fn send_authorized(&self, request: RequestBuilder, what: &str) -> AppResult<Value> {
        let request = self.authorized(request)?;
        self.send(request, what).await
    }
}

async fn read_json(response: Response, what: &str) -> AppResult<Value> {
    let status = response.status();
    debug!(%status, what, "ticket service responded");
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        return Err(status_error(status, &body, what));
    }

    response
        .json::<Value>()
        .await
        .map_err(|err| AppError::Transport(format!("failed to parse response to {what}: {err}")))
}

fn status_error(status: StatusCode, body: &str, what: &str) -> AppError {
    let detail = wire::error_message(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Authorization(
            detail.unwrap_or_else(|| format!("the service refused to {what} ({status})")),
        ),
        StatusCode::NOT_FOUND => {
            AppError::NotFound(detail.unwrap_or_else(|| format!("nothing to {what}")))
        }
        _ => AppError::Transport(format!(
            "service responded with {status}: {}",
            detail.unwrap_or_else(|| body.to_string())
        )),
    }
}

#[async_trait]
impl TicketTransport for HttpTicketClient {
    async fn list_tickets(&self) -> AppResult<Vec<Ticket>> {
        let body = self
            .send_authorized(self.http.get(self.endpoint("tickets")), "list tickets")
            .await?;
        wire::decode_ticket_list(body)
    }

    async fn get_ticket(&self, id: &TicketId) -> AppResult<Ticket> {
        let body = self
            .send_authorized(self.http.get(self.ticket_endpoint(id, "")), "load ticket")
            .await?;
        wire::decode_ticket(body)
    }

    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<Ticket> {
        let request = self
            .http
            .post(self.endpoint("tickets"))
            .header(CONTENT_TYPE, "application/json")
            .json(&ticket);
        let body = self.send_authorized(request, "create ticket").await?;
        wire::decode_ticket(body)
    }

    async fn update_ticket_status(&self, id: &TicketId, status: TicketStatus) -> AppResult<Ticket> {
        let request = self
            .http
            .put(self.ticket_endpoint(id, ""))
            .json(&StatusBody { status });
        let body = self.send_authorized(request, "update ticket status").await?;
        wire::decode_ticket(body)
    }

    async fn update_ticket_fields(&self, id: &TicketId, patch: TicketPatch) -> AppResult<Ticket> {
        if patch.is_empty() {
            return Err(AppError::Validation("nothing to update".to_string()));
        }
        let request = self.http.put(self.ticket_endpoint(id, "")).json(&patch);
        let body = self.send_authorized(request, "update ticket").await?;
        wire::decode_ticket(body)
    }

    async fn assign_ticket(&self, id: &TicketId, agent_id: &UserId) -> AppResult<Ticket> {
        let request = self
            .http
            .put(self.ticket_endpoint(id, "/assign"))
            .json(&AssignBody {
                agent_id: agent_id.as_str(),
            });
        let body = self.send_authorized(request, "assign ticket").await?;
        wire::decode_ticket(body)
    }

    async fn add_comment(&self, id: &TicketId, text: &str) -> AppResult<Ticket> {
        let request = self
            .http
            .post(self.ticket_endpoint(id, "/comments"))
            .json(&CommentBody { text });
        let body = self.send_authorized(request, "add comment").await?;
        wire::decode_ticket(body)
    }

    async fn list_agents(&self) -> AppResult<Vec<Agent>> {
        let request = self
            .http
            .get(self.endpoint("users"))
            .query(&[("role", "agent")]);
        let body = self.send_authorized(request, "list agents").await?;
        wire::decode_agent_list(body)
    }
}

#[async_trait]
impl AuthService for HttpTicketClient {
    async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_string(),
            ));
        }
        let request = self
            .http
            .post(self.endpoint("auth/login"))
            .json(&LoginBody {
                email: email.trim(),
                password,
            });
        let body = self.send(request, "log in").await?;
        wire::decode_session(body)
    }

    async fn signup(&self, account: NewAccount) -> AppResult<Session> {
        if account.name.trim().is_empty() || account.email.trim().is_empty() {
            return Err(AppError::Validation(
                "name and email are required".to_string(),
            ));
        }
        let request = self.http.post(self.endpoint("auth/signup")).json(&account);
        let body = self.send(request, "sign up").await?;
        wire::decode_session(body)
    }
}

#[derive(Serialize)]
struct StatusBody {
    status: TicketStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody<'a> {
    agent_id: &'a str,
}

#[derive(Serialize)]
struct CommentBody<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

//! Decoding of the ticket service's JSON bodies.
//!
//! The service is inconsistent about envelopes and field names, so every body
//! passes through one of the `decode_*` functions here and nothing past this
//! module sees the raw shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::role::Role;
use crate::domain::session::{Identity, Session};
use crate::domain::status::TicketStatus;
use crate::domain::ticket::{Agent, AgentRef, Comment, Priority, Ticket, TicketId, UserId};
use crate::error::{AppError, AppResult};

const LIST_KEYS: [&str; 3] = ["data", "tickets", "users"];
const SINGLE_KEYS: [&str; 2] = ["ticket", "data"];

/// Bare array, `{data: [...]}`, `{tickets: [...]}` or `{users: [...]}`.
/// Items that fail to decode are logged and left out of the list.
pub fn decode_ticket_list(body: Value) -> AppResult<Vec<Ticket>> {
    let tickets = unwrap_list(body, "ticket list")?
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match decode_ticket_value(item) {
            Ok(ticket) => Some(ticket),
            Err(err) => {
                warn!(index, error = %err, "skipping undecodable ticket");
                None
            }
        })
        .collect();
    Ok(tickets)
}

/// Bare object, `{ticket: {...}}` or `{data: {...}}`.
pub fn decode_ticket(body: Value) -> AppResult<Ticket> {
    let inner = match body {
        Value::Object(map) => unwrap_single(map),
        other => return Err(shape_error("ticket", &other)),
    };
    decode_ticket_value(inner)
}

pub fn decode_agent_list(body: Value) -> AppResult<Vec<Agent>> {
    unwrap_list(body, "agent list")?
        .into_iter()
        .map(|item| {
            let wire: WireAccount = serde_json::from_value(item)
                .map_err(|err| AppError::Transport(format!("malformed agent: {err}")))?;
            let id = pick_id(wire.mongo_id, wire.id)
                .ok_or_else(|| AppError::Transport("agent without id".to_string()))?;
            Ok(Agent {
                name: wire.name.unwrap_or_else(|| id.clone()),
                id: UserId(id),
                email: wire.email,
            })
        })
        .collect()
}

/// Login and signup share `{token, user: {id, name, email, role}}`.
pub fn decode_session(body: Value) -> AppResult<Session> {
    let wire: WireLogin = serde_json::from_value(body)
        .map_err(|err| AppError::Session(format!("invalid login response: {err}")))?;
    let (token, user) = match (wire.token, wire.user) {
        (Some(token), Some(user)) if !token.trim().is_empty() => (token, user),
        _ => {
            return Err(AppError::Session(
                "invalid login response: missing token or user".to_string(),
            ));
        }
    };
    let role = user
        .role
        .as_deref()
        .and_then(Role::from_str)
        .ok_or_else(|| AppError::Session("invalid login response: missing role".to_string()))?;
    let id = pick_id(user.mongo_id, user.id)
        .ok_or_else(|| AppError::Session("invalid login response: missing user id".to_string()))?;

    Ok(Session {
        identity: Identity {
            id: UserId(id),
            name: user.name,
            email: user.email,
            role,
        },
        token,
    })
}

/// Pulls `message` (or `error`) out of an error body, if it is JSON.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        value
            .get(*key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|message| !message.trim().is_empty())
    })
}

fn unwrap_list(body: Value, what: &str) -> AppResult<Vec<Value>> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| AppError::Transport(format!("{what} response has no item array"))),
        other => Err(shape_error(what, &other)),
    }
}

fn unwrap_single(mut map: Map<String, Value>) -> Value {
    for key in SINGLE_KEYS {
        if map.get(key).is_some_and(Value::is_object) {
            if let Some(inner) = map.remove(key) {
                return inner;
            }
        }
    }
    Value::Object(map)
}

fn shape_error(what: &str, value: &Value) -> AppError {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    AppError::Transport(format!("unexpected {what} response: got {kind}"))
}

fn decode_ticket_value(value: Value) -> AppResult<Ticket> {
    let wire: WireTicket = serde_json::from_value(value)
        .map_err(|err| AppError::Transport(format!("malformed ticket: {err}")))?;
    wire.into_ticket()
}

/// RFC 3339 text or epoch milliseconds; anything else reads as unknown.
fn parse_timestamp(value: Option<Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    }
}

fn pick_id(mongo_id: Option<WireId>, id: Option<WireId>) -> Option<String> {
    mongo_id
        .or(id)
        .map(WireId::into_string)
        .filter(|id| !id.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> String {
        match self {
            WireId::Text(text) => text.trim().to_string(),
            WireId::Number(number) => number.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct WireAccount {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    name: Option<String>,
    email: Option<String>,
    role: Option<String>,
}

/// A user reference is either a bare id or a populated user document.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireUserRef {
    Id(WireId),
    Document(WireAccount),
}

impl WireUserRef {
    fn into_agent_ref(self) -> Option<AgentRef> {
        match self {
            WireUserRef::Id(id) => {
                let id = id.into_string();
                (!id.is_empty()).then(|| AgentRef {
                    id: UserId(id),
                    name: None,
                })
            }
            WireUserRef::Document(account) => {
                pick_id(account.mongo_id, account.id).map(|id| AgentRef {
                    id: UserId(id),
                    name: account.name,
                })
            }
        }
    }

    fn into_user_id(self) -> Option<UserId> {
        self.into_agent_ref().map(|agent| agent.id)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTicket {
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    id: Option<WireId>,
    title: Option<String>,
    description: Option<String>,
    status: Option<TicketStatus>,
    priority: Option<Priority>,
    owner_user_id: Option<WireUserRef>,
    user_id: Option<WireUserRef>,
    user: Option<WireUserRef>,
    assigned_agent: Option<WireUserRef>,
    agent: Option<WireUserRef>,
    comments: Option<Vec<WireComment>>,
    created_at: Option<Value>,
    updated_at: Option<Value>,
}

impl WireTicket {
    fn into_ticket(self) -> AppResult<Ticket> {
        let id = pick_id(self.mongo_id, self.id)
            .ok_or_else(|| AppError::Transport("ticket without id".to_string()))?;
        let owner = self
            .owner_user_id
            .or(self.user_id)
            .or(self.user)
            .and_then(WireUserRef::into_user_id);
        let assigned_agent = self
            .assigned_agent
            .or(self.agent)
            .and_then(WireUserRef::into_agent_ref);
        let comments = self
            .comments
            .unwrap_or_default()
            .into_iter()
            .map(WireComment::into_comment)
            .collect();

        Ok(Ticket {
            id: TicketId(id),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or(TicketStatus::Open),
            priority: self.priority.unwrap_or_default(),
            owner_user_id: owner,
            assigned_agent,
            comments,
            created_at: parse_timestamp(self.created_at),
            updated_at: parse_timestamp(self.updated_at),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireComment {
    text: Option<String>,
    message: Option<String>,
    author_id: Option<WireUserRef>,
    user_id: Option<WireUserRef>,
    user: Option<WireUserRef>,
    created_at: Option<Value>,
    timestamp: Option<Value>,
}

impl WireComment {
    fn into_comment(self) -> Comment {
        Comment {
            author_id: self
                .author_id
                .or(self.user_id)
                .or(self.user)
                .and_then(WireUserRef::into_user_id),
            text: self.text.or(self.message).unwrap_or_default(),
            created_at: parse_timestamp(self.created_at)
                .or_else(|| parse_timestamp(self.timestamp)),
        }
    }
}

#[derive(Deserialize)]
struct WireLogin {
    token: Option<String>,
    user: Option<WireAccount>,
}

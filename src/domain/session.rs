use serde::{Deserialize, Serialize};

use crate::domain::role::Role;
use crate::domain::ticket::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

impl Session {
    pub fn role(&self) -> Role {
        self.identity.role
    }

    pub fn user_id(&self) -> &UserId {
        &self.identity.id
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

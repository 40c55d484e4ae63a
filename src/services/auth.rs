use async_trait::async_trait;
use serde::Serialize;

use crate::domain::role::Role;
use crate::domain::session::Session;
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Login and signup are the only calls made without a bearer token.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> AppResult<Session>;
    async fn signup(&self, account: NewAccount) -> AppResult<Session>;
}

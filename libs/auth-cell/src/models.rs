use serde::{Deserialize, Serialize};

use shared_database::{StoreError, TableRow};

/// Front-desk account allowed to use the booking API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password Hash")]
    pub password_hash: String,
}

impl TableRow for Operator {
    const HEADERS: &'static [&'static str] = &["Username", "Password Hash"];
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Stored password hash is unusable: {0}")]
    BadHash(String),

    #[error("Token could not be issued: {0}")]
    Token(String),

    #[error("Operator list unavailable: {0}")]
    Store(#[from] StoreError),
}

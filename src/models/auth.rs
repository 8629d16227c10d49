use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::extract::Validate;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: String,
}

/// Credential record linking a user to a login provider.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: String,
    pub account_id: String,
    pub provider_id: String,
    pub user_id: String,
    pub password: Option<String>,
}

/// The resolved principal of an authenticated request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub session: Session,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }
        if !self.email.contains('@') {
            errors.push("Invalid email".to_string());
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"));
        } else if self.password.len() > MAX_PASSWORD_BYTES {
            errors.push(format!("Password must be at most {MAX_PASSWORD_BYTES} bytes"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

impl Validate for SigninRequest {
    fn validate(&self) -> Result<(), Vec<String>> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(vec!["Email and password are required".to_string()]);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

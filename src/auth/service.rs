use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::database::auth::{AuthRepository, ClientInfo, NewSession};
use crate::error::{AppError, Result};
use crate::models::auth::{AuthSession, Session, SigninRequest, SignupRequest, User};

/// Email/password sign-up, sign-in and session lookup.
#[derive(Clone)]
pub struct AuthService {
    repo: AuthRepository,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: AuthRepository, session_ttl: Duration) -> Self {
        Self { repo, session_ttl }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub async fn sign_up(&self, request: SignupRequest, client: ClientInfo) -> Result<(User, Session)> {
        let email = request.email.trim().to_lowercase();
        let password_hash = hash_password(request.password).await?;

        let (user, session) = self
            .repo
            .create_user_with_session(request.name.trim(), &email, &password_hash, self.new_session(client))
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        Ok((user, session))
    }

    pub async fn sign_in(&self, request: SigninRequest, client: ClientInfo) -> Result<(User, Session)> {
        let email = request.email.trim().to_lowercase();

        // Every rejection pays for one bcrypt verification
        let Some((user, account)) = self.repo.find_credentials(&email).await? else {
            tracing::debug!("sign-in for unknown email");
            verify_dummy(request.password).await?;
            return Err(AppError::InvalidCredentials);
        };
        let Some(hash) = account.password else {
            verify_dummy(request.password).await?;
            return Err(AppError::InvalidCredentials);
        };
        if !verify_password(request.password, hash).await? {
            tracing::debug!(user_id = %user.id, "sign-in with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let session = self.repo.create_session(&user.id, self.new_session(client)).await?;
        tracing::info!(user_id = %user.id, "user signed in");
        Ok((user, session))
    }

    pub async fn sign_out(&self, token: &str) -> Result<()> {
        if self.repo.delete_session(token).await? {
            tracing::info!("session closed");
        }
        Ok(())
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<AuthSession>> {
        self.repo.find_session(token).await
    }

    fn new_session(&self, client: ClientInfo) -> NewSession {
        NewSession {
            token: generate_token(),
            expires_at: Utc::now() + self.session_ttl,
            client,
        }
    }
}

/// Opaque 64-character hex session token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

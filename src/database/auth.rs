use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{self, AppError, Result};
use crate::models::auth::{Account, AuthSession, Session, User};

pub const CREDENTIAL_PROVIDER: &str = "credential";

const USER_COLUMNS: &str = "id, name, email, email_verified, image, created_at, updated_at";
const SESSION_COLUMNS: &str =
    "id, expires_at, token, created_at, updated_at, ip_address, user_agent, user_id";

/// Where a session was opened from.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Data needed to open a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub client: ClientInfo,
}

#[derive(FromRow)]
struct SessionWithUserRow {
    session_id: String,
    expires_at: DateTime<Utc>,
    token: String,
    session_created_at: DateTime<Utc>,
    session_updated_at: DateTime<Utc>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    user_id: String,
    name: String,
    email: String,
    email_verified: bool,
    image: Option<String>,
    user_created_at: DateTime<Utc>,
    user_updated_at: DateTime<Utc>,
}

impl From<SessionWithUserRow> for AuthSession {
    fn from(row: SessionWithUserRow) -> Self {
        AuthSession {
            session: Session {
                id: row.session_id,
                expires_at: row.expires_at,
                token: row.token,
                created_at: row.session_created_at,
                updated_at: row.session_updated_at,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
                user_id: row.user_id.clone(),
            },
            user: User {
                id: row.user_id,
                name: row.name,
                email: row.email,
                email_verified: row.email_verified,
                image: row.image,
                created_at: row.user_created_at,
                updated_at: row.user_updated_at,
            },
        }
    }
}

/// Queries over the `user`, `account` and `session` tables.
#[derive(Clone)]
pub struct AuthRepository {
    db: Database,
}

impl AuthRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a user with a credential account and an initial session.
    ///
    /// Runs in one transaction. A taken email surfaces as `AppError::Conflict`.
    pub async fn create_user_with_session(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        new_session: NewSession,
    ) -> Result<(User, Session)> {
        let mut tx = self.db.begin().await?;

        let user_id = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"INSERT INTO "user" (id, name, email) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"#
        ))
        .bind(&user_id)
        .bind(name)
        .bind(email)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match error::sqlstate(&err).as_deref() {
            Some(error::UNIQUE_VIOLATION) => AppError::Conflict("User already exists".to_string()),
            _ => AppError::Database(err),
        })?;

        sqlx::query(
            "INSERT INTO account (id, account_id, provider_id, user_id, password)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&user_id)
        .bind(CREDENTIAL_PROVIDER)
        .bind(&user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        let session = insert_session(&mut *tx, &user_id, new_session).await?;

        tx.commit().await?;
        Ok((user, session))
    }

    /// Looks up a user and the password hash of their credential account.
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, Account)>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let account = sqlx::query_as::<_, Account>(
            "SELECT id, account_id, provider_id, user_id, password
             FROM account WHERE user_id = $1 AND provider_id = $2",
        )
        .bind(&user.id)
        .bind(CREDENTIAL_PROVIDER)
        .fetch_optional(&self.db)
        .await?;

        Ok(account.map(|account| (user, account)))
    }

    /// Opens a session, dropping the user's expired ones first.
    pub async fn create_session(&self, user_id: &str, new_session: NewSession) -> Result<Session> {
        let pruned = sqlx::query("DELETE FROM session WHERE user_id = $1 AND expires_at <= now()")
            .bind(user_id)
            .execute(&self.db)
            .await?
            .rows_affected();
        if pruned > 0 {
            tracing::debug!(user_id, pruned, "removed expired sessions");
        }

        insert_session(&self.db, user_id, new_session).await
    }

    /// Resolves an unexpired session and its user in one query. An expired
    /// session found under the token is deleted.
    pub async fn find_session(&self, token: &str) -> Result<Option<AuthSession>> {
        let row = sqlx::query_as::<_, SessionWithUserRow>(
            r#"SELECT
                s.id AS session_id, s.expires_at, s.token,
                s.created_at AS session_created_at, s.updated_at AS session_updated_at,
                s.ip_address, s.user_agent, s.user_id,
                u.name, u.email, u.email_verified, u.image,
                u.created_at AS user_created_at, u.updated_at AS user_updated_at
             FROM session s
             JOIN "user" u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > now()"#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        if row.is_none() {
            sqlx::query("DELETE FROM session WHERE token = $1 AND expires_at <= now()")
                .bind(token)
                .execute(&self.db)
                .await?;
        }

        Ok(row.map(AuthSession::from))
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(token)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn insert_session<'e, E>(executor: E, user_id: &str, new_session: NewSession) -> Result<Session>
where
    E: sqlx::PgExecutor<'e>,
{
    let session = sqlx::query_as::<_, Session>(&format!(
        "INSERT INTO session (id, expires_at, token, ip_address, user_agent, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {SESSION_COLUMNS}"
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(new_session.expires_at)
    .bind(&new_session.token)
    .bind(&new_session.client.ip_address)
    .bind(&new_session.client.user_agent)
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(session)
}

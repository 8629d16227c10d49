//! Password hashing with bcrypt, kept off the async worker threads.
//!
//! bcrypt only reads the first 72 bytes of its input, so the non-truncating
//! variants are used: longer passwords are refused instead of silently cut.

use bcrypt::{BcryptError, DEFAULT_COST};
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};

/// Longest password bcrypt hashes without truncation.
pub const MAX_PASSWORD_BYTES: usize = 72;

static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

pub async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(password, DEFAULT_COST))
        .await
        .map_err(|err| AppError::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| AppError::internal(format!("password hashing failed: {err}")))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    let verified =
        tokio::task::spawn_blocking(move || bcrypt::non_truncating_verify(password, &hash))
            .await
            .map_err(|err| {
                AppError::internal(format!("password verification task failed: {err}"))
            })?;

    match verified {
        Ok(matches) => Ok(matches),
        // Could never have been stored, so it cannot match
        Err(BcryptError::Truncation(_)) => Ok(false),
        Err(err) => Err(AppError::internal(format!("password verification failed: {err}"))),
    }
}

/// Spends one bcrypt verification on a throwaway hash.
///
/// Sign-in calls this when there is no stored hash to check against, so a
/// request for an unknown email costs the same as one with a wrong password.
pub async fn verify_dummy(password: String) -> Result<()> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_password(crate::auth::service::generate_token()))
        .await?;
    verify_password(password, hash.clone()).await?;
    Ok(())
}

//! Request extractors that turn framework rejections into `AppError::Validation`.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Json, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Field-level validation run after a body has been deserialized.
pub trait Validate {
    fn validate(&self) -> Result<(), Vec<String>>;
}

/// JSON body that is both well-formed and valid.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        value.validate().map_err(|errors| AppError::validation(errors))?;

        Ok(Self(value))
    }
}

/// Path parameters, rejected with 400 when they do not parse.
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        Ok(Self(value))
    }
}

//! JSON body extractor with the application error envelope

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use shared::AppError;

/// Like `axum::Json`, but a bad body becomes a 400 `AppError`
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::validation(rejection.body_text())),
        }
    }
}

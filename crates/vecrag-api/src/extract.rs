//! JSON extractor with automatic validation using the validator crate.
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Json, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON body that has been deserialized and validated
///
/// Syntax errors and a missing content type are reported as 4xx
/// `BAD_REQUEST`; a body of the wrong shape, or one that breaks a
/// `validator` rule, is reported as 422 with field details.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(err) => AppError::field("body", "parse", err.body_text()),
        other => AppError::BadRequest {
            status: other.status(),
            message: other.body_text(),
        },
    }
}

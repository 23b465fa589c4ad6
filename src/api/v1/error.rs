use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "no such route")
    } else if let Some(e) = err.find::<reject::MissingHeader>() {
        ApiError::new(ApiErrorCode::InvalidToken, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::InvalidInput, e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::NotFound, "no such route")
    } else {
        warn!("Unhandled rejection: {:?}", err);
        ApiError::new(ApiErrorCode::InternalError, "Internal error")
    };

    let status = error.code.status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

/// Rejection carried through warp and rendered by `recover_error`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::new(ApiErrorCode::InternalError, ApiErrorCode::InternalError.to_string())
    }
}

impl reject::Reject for ApiError {}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Invalid input")]
    InvalidInput,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already taken")]
    EmailTaken,
    #[error("Email already verified")]
    AlreadyVerified,
    #[error("Token belongs to another account")]
    WrongAccount,
    #[error("Relationship change not allowed")]
    RelationshipConflict,
    #[error("Invalid or expired code")]
    InvalidCode,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::UserNotFound | ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<RelationError> for ApiError {
    fn from(error: RelationError) -> Self {
        let code = match &error {
            RelationError::UserNotFound => ApiErrorCode::UserNotFound,
            RelationError::Store(e) => return ApiError::internal(e),
            _ => ApiErrorCode::RelationshipConflict,
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let code = match &error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::InvalidInput(_) => ApiErrorCode::InvalidInput,
            AuthError::EmailTaken => ApiErrorCode::EmailTaken,
            AuthError::UserNotFound => ApiErrorCode::UserNotFound,
            AuthError::AlreadyVerified => ApiErrorCode::AlreadyVerified,
            AuthError::WrongAccount => ApiErrorCode::WrongAccount,
            AuthError::TokenInvalid | AuthError::TokenExpired => ApiErrorCode::InvalidToken,
            AuthError::Store(e) | AuthError::InternalError(e) => return ApiError::internal(e),
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(error: UserError) -> Self {
        let code = match &error {
            UserError::UserNotFound => ApiErrorCode::UserNotFound,
            UserError::InvalidInput(_) => ApiErrorCode::InvalidInput,
            UserError::Store(e) => return ApiError::internal(e),
        };
        ApiError::new(code, error.to_string())
    }
}

impl From<ResetError> for ApiError {
    fn from(error: ResetError) -> Self {
        let code = match &error {
            ResetError::UserNotFound => ApiErrorCode::UserNotFound,
            ResetError::Incorrect { .. } | ResetError::NotFoundOrExpired => {
                ApiErrorCode::InvalidCode
            }
            ResetError::InvalidInput(_) => ApiErrorCode::InvalidInput,
            ResetError::Store(e) => return ApiError::internal(e),
            ResetError::InternalError(e) => return ApiError::internal(e),
        };
        ApiError::new(code, error.to_string())
    }
}

//! JSON envelope shared by every API route, and the mapping from
//! [`FeedError`] to HTTP responses.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::error::FeedError;
use crate::feed::Page;

/// `{success, data?, error?, message?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `{success, data, page, limit, total, has_more}`
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub has_more: bool,
}

/// 200 with data and a human-readable message.
pub fn success<T: Serialize>(data: T, message: impl Into<String>) -> Response {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
        message: Some(message.into()),
    })
    .into_response()
}

/// 200 with only a message.
pub fn success_message(message: impl Into<String>) -> Response {
    Json(ApiResponse::<()> {
        success: true,
        data: None,
        error: None,
        message: Some(message.into()),
    })
    .into_response()
}

pub fn paginated<T: Serialize>(page: Page<T>) -> Response {
    Json(PaginatedResponse {
        success: true,
        data: page.items,
        page: page.page,
        limit: page.limit,
        total: page.total,
        has_more: page.has_more,
    })
    .into_response()
}

impl FeedError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::FileTooLarge(_) | Self::InvalidFileType => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Internal(e) => {
                error!("Internal error: {e:#}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.code()),
            message: Some(message),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// JSON body extractor whose rejection is a `validation_error` envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = FeedError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> FeedError {
    debug!(error = %rejection.body_text(), "Rejected JSON body");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            FeedError::validation("Expected a JSON request body")
        }
        _ => FeedError::validation("Invalid request data"),
    }
}

/// Numeric `:id` path segment. Anything else is a `validation_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = FeedError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| FeedError::validation("Invalid id"))?;
        Ok(Self(id))
    }
}

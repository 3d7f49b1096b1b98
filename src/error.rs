use thiserror::Error;

/// Failure taxonomy shared by every feed operation.
///
/// The HTTP layer maps each variant to a status code and a stable error code
/// (see `web::response`).
#[derive(Debug, Error)]
pub enum FeedError {
    /// Input failed a validation rule. Carries the message of the first failing rule.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    /// Email already registered.
    #[error("User with this email already exists")]
    Conflict,

    /// Missing, malformed or expired session token.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Unknown email or wrong password. The two cases are not distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("File size exceeds maximum allowed size of {0} bytes")]
    FileTooLarge(usize),

    #[error("Only image files (jpg, jpeg, png, gif, webp) are allowed")]
    InvalidFileType,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FeedError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable machine-readable code for the envelope's `error` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::Conflict => "user_exists",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::FileTooLarge(_) => "file_too_large",
            Self::InvalidFileType => "invalid_file_type",
            Self::Internal(_) => "server_error",
        }
    }
}

impl From<sqlx::Error> for FeedError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;

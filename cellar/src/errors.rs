use http::StatusCode;
use thiserror::Error;

/// Result type alias for cellar operations
pub type Result<T, E = CellarError> = std::result::Result<T, E>;

/// Errors that can occur while handling a request
#[derive(Error, Debug)]
pub enum CellarError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Wines array is required")]
    NoWines,

    #[error("Price list not found: {0}")]
    ListNotFound(String),

    #[error("No products found for price list: {0}")]
    ListEmpty(String),

    #[error("Sample request not found: {0}")]
    RequestNotFound(String),

    #[error("Document store is not configured")]
    StoreUnconfigured,

    #[error("Document store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Response serialization error: {0}")]
    ResponseSerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CellarError {
    /// HTTP status this error surfaces as. Write-path integration failures
    /// never reach here; they are logged and swallowed by the handlers.
    pub fn status(&self) -> StatusCode {
        match self {
            CellarError::RequestBodyError(_) | CellarError::NoWines => StatusCode::BAD_REQUEST,
            CellarError::ListNotFound(_)
            | CellarError::ListEmpty(_)
            | CellarError::RequestNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

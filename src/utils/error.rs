use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostBoxError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("GraphQL endpoint returned status {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("GraphQL error: {}", messages.join("; "))]
    GraphQlError { messages: Vec<String> },

    #[error("GraphQL response is missing field `{field}`")]
    MissingFieldError { field: String },

    #[error("{operation} timed out after {after:?}")]
    TimeoutError {
        operation: String,
        after: std::time::Duration,
    },

    #[error("Notification error: {message}")]
    NotificationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for `{field}`: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value `{value}` for `{field}`: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, PostBoxError>;

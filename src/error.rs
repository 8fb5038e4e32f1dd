use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("{field} must be positive")]
    NonPositive { field: String },

    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

pub type WatchResult<T> = Result<T, WatchError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShowingsError {
    /// Every source list was empty. After a refresh this almost always means
    /// the scrapes failed, so it is never reported as an empty catalog.
    #[error("No titles to match")]
    NoTitlesToMatch,

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("[{source_name}] source error: {message}")]
    Source { source_name: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl ShowingsError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShowingsError>;

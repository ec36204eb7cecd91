use thiserror::Error;

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors shared by every layer of the document engine.
///
/// Schema errors and invalid-state errors point at programming or
/// configuration defects and are never recovered from inside the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Node not found: {id}")]
    NotFound { id: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    #[error("Schema error: {message}")]
    Schema { message: String },
}

impl DocumentError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(e: serde_json::Error) -> Self {
        DocumentError::schema(format!("malformed snapshot: {}", e))
    }
}

use crate::models::ItemFailure;
use std::fmt;

#[derive(Debug)]
pub enum GenError {
    ValidationError(String),
    ConfigError(String),
    RequestError(String),
    ResponseError(String),
    SerializationError(String),
    UpstreamError { status: String, detail: String },
    BatchFailed(Vec<ItemFailure>),
    PersistenceError(String),
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            GenError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            GenError::RequestError(msg) => write!(f, "Request error: {}", msg),
            GenError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            GenError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            GenError::UpstreamError { status, detail } => {
                write!(f, "API request failed: {} ({})", status, detail)
            }
            GenError::BatchFailed(failures) => {
                write!(f, "All {} generation attempts failed", failures.len())
            }
            GenError::PersistenceError(msg) => write!(f, "Persistence error: {}", msg),
        }
    }
}

impl std::error::Error for GenError {}

pub type Result<T> = std::result::Result<T, GenError>;

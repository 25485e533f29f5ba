// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid service '{service}': {reason}")]
    InvalidService { service: String, reason: String },

    #[error("Unknown service: {0}")]
    UnknownService(String),
}

impl DomainError {
    pub fn invalid(service: impl Into<String>, reason: impl Into<String>) -> Self {
        DomainError::InvalidService {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

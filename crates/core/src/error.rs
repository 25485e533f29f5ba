// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Launch failed: {0}")]
    LaunchFailed(#[from] crate::port::LaunchError),

    #[error("Port probe error: {0}")]
    Probe(#[from] crate::port::ProbeError),

    #[error("Signal error: {0}")]
    Signal(#[from] crate::port::SignalError),

    #[error("Marker error: {0}")]
    Marker(#[from] crate::port::MarkerError),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

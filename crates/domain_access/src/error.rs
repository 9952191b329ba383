//! Access domain errors

use thiserror::Error;

/// Errors raised while building principals from external input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    /// Role string did not name a known role
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A doctor principal was built without a doctor identifier
    #[error("Doctor principal {0} has no doctor id")]
    MissingDoctorId(String),

    /// E-mail address could not be used to derive an identifier
    #[error("Invalid e-mail address: {0}")]
    InvalidEmail(String),
}

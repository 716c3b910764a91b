use sqlx;
use thiserror::Error;
use uuid::Uuid;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an SQL error.
    #[error("database error")]
    Sqlx { source: sqlx::Error },

    /// Represents a transient store failure. Safe to retry.
    #[error("store unavailable")]
    Unavailable { source: sqlx::Error },

    /// Represents a request with required fields absent or blank.
    #[error("missing required fields")]
    MissingFields,

    /// Represents a path or body ID that is not a valid UUID.
    #[error("invalid ID: {0}")]
    InvalidId(String),

    /// Represents a reference to a user that does not exist.
    #[error("user not found: {0}")]
    NonExistentUser(Uuid),

    /// Represents a reference to a bin that does not exist.
    #[error("bin not found: {0}")]
    NonExistentBin(Uuid),

    /// Represents a registration with an email already in use.
    #[error("email already registered")]
    EmailAlreadyExists,

    /// Represents a bin creation reusing an existing external ID.
    #[error("bin ID already exists")]
    BinIdAlreadyExists,

    /// Represents a login that matched no stored credential.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Represents a fill level outside 0–100.
    #[error("fill level out of range: {0}")]
    InvalidFillLevel(i16),

    /// Represents a battery level outside 0–100.
    #[error("battery level out of range: {0}")]
    InvalidBattery(i16),

    /// Represents an unrecognized bin status value.
    #[error("unrecognized bin status: {0}")]
    InvalidStatus(String),

    /// Represents an unrecognized user type value.
    #[error("unrecognized user type: {0}")]
    InvalidUserType(String),

    /// Represents a submitted item failing a field range check.
    #[error("invalid item field {field}: {message}")]
    InvalidItem {
        field: &'static str,
        message: &'static str,
    },

    /// Represents a failure while hashing a credential.
    #[error("could not hash credential")]
    CredentialHash,
}

//! Shared error type across zonetally crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, ZoneTallyError>;

/// Unified error type used by core and server.
///
/// None of these are fatal to a running server: persistence and activation
/// failures are logged at the call site and swallowed. Only startup (config,
/// bind) surfaces them to `main`.
#[derive(Debug, Error)]
pub enum ZoneTallyError {
    #[error("io: {0}")]
    Io(String),
    #[error("snapshot: {0}")]
    Snapshot(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("activation: {0}")]
    Activation(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ZoneTallyError {
    /// Stable code used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            ZoneTallyError::Io(_) => "IO",
            ZoneTallyError::Snapshot(_) => "SNAPSHOT",
            ZoneTallyError::Config(_) => "CONFIG",
            ZoneTallyError::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ZoneTallyError::Activation(_) => "ACTIVATION",
            ZoneTallyError::Internal(_) => "INTERNAL",
        }
    }
}

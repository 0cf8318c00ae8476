//! Error types for cadence-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//! Media and telemetry failures are absorbed by the engine and never surface
//! here during playback; these variants cover construction, configuration and
//! host-command misuse.

use thiserror::Error;

/// Main error type for cadence-player
#[derive(Error, Debug)]
pub enum Error {
    /// Class definition or shared-library errors
    #[error(transparent)]
    Common(#[from] cadence_common::Error),

    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Media backend errors that escaped the engine
    #[error("Media error: {0}")]
    Media(String),

    /// Telemetry transport errors
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Leaving a running class part-way through needs explicit confirmation
    #[error("Exit requires confirmation while the class is running")]
    ConfirmationRequired,

    /// Engine task has finished and accepts no more commands
    #[error("Playback engine is no longer running")]
    EngineStopped,

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using cadence-player Error
pub type Result<T> = std::result::Result<T, Error>;

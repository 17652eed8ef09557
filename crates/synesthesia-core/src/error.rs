//! Error types for audio-graph setup and session orchestration.
//!
//! Only the setup path produces errors. The per-frame path recovers every
//! numeric edge case locally and never returns one of these.

use crate::session::SessionStatus;
use crate::stems::StemKind;
use thiserror::Error;

/// Errors raised by an [`crate::channel::AudioGraph`] implementation.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to create player for '{channel}': {reason}")]
    PlayerCreation { channel: String, reason: String },

    #[error("failed to create meter for '{channel}': {reason}")]
    MeterCreation { channel: String, reason: String },

    #[error("audio context unavailable: {0}")]
    ContextUnavailable(String),
}

/// Errors surfaced to the user by [`crate::session::Session`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// The separation backend answered with `success: false` or a non-2xx status.
    #[error("separation failed: {0}")]
    Backend(String),

    /// The response body could not be understood.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Decoding or fetching the stem assets failed.
    #[error("failed to load audio: {0}")]
    Load(String),

    /// A response or load completion arrived for a superseded load.
    #[error("load {0} was superseded by a newer track")]
    StaleLoad(u64),

    #[error("no visual instance with id '{0}'")]
    UnknownInstance(String),

    #[error("stem '{0}' is not available for this track")]
    StemUnavailable(StemKind),

    #[error("operation not valid while {0}")]
    NotReady(SessionStatus),

    #[error(transparent)]
    Audio(#[from] AudioError),
}

impl SessionError {
    /// Stale results are expected during rapid reloads and are not shown to the user.
    pub fn is_stale(&self) -> bool {
        matches!(self, SessionError::StaleLoad(_))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

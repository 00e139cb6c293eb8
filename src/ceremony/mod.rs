//! Hardware-credential ceremonies: the login second factor and authenticator
//! enrollment, driven as explicit state machines over the challenge API and
//! the platform capability.

pub mod authenticator;
pub mod codec;
pub mod login;
pub mod registration;

use crate::api::client::ApiError;
use authenticator::AuthenticatorError;
use codec::EncodingError;
use thiserror::Error;

/// Why a ceremony attempt reached its `Failed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Network,
    ServerRejected,
    InvalidCredentials,
    RejectedByUser,
    TimedOut,
    Unsupported,
    Encoding,
}

/// Error surface of the ceremony state machines. Every variant except the
/// guard rejections (`Busy`, `Finished`) drives the session into a terminal
/// `Failed` state; a fresh session is required to try again.
#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("the server rejected the request ({status}): {message}")]
    ServerRejected { status: u16, message: String },
    #[error("the server could not verify this username and password")]
    InvalidCredentials,
    #[error("the authenticator ceremony was declined")]
    RejectedByUser,
    #[error("the authenticator ceremony timed out")]
    TimedOut,
    #[error("no usable authenticator is available")]
    Unsupported,
    #[error("encoding contract violation: {0}")]
    Encoding(#[from] EncodingError),
    #[error("the server sent a response this client could not decode: {0}")]
    Malformed(String),
    #[error("the server did not accept the hardware proof")]
    ProofNotAccepted,
    #[error("another step of this attempt is still in flight")]
    Busy,
    #[error("this attempt has already finished; start a new attempt")]
    Finished,
}

impl CeremonyError {
    /// The terminal failure reason this error records on the session, if
    /// any. Guard rejections leave the session untouched and return `None`.
    #[must_use]
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Network(_) => Some(FailureReason::Network),
            Self::ServerRejected { .. } | Self::ProofNotAccepted => {
                Some(FailureReason::ServerRejected)
            }
            Self::InvalidCredentials => Some(FailureReason::InvalidCredentials),
            Self::RejectedByUser => Some(FailureReason::RejectedByUser),
            Self::TimedOut => Some(FailureReason::TimedOut),
            Self::Unsupported => Some(FailureReason::Unsupported),
            Self::Encoding(_) | Self::Malformed(_) => Some(FailureReason::Encoding),
            Self::Busy | Self::Finished => None,
        }
    }
}

impl From<ApiError> for CeremonyError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::BaseUrl(message) | ApiError::Network(message) => Self::Network(message),
            ApiError::Rejected { status, message } => Self::ServerRejected { status, message },
            ApiError::Parse(message) => Self::Malformed(message),
        }
    }
}

impl From<AuthenticatorError> for CeremonyError {
    fn from(err: AuthenticatorError) -> Self {
        match err {
            AuthenticatorError::Rejected => Self::RejectedByUser,
            AuthenticatorError::TimedOut => Self::TimedOut,
            AuthenticatorError::Unsupported => Self::Unsupported,
        }
    }
}

use thiserror::Error;

use capacity_core::error::{CapacityError, TechnicalMessage};

use crate::resilience::{PolicyError, Rejection};

pub const NO_ADDITIONAL_ERROR_DETAILS: &str = "No additional error details";

/// Failure talking to the technology service, before it is mapped onto the
/// domain taxonomy.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("technology service responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("technology service timed out")]
    Timeout,

    #[error("technology service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected response from technology service: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("call to technology service rejected: {0}")]
    Rejected(Rejection),

    /// Produced by the fallback for timeouts and rejections.
    #[error("technology service unavailable ({0})")]
    Unavailable(&'static str),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e)
        } else {
            Self::Transport(e)
        }
    }
}

impl PolicyError for GatewayError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Timeout | Self::Transport(_) => true,
            Self::Decode(_) | Self::Rejected(_) | Self::Unavailable(_) => false,
        }
    }

    fn rejected(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

/// Circuit breaker fallback: timeouts and rejections become a generic
/// internal error, everything else passes through.
pub fn fallback(e: GatewayError) -> GatewayError {
    match e {
        GatewayError::Timeout => GatewayError::Unavailable("timeout"),
        GatewayError::Rejected(Rejection::CircuitOpen) => GatewayError::Unavailable("circuit open"),
        GatewayError::Rejected(Rejection::BulkheadFull) => {
            GatewayError::Unavailable("bulkhead full")
        }
        other => other,
    }
}

impl From<GatewayError> for CapacityError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Status { status, .. } if (400..500).contains(&status) => {
                CapacityError::EntityNotFound(TechnicalMessage::TechnologiesNotFound)
            }
            GatewayError::Timeout | GatewayError::Rejected(_) | GatewayError::Unavailable(_) => {
                CapacityError::technical_from(TechnicalMessage::InternalError, e)
            }
            other => CapacityError::technical_from(TechnicalMessage::ErrorTechnologyAdapter, other),
        }
    }
}

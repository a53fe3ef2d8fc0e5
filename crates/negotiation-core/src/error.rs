//! Error handling for media negotiation
//!
//! Hard failures are reported through [`NegotiationError`]. A negotiation
//! that finds no common codec is not an error (see
//! [`AnswerOutcome::NoMatch`](crate::answer::AnswerOutcome)), and problems
//! confined to a single media block are reported as
//! [`ExtractionIssue`](crate::resolver::ExtractionIssue) data.

use thiserror::Error;

/// Result type alias for negotiation operations
pub type Result<T> = std::result::Result<T, NegotiationError>;

/// Error type for negotiation operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// Offer generation failed; no partial offer is produced
    #[error("Offer build failed: {reason}")]
    OfferBuildFailed { reason: String },

    /// Answer generation failed for a reason other than codec mismatch
    #[error("Answer build failed: {reason}")]
    AnswerBuildFailed { reason: String },

    /// No record exists for the call
    #[error("Call not found: {call_id}")]
    CallNotFound { call_id: String },

    /// An attribute value does not follow its sub-grammar
    #[error("Malformed {attribute} attribute: {value:?}")]
    MalformedAttribute { attribute: String, value: String },

    /// Every port in the configured range is in use
    #[error("No free port in range {min}..{max} after {attempts} attempts")]
    PortsExhausted { min: u16, max: u16, attempts: usize },

    /// Invalid configuration or codec catalog
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transport collaborator rejected a flow table
    #[error("Transport error: {0}")]
    Transport(String),
}

impl NegotiationError {
    /// Create a new offer build failure
    pub fn offer_build_failed(reason: impl Into<String>) -> Self {
        Self::OfferBuildFailed {
            reason: reason.into(),
        }
    }

    /// Create a new answer build failure
    pub fn answer_build_failed(reason: impl Into<String>) -> Self {
        Self::AnswerBuildFailed {
            reason: reason.into(),
        }
    }

    /// Create a new call not found error
    pub fn call_not_found(call_id: impl Into<String>) -> Self {
        Self::CallNotFound {
            call_id: call_id.into(),
        }
    }

    /// Create a new malformed attribute error
    pub fn malformed_attribute(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedAttribute {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(details: impl Into<String>) -> Self {
        Self::Config(details.into())
    }

    /// Create a new transport error
    pub fn transport(details: impl Into<String>) -> Self {
        Self::Transport(details.into())
    }
}

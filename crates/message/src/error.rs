//! Error types for the sealpost-message crate.

use std::fmt;

use sealpost_crypto::CryptoError;
use sealpost_shared::error::{ParseError, ProtocolError};
use thiserror::Error;

/// Required envelope parts, in the order `build()` checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeField {
    BodyEncryption,
    RawContent,
    InternalMetadata,
    ExternalMetadata,
}

impl EnvelopeField {
    pub const CHECK_ORDER: [EnvelopeField; 4] = [
        EnvelopeField::BodyEncryption,
        EnvelopeField::RawContent,
        EnvelopeField::InternalMetadata,
        EnvelopeField::ExternalMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeField::BodyEncryption => "body encryption",
            EnvelopeField::RawContent => "raw content",
            EnvelopeField::InternalMetadata => "internal metadata",
            EnvelopeField::ExternalMetadata => "external metadata",
        }
    }
}

impl fmt::Display for EnvelopeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    /// A setter was called before the field it depends on.
    #[error("{setter} requires {requires} to be set first")]
    MissingPrerequisite {
        setter: &'static str,
        requires: EnvelopeField,
    },

    #[error("incomplete envelope: missing {missing}")]
    IncompleteEnvelope { missing: EnvelopeField },

    #[error(transparent)]
    Name(#[from] ParseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Decoded fine but does not re-encode to the same bytes.
    #[error("envelope is not in canonical form")]
    NonCanonical,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        MessageError::Serialization(err.to_string())
    }
}

impl From<MessageError> for ProtocolError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::Name(e) => ProtocolError::Parse(e),
            MessageError::Crypto(e) => e.into(),
            MessageError::Serialization(msg) => ProtocolError::Serialization(msg),
            other => ProtocolError::Builder(other.to_string()),
        }
    }
}

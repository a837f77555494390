//! sealpost-message: signed, optionally sealed message envelopes.
//!
//! [`MessageBuilder`] accumulates fields and builds an immutable
//! [`Envelope`]; [`recipes`] holds the fixed message shapes (acks, pings, job
//! messages, registration-code requests and so on).

pub mod builder;
pub mod envelope;
pub mod error;
pub mod recipes;

pub use builder::{BuilderState, MessageBuilder, MessageKeys};
pub use envelope::{
    EncryptionMethod, EncryptionStatus, Envelope, ExternalMetadata, InternalMetadata, MessageBody,
    MessageContent, MessageData, PlainContent,
};
pub use error::{EnvelopeField, MessageError};
pub use recipes::{build_from, Recipe};

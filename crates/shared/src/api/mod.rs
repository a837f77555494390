//! Payloads carried as raw content inside envelopes.

pub mod control;
pub mod inbox;
pub mod job;
pub mod registration;
pub mod schema;

pub use schema::MessageSchemaType;

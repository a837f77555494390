//! sealpost shared library for identity and inbox naming, payload schemas, and
//! the error taxonomy shared by every sealpost crate.

pub mod api;
pub mod constants;
pub mod error;
pub mod identity_name;
pub mod ids;
pub mod inbox_name;

pub use identity_name::{IdentityName, SubidentityType};
pub use ids::JobId;
pub use inbox_name::InboxName;

use serde::{Deserialize, Serialize};

/// Raw content of an acknowledgement.
pub const ACK_CONTENT: &str = "ACK";
/// Raw content of a session termination notice.
pub const TERMINATE_CONTENT: &str = "terminate";

/// Liveness probe content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PingPong {
    Ping,
    Pong,
}

impl PingPong {
    pub fn as_str(&self) -> &'static str {
        match self {
            PingPong::Ping => "Ping",
            PingPong::Pong => "Pong",
        }
    }

    /// The expected reply.
    pub fn reply(&self) -> Self {
        match self {
            PingPong::Ping => PingPong::Pong,
            PingPong::Pong => PingPong::Ping,
        }
    }
}

/// Payload of an error notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

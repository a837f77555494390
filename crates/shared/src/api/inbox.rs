use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inbox_name::InboxName;

/// Request for the most recent messages of an inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiGetMessagesFromInboxRequest {
    pub inbox: InboxName,
    pub count: usize,
    /// Key of the message to page back from. None = newest.
    pub offset: Option<String>,
}

/// Marks every message in an inbox up to a point in time as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReadUpToTimeRequest {
    pub inbox_name: InboxName,
    pub up_to_time: DateTime<Utc>,
}

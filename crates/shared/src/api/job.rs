use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::inbox_name::InboxName;

/// Resources a job may read from. References are opaque ids at this layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScope {
    pub buckets: BTreeSet<String>,
    pub documents: BTreeSet<String>,
}

impl JobScope {
    pub fn new(
        buckets: impl IntoIterator<Item = String>,
        documents: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            buckets: buckets.into_iter().collect(),
            documents: documents.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.documents.is_empty()
    }
}

/// Payload of a job creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCreation {
    pub scope: JobScope,
}

/// Payload of a message posted into a job's conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: String,
    pub content: String,
    /// Inbox carrying files attached to this message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_inbox: Option<InboxName>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_scope_deduplicates_and_orders_references() {
        let scope = JobScope::new(
            ["b".to_string(), "a".to_string(), "a".to_string()],
            ["doc-1".to_string()],
        );
        assert_eq!(scope.buckets.len(), 2);
        let json = serde_json::to_string(&scope).unwrap();
        assert_eq!(json, r#"{"buckets":["a","b"],"documents":["doc-1"]}"#);
    }

    #[test]
    fn empty_scope() {
        assert!(JobScope::default().is_empty());
        assert!(!JobScope::new(["x".to_string()], []).is_empty());
    }

    #[test]
    fn job_creation_serde() {
        let creation = JobCreation {
            scope: JobScope::new([], ["doc".to_string()]),
        };
        let json = serde_json::to_string(&creation).unwrap();
        let back: JobCreation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creation);
    }

    #[test]
    fn job_message_omits_missing_files_inbox() {
        let msg = JobMessage {
            job_id: "jobid_1".into(),
            content: "summarize".into(),
            files_inbox: None,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("files_inbox").is_none());
        let back: JobMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn job_message_carries_files_inbox() {
        let msg = JobMessage {
            job_id: "jobid_1".into(),
            content: "see attached".into(),
            files_inbox: Some(InboxName::from_job_id("files_42").unwrap()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["files_inbox"], "job_inbox::files_42::false");
        let back: JobMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}

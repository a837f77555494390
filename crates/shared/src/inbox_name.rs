//! Canonical conversation identifiers.
//!
//! A regular inbox is keyed by its participants, sorted by canonical identity
//! string, plus the end-to-end flag:
//! `inbox::@@a.net/main::@@b.net/main::true`. A job inbox is keyed by the
//! job's unique id: `job_inbox::jobid_123::false`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{INBOX_DELIMITER, JOB_INBOX_PREFIX, MAX_JOB_ID_LENGTH, REGULAR_INBOX_PREFIX};
use crate::error::ParseError;
use crate::identity_name::IdentityName;

/// Participants of a regular inbox, always held in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegularInbox {
    participants: Vec<IdentityName>,
    is_end_to_end: bool,
}

/// A job inbox. The id is opaque to the addressing layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobInbox {
    unique_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InboxName {
    Regular(RegularInbox),
    Job(JobInbox),
}

impl InboxName {
    /// Regular inbox between two identities, each optionally narrowed to a
    /// sub-identity path. Argument order does not affect the result.
    pub fn from_identities(
        sender: &IdentityName,
        sender_subidentity: &str,
        recipient: &IdentityName,
        recipient_subidentity: &str,
        is_end_to_end: bool,
    ) -> Result<Self, ParseError> {
        let sender = sender.with_subidentity(sender_subidentity)?;
        let recipient = recipient.with_subidentity(recipient_subidentity)?;
        Self::regular([sender, recipient], is_end_to_end)
    }

    /// Regular inbox over any non-empty participant list.
    pub fn regular(
        participants: impl IntoIterator<Item = IdentityName>,
        is_end_to_end: bool,
    ) -> Result<Self, ParseError> {
        let mut participants: Vec<IdentityName> = participants.into_iter().collect();
        if participants.is_empty() {
            return Err(ParseError::InvalidInboxFormat(
                "regular inbox needs at least one participant".into(),
            ));
        }
        participants.sort_by_cached_key(IdentityName::to_canonical_string);
        Ok(InboxName::Regular(RegularInbox {
            participants,
            is_end_to_end,
        }))
    }

    /// Job inbox for a job's unique id. Uniqueness is the caller's concern.
    pub fn from_job_id(unique_id: impl Into<String>) -> Result<Self, ParseError> {
        let unique_id = unique_id.into();
        if unique_id.is_empty()
            || unique_id.len() > MAX_JOB_ID_LENGTH
            || unique_id
                .chars()
                .any(|c| c == ':' || c.is_whitespace() || c.is_control())
        {
            return Err(ParseError::InvalidInboxFormat(format!(
                "invalid job id: {unique_id}"
            )));
        }
        Ok(InboxName::Job(JobInbox { unique_id }))
    }

    /// Parse a canonical inbox string. Participants must already be in
    /// canonical order; anything else names no inbox.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let invalid = |reason: &str| ParseError::InvalidInboxFormat(format!("{reason}: {raw}"));
        let parts: Vec<&str> = raw.split(INBOX_DELIMITER).collect();

        match parts.as_slice() {
            [prefix, unique_id, flag] if *prefix == JOB_INBOX_PREFIX => {
                if *flag != "false" {
                    return Err(invalid("job inbox cannot be end-to-end"));
                }
                Self::from_job_id(*unique_id)
            }
            [prefix, middle @ .., flag] if *prefix == REGULAR_INBOX_PREFIX && !middle.is_empty() => {
                let is_end_to_end = parse_flag(flag).ok_or_else(|| invalid("bad end-to-end flag"))?;
                let participants = middle
                    .iter()
                    .map(|p| IdentityName::parse(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let canonical = participants
                    .windows(2)
                    .all(|w| w[0].to_canonical_string() <= w[1].to_canonical_string());
                if !canonical {
                    return Err(invalid("participants out of canonical order"));
                }
                Ok(InboxName::Regular(RegularInbox {
                    participants,
                    is_end_to_end,
                }))
            }
            _ => Err(invalid("unrecognized inbox")),
        }
    }

    /// Canonical wire identifier; inverse of [`InboxName::parse`].
    pub fn to_canonical_string(&self) -> String {
        match self {
            InboxName::Regular(inbox) => {
                let mut parts = Vec::with_capacity(inbox.participants.len() + 2);
                parts.push(REGULAR_INBOX_PREFIX.to_string());
                parts.extend(inbox.participants.iter().map(IdentityName::to_canonical_string));
                parts.push(inbox.is_end_to_end.to_string());
                parts.join(INBOX_DELIMITER)
            }
            InboxName::Job(job) => {
                format!("{JOB_INBOX_PREFIX}{INBOX_DELIMITER}{}{INBOX_DELIMITER}false", job.unique_id)
            }
        }
    }

    pub fn is_end_to_end(&self) -> bool {
        match self {
            InboxName::Regular(inbox) => inbox.is_end_to_end,
            InboxName::Job(_) => false,
        }
    }

    /// Participants in canonical order. Empty for job inboxes.
    pub fn participants(&self) -> &[IdentityName] {
        match self {
            InboxName::Regular(inbox) => &inbox.participants,
            InboxName::Job(_) => &[],
        }
    }

    pub fn is_job_inbox(&self) -> bool {
        matches!(self, InboxName::Job(_))
    }

    pub fn unique_id(&self) -> Option<&str> {
        match self {
            InboxName::Job(job) => Some(&job.unique_id),
            InboxName::Regular(_) => None,
        }
    }

    /// First half of the hex SHA-256 of the canonical string; a fixed-width
    /// key for storage layers.
    pub fn hash_value_first_half(&self) -> String {
        let digest = Sha256::digest(self.to_canonical_string().as_bytes());
        let hex = hex::encode(digest);
        hex[..hex.len() / 2].to_string()
    }
}

fn parse_flag(flag: &str) -> Option<bool> {
    match flag {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl fmt::Display for InboxName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for InboxName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InboxName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InboxName> for String {
    fn from(inbox: InboxName) -> Self {
        inbox.to_canonical_string()
    }
}

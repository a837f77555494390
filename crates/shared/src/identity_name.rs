//! Hierarchical identity names: `@@node.net[/profile[/device|agent/name]]`.
//!
//! Parsing lower-cases the input and validates every segment against the
//! identifier grammar; anything that does not fit is rejected rather than
//! coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    IDENTITY_DELIMITER, MAX_NAME_SEGMENT_LENGTH, MAX_NODE_NAME_LENGTH, NODE_PREFIX,
};
use crate::error::ParseError;

/// Kind of sub-identity hanging off a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubidentityType {
    None,
    Device,
    Agent,
}

impl SubidentityType {
    /// Segment used in the canonical string. Empty for `None`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubidentityType::None => "",
            SubidentityType::Device => "device",
            SubidentityType::Agent => "agent",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "device" => Some(SubidentityType::Device),
            "agent" => Some(SubidentityType::Agent),
            _ => None,
        }
    }
}

/// A validated, lower-cased identity name.
///
/// Invariants: `node` always starts with `@@`; a sub-identity is only present
/// together with a profile; `subidentity_name` is `Some` exactly when
/// `subidentity_type` is not `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityName {
    node: String,
    profile: Option<String>,
    subidentity_type: SubidentityType,
    subidentity_name: Option<String>,
}

impl IdentityName {
    /// Parse a raw identity string.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidIdentityFormat(raw.to_string());

        let normalized = raw.to_ascii_lowercase();
        let segments: Vec<&str> = normalized.split(IDENTITY_DELIMITER).collect();

        let node = segments[0];
        if !is_valid_node(node) {
            return Err(invalid());
        }

        match segments.as_slice() {
            [node] => Ok(Self::bare(node)),
            [node, profile] if is_valid_segment(profile) => Ok(Self {
                node: (*node).to_string(),
                profile: Some((*profile).to_string()),
                subidentity_type: SubidentityType::None,
                subidentity_name: None,
            }),
            [node, profile, kind, name] if is_valid_segment(profile) && is_valid_segment(name) => {
                let subidentity_type = SubidentityType::from_segment(kind).ok_or_else(invalid)?;
                Ok(Self {
                    node: (*node).to_string(),
                    profile: Some((*profile).to_string()),
                    subidentity_type,
                    subidentity_name: Some((*name).to_string()),
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Build a name from a node and a profile, validating both.
    pub fn from_node_and_profile(node: &str, profile: &str) -> Result<Self, ParseError> {
        Self::parse(&format!("{node}{IDENTITY_DELIMITER}{profile}"))
    }

    /// Attach a sub-identity path (`"main"`, `"main/device/phone"`) to this
    /// name's node. An empty path returns the name unchanged. A path that is
    /// itself a full identity must live on the same node.
    pub fn with_subidentity(&self, subidentity: &str) -> Result<Self, ParseError> {
        if subidentity.is_empty() {
            return Ok(self.clone());
        }
        if subidentity.starts_with(NODE_PREFIX) {
            let full = Self::parse(subidentity)?;
            if full.node != self.node {
                return Err(ParseError::MixedNode {
                    node: self.node.clone(),
                    subidentity: subidentity.to_string(),
                });
            }
            return Ok(full);
        }
        Self::parse(&format!("{}{IDENTITY_DELIMITER}{subidentity}", self.node))
    }

    /// Canonical string form; inverse of [`IdentityName::parse`].
    pub fn to_canonical_string(&self) -> String {
        let mut out = self.node.clone();
        if let Some(profile) = &self.profile {
            out.push(IDENTITY_DELIMITER);
            out.push_str(profile);
            if let Some(name) = &self.subidentity_name {
                out.push(IDENTITY_DELIMITER);
                out.push_str(self.subidentity_type.as_str());
                out.push(IDENTITY_DELIMITER);
                out.push_str(name);
            }
        }
        out
    }

    /// Drop any device/agent component, keeping node and profile.
    pub fn extract_profile(&self) -> Result<Self, ParseError> {
        match &self.profile {
            Some(profile) => Ok(Self {
                node: self.node.clone(),
                profile: Some(profile.clone()),
                subidentity_type: SubidentityType::None,
                subidentity_name: None,
            }),
            None => Err(ParseError::ComponentMissing {
                component: "profile",
                name: self.to_canonical_string(),
            }),
        }
    }

    /// Drop everything but the node.
    pub fn extract_node(&self) -> Self {
        Self::bare(&self.node)
    }

    pub fn node_name(&self) -> &str {
        &self.node
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn subidentity_type(&self) -> SubidentityType {
        self.subidentity_type
    }

    pub fn subidentity_name(&self) -> Option<&str> {
        self.subidentity_name.as_deref()
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    pub fn has_subidentity(&self) -> bool {
        self.subidentity_type != SubidentityType::None
    }

    /// True when the name is a bare node with no profile.
    pub fn is_node(&self) -> bool {
        self.profile.is_none()
    }

    fn bare(node: &str) -> Self {
        Self {
            node: node.to_string(),
            profile: None,
            subidentity_type: SubidentityType::None,
            subidentity_name: None,
        }
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= MAX_NAME_SEGMENT_LENGTH
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

fn is_valid_node(node: &str) -> bool {
    if node.len() > MAX_NODE_NAME_LENGTH {
        return false;
    }
    let Some(domain) = node.strip_prefix(NODE_PREFIX) else {
        return false;
    };
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| is_valid_segment(label))
}

impl fmt::Display for IdentityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for IdentityName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IdentityName {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdentityName> for String {
    fn from(name: IdentityName) -> Self {
        name.to_canonical_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_node() {
        let name = IdentityName::parse("@@alice.sealpost").unwrap();
        assert_eq!(name.node_name(), "@@alice.sealpost");
        assert!(name.is_node());
        assert!(!name.has_subidentity());
    }

    #[test]
    fn parses_profile_and_device() {
        let name = IdentityName::parse("@@alice.sealpost/main/device/phone").unwrap();
        assert_eq!(name.profile_name(), Some("main"));
        assert_eq!(name.subidentity_type(), SubidentityType::Device);
        assert_eq!(name.subidentity_name(), Some("phone"));
    }

    #[test]
    fn parses_agent_subidentity() {
        let name = IdentityName::parse("@@node1.test-net/work/agent/gpt_4").unwrap();
        assert_eq!(name.subidentity_type(), SubidentityType::Agent);
        assert_eq!(name.subidentity_name(), Some("gpt_4"));
    }

    #[test]
    fn lower_cases_input() {
        let name = IdentityName::parse("@@Alice.SealPost/Main").unwrap();
        assert_eq!(name.to_canonical_string(), "@@alice.sealpost/main");
    }

    #[test]
    fn canonical_string_round_trips() {
        for raw in [
            "@@alice.sealpost",
            "@@alice.sealpost/main",
            "@@alice.sealpost/main/device/phone",
            "@@bob.dev.sealpost/work/agent/helper-1",
        ] {
            let parsed = IdentityName::parse(raw).unwrap();
            let canonical = parsed.to_canonical_string();
            assert_eq!(canonical, raw);
            assert_eq!(IdentityName::parse(&canonical).unwrap(), parsed);
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for raw in [
            "",
            "alice.sealpost",
            "@alice.sealpost",
            "@@alice",
            "@@.sealpost",
            "@@alice.sealpost/",
            "@@alice.sealpost//main",
            "@@alice.sealpost/main/device",
            "@@alice.sealpost/main/phone/x",
            "@@alice.sealpost/main/device/x/extra",
            "@@alice sealpost",
            "@@alice.sealpost/ma in",
            "@@alice.sealpost/m@in",
        ] {
            assert!(
                matches!(
                    IdentityName::parse(raw),
                    Err(ParseError::InvalidIdentityFormat(_))
                ),
                "expected rejection of {raw:?}"
            );
        }
    }

    #[test]
    fn rejects_overlong_segments() {
        let long = "a".repeat(MAX_NAME_SEGMENT_LENGTH + 1);
        assert!(IdentityName::parse(&format!("@@alice.sealpost/{long}")).is_err());
        let ok = "a".repeat(MAX_NAME_SEGMENT_LENGTH);
        assert!(IdentityName::parse(&format!("@@alice.sealpost/{ok}")).is_ok());
    }

    #[test]
    fn rejects_non_ascii() {
        assert!(IdentityName::parse("@@alïce.sealpost").is_err());
    }

    #[test]
    fn extract_profile_drops_device() {
        let name = IdentityName::parse("@@alice.sealpost/main/device/phone").unwrap();
        let profile = name.extract_profile().unwrap();
        assert_eq!(profile.to_string(), "@@alice.sealpost/main");
    }

    #[test]
    fn extract_profile_from_node_is_component_missing() {
        let name = IdentityName::parse("@@alice.sealpost").unwrap();
        match name.extract_profile() {
            Err(ParseError::ComponentMissing { component, .. }) => assert_eq!(component, "profile"),
            other => panic!("expected ComponentMissing, got: {other:?}"),
        }
    }

    #[test]
    fn extract_node_drops_everything_else() {
        let name = IdentityName::parse("@@alice.sealpost/main/agent/bot").unwrap();
        assert_eq!(name.extract_node().to_string(), "@@alice.sealpost");
    }

    #[test]
    fn with_subidentity_appends_to_node() {
        let node = IdentityName::parse("@@alice.sealpost/old").unwrap();
        assert_eq!(
            node.with_subidentity("main/device/phone").unwrap().to_string(),
            "@@alice.sealpost/main/device/phone"
        );
        assert_eq!(node.with_subidentity("").unwrap(), node);
    }

    #[test]
    fn with_subidentity_rejects_foreign_node() {
        let node = IdentityName::parse("@@alice.sealpost").unwrap();
        let err = node.with_subidentity("@@bob.sealpost/main").unwrap_err();
        assert!(matches!(err, ParseError::MixedNode { .. }));
        assert!(node.with_subidentity("@@alice.sealpost/main").is_ok());
    }

    #[test]
    fn from_node_and_profile_validates() {
        assert!(IdentityName::from_node_and_profile("@@alice.sealpost", "main").is_ok());
        assert!(IdentityName::from_node_and_profile("@@alice.sealpost", "bad/x").is_err());
    }

    #[test]
    fn serializes_as_canonical_string() {
        let name = IdentityName::parse("@@alice.sealpost/main").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"@@alice.sealpost/main\"");
        let back: IdentityName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    #[test]
    fn deserialize_rejects_invalid_string() {
        assert!(serde_json::from_str::<IdentityName>("\"not-a-name\"").is_err());
    }
}

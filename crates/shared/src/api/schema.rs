use serde::{Deserialize, Serialize};

/// Tag describing how an envelope's raw content should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageSchemaType {
    #[default]
    #[serde(rename = "")]
    Empty,
    TextContent,
    JobCreationSchema,
    JobMessageSchema,
    CreateRegistrationCode,
    UseRegistrationCode,
    #[serde(rename = "APIGetMessagesFromInboxRequest")]
    ApiGetMessagesFromInboxRequest,
    #[serde(rename = "APIGetLastUnreadMessagesFromInboxRequest")]
    ApiGetLastUnreadMessagesFromInboxRequest,
    #[serde(rename = "APIReadUpToTimeRequest")]
    ApiReadUpToTimeRequest,
}

impl MessageSchemaType {
    pub const ALL: [MessageSchemaType; 9] = [
        MessageSchemaType::Empty,
        MessageSchemaType::TextContent,
        MessageSchemaType::JobCreationSchema,
        MessageSchemaType::JobMessageSchema,
        MessageSchemaType::CreateRegistrationCode,
        MessageSchemaType::UseRegistrationCode,
        MessageSchemaType::ApiGetMessagesFromInboxRequest,
        MessageSchemaType::ApiGetLastUnreadMessagesFromInboxRequest,
        MessageSchemaType::ApiReadUpToTimeRequest,
    ];

    /// Wire name of the schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageSchemaType::Empty => "",
            MessageSchemaType::TextContent => "TextContent",
            MessageSchemaType::JobCreationSchema => "JobCreationSchema",
            MessageSchemaType::JobMessageSchema => "JobMessageSchema",
            MessageSchemaType::CreateRegistrationCode => "CreateRegistrationCode",
            MessageSchemaType::UseRegistrationCode => "UseRegistrationCode",
            MessageSchemaType::ApiGetMessagesFromInboxRequest => "APIGetMessagesFromInboxRequest",
            MessageSchemaType::ApiGetLastUnreadMessagesFromInboxRequest => {
                "APIGetLastUnreadMessagesFromInboxRequest"
            }
            MessageSchemaType::ApiReadUpToTimeRequest => "APIReadUpToTimeRequest",
        }
    }

    /// Parse a wire name. Matching is case-sensitive.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|schema| schema.as_str() == name)
    }
}

impl std::fmt::Display for MessageSchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageSchemaType::Empty => f.write_str("Empty"),
            other => f.write_str(other.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_wire_names() {
        for schema in MessageSchemaType::ALL {
            let json = serde_json::to_string(&schema).unwrap();
            assert_eq!(json, format!("\"{}\"", schema.as_str()));
            let back: MessageSchemaType = serde_json::from_str(&json).unwrap();
            assert_eq!(back, schema);
        }
    }

    #[test]
    fn from_wire_name_is_case_sensitive() {
        assert_eq!(
            MessageSchemaType::from_wire_name("JobMessageSchema"),
            Some(MessageSchemaType::JobMessageSchema)
        );
        assert_eq!(MessageSchemaType::from_wire_name("jobmessageschema"), None);
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(MessageSchemaType::default(), MessageSchemaType::Empty);
        assert_eq!(MessageSchemaType::Empty.as_str(), "");
    }
}

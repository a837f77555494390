/// Errors raised while parsing or projecting identity and inbox names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid identity format: {0}")]
    InvalidIdentityFormat(String),

    #[error("invalid inbox format: {0}")]
    InvalidInboxFormat(String),

    #[error("invalid job id: {0}")]
    InvalidJobId(String),

    /// A projection asked for a component the name does not carry.
    #[error("{component} missing from name {name}")]
    ComponentMissing {
        component: &'static str,
        name: String,
    },

    /// A sub-identity names a different node than the identity it extends.
    #[error("sub-identity {subidentity} does not belong to node {node}")]
    MixedNode { node: String, subidentity: String },
}

/// Umbrella error type every sealpost crate error converts into.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("builder error: {0}")]
    Builder(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identity_contains_input() {
        let err = ParseError::InvalidIdentityFormat("alice".into());
        assert_eq!(err.to_string(), "invalid identity format: alice");
    }

    #[test]
    fn component_missing_names_component_and_source() {
        let err = ParseError::ComponentMissing {
            component: "profile",
            name: "@@alice.sealpost".into(),
        };
        assert_eq!(err.to_string(), "profile missing from name @@alice.sealpost");
    }

    #[test]
    fn parse_error_converts_into_protocol_error() {
        let err: ProtocolError = ParseError::InvalidInboxFormat("x".into()).into();
        assert!(matches!(err, ProtocolError::Parse(_)));
        assert_eq!(err.to_string(), "parse error: invalid inbox format: x");
    }

    #[test]
    fn all_variants_impl_error() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(ParseError::InvalidIdentityFormat("a".into())),
            Box::new(ParseError::InvalidInboxFormat("b".into())),
            Box::new(ParseError::ComponentMissing {
                component: "node",
                name: "c".into(),
            }),
            Box::new(ParseError::MixedNode {
                node: "@@a.net".into(),
                subidentity: "@@b.net/main".into(),
            }),
            Box::new(ProtocolError::Crypto("d".into())),
            Box::new(ProtocolError::Builder("e".into())),
            Box::new(ProtocolError::Serialization("f".into())),
        ];
        for e in &errors {
            assert!(!e.to_string().is_empty());
        }
    }
}

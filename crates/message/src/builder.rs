//! Incremental construction of signed envelopes.
//!
//! A [`MessageBuilder`] owns the sender's keys and accumulates fields through
//! its setters. `build()` consumes it, so a builder produces at most one
//! envelope. One builder per in-flight message; it is not meant to be shared.

use chrono::{DateTime, SubsecRound, Utc};

use sealpost_crypto::signing::signature_to_string;
use sealpost_crypto::{
    derive_shared_secret, sign, EncryptionPublicKey, EncryptionSecretKey, SharedSecret, SigningKey,
};
use sealpost_shared::api::MessageSchemaType;
use sealpost_shared::{IdentityName, InboxName};

use crate::envelope::{
    signing_payload, EncryptionMethod, Envelope, ExternalMetadata, InternalMetadata, MessageBody,
    MessageContent, MessageData, PlainContent, SealedPayload,
};
use crate::error::{EnvelopeField, MessageError};

/// Key material for one outgoing message.
#[derive(Clone)]
pub struct MessageKeys {
    pub encryption_secret: EncryptionSecretKey,
    pub signature_secret: SigningKey,
    pub receiver_public: EncryptionPublicKey,
}

impl MessageKeys {
    pub fn encryption_public(&self) -> EncryptionPublicKey {
        EncryptionPublicKey::from(&self.encryption_secret)
    }

    fn shared_secret(&self) -> Result<SharedSecret, MessageError> {
        Ok(derive_shared_secret(
            &self.encryption_secret,
            &self.receiver_public,
        )?)
    }
}

impl std::fmt::Debug for MessageKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageKeys")
            .field("encryption_public", &self.encryption_public())
            .field("receiver_public", &self.receiver_public)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing set yet.
    Fresh,
    /// Some fields set, at least one required field still missing.
    Accumulating,
    /// Every required field is set; `build()` can succeed.
    Finalizable,
}

#[derive(Debug, Clone)]
struct PendingInternal {
    sender_subidentity: String,
    recipient_subidentity: String,
    inbox: Option<InboxName>,
    encryption: EncryptionMethod,
}

#[derive(Debug, Clone)]
struct PendingExternal {
    sender: IdentityName,
    recipient: IdentityName,
    scheduled_time: DateTime<Utc>,
    other: Option<String>,
}

#[derive(Debug)]
pub struct MessageBuilder {
    keys: MessageKeys,
    body_encryption: Option<EncryptionMethod>,
    raw_content: Option<String>,
    schema: Option<MessageSchemaType>,
    internal: Option<PendingInternal>,
    external: Option<PendingExternal>,
}

/// Current time at millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

impl MessageBuilder {
    pub fn new(keys: MessageKeys) -> Self {
        Self {
            keys,
            body_encryption: None,
            raw_content: None,
            schema: None,
            internal: None,
            external: None,
        }
    }

    pub fn keys(&self) -> &MessageKeys {
        &self.keys
    }

    pub fn state(&self) -> BuilderState {
        if self.first_missing().is_none() {
            BuilderState::Finalizable
        } else if self.body_encryption.is_none()
            && self.raw_content.is_none()
            && self.schema.is_none()
            && self.internal.is_none()
            && self.external.is_none()
        {
            BuilderState::Fresh
        } else {
            BuilderState::Accumulating
        }
    }

    pub fn set_body_encryption(
        &mut self,
        method: EncryptionMethod,
    ) -> Result<&mut Self, MessageError> {
        self.body_encryption = Some(method);
        Ok(self)
    }

    /// Requires the body encryption to be chosen first.
    pub fn set_raw_content(&mut self, content: impl Into<String>) -> Result<&mut Self, MessageError> {
        if self.body_encryption.is_none() {
            return Err(MessageError::MissingPrerequisite {
                setter: "set_raw_content",
                requires: EnvelopeField::BodyEncryption,
            });
        }
        self.raw_content = Some(content.into());
        Ok(self)
    }

    pub fn set_schema(&mut self, schema: MessageSchemaType) -> Result<&mut Self, MessageError> {
        self.schema = Some(schema);
        Ok(self)
    }

    /// The inbox is derived from the external metadata at build time.
    pub fn set_internal_metadata(
        &mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        encryption: EncryptionMethod,
    ) -> Result<&mut Self, MessageError> {
        self.internal = Some(PendingInternal {
            sender_subidentity: sender_subidentity.into(),
            recipient_subidentity: recipient_subidentity.into(),
            inbox: None,
            encryption,
        });
        Ok(self)
    }

    pub fn set_internal_metadata_with_inbox(
        &mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        inbox: InboxName,
        encryption: EncryptionMethod,
    ) -> Result<&mut Self, MessageError> {
        self.set_internal_metadata(sender_subidentity, recipient_subidentity, encryption)?;
        if let Some(internal) = self.internal.as_mut() {
            internal.inbox = Some(inbox);
        }
        Ok(self)
    }

    /// Like [`Self::set_internal_metadata`], also pinning the schema and,
    /// when given, the inbox.
    pub fn set_internal_metadata_with_schema(
        &mut self,
        sender_subidentity: impl Into<String>,
        recipient_subidentity: impl Into<String>,
        inbox: Option<InboxName>,
        schema: MessageSchemaType,
        encryption: EncryptionMethod,
    ) -> Result<&mut Self, MessageError> {
        self.set_internal_metadata(sender_subidentity, recipient_subidentity, encryption)?;
        if let Some(internal) = self.internal.as_mut() {
            internal.inbox = inbox;
        }
        self.set_schema(schema)
    }

    pub fn set_external_metadata(
        &mut self,
        recipient: IdentityName,
        sender: IdentityName,
    ) -> Result<&mut Self, MessageError> {
        self.set_external_metadata_with_schedule(recipient, sender, None, now_millis())
    }

    pub fn set_external_metadata_with_other(
        &mut self,
        recipient: IdentityName,
        sender: IdentityName,
        other: impl Into<String>,
    ) -> Result<&mut Self, MessageError> {
        self.set_external_metadata_with_schedule(recipient, sender, Some(other.into()), now_millis())
    }

    /// Full form. The scheduled time is truncated to milliseconds.
    pub fn set_external_metadata_with_schedule(
        &mut self,
        recipient: IdentityName,
        sender: IdentityName,
        other: Option<String>,
        scheduled_time: DateTime<Utc>,
    ) -> Result<&mut Self, MessageError> {
        self.external = Some(PendingExternal {
            sender,
            recipient,
            scheduled_time: scheduled_time.trunc_subsecs(3),
            other,
        });
        Ok(self)
    }

    fn first_missing(&self) -> Option<EnvelopeField> {
        EnvelopeField::CHECK_ORDER.into_iter().find(|field| match field {
            EnvelopeField::BodyEncryption => self.body_encryption.is_none(),
            EnvelopeField::RawContent => self.raw_content.is_none(),
            EnvelopeField::InternalMetadata => self.internal.is_none(),
            EnvelopeField::ExternalMetadata => self.external.is_none(),
        })
    }

    /// Seal, sign and hash the accumulated message.
    pub fn build(self) -> Result<Envelope, MessageError> {
        let missing = |missing| MessageError::IncompleteEnvelope { missing };
        let body_encryption = self
            .body_encryption
            .ok_or(missing(EnvelopeField::BodyEncryption))?;
        let raw_content = self.raw_content.ok_or(missing(EnvelopeField::RawContent))?;
        let internal = self
            .internal
            .ok_or(missing(EnvelopeField::InternalMetadata))?;
        let external = self
            .external
            .ok_or(missing(EnvelopeField::ExternalMetadata))?;
        let keys = self.keys;

        let inbox = match internal.inbox {
            Some(inbox) => inbox,
            None => InboxName::from_identities(
                &external.sender,
                &internal.sender_subidentity,
                &external.recipient,
                &internal.recipient_subidentity,
                body_encryption.is_encrypted(),
            )?,
        };

        let plain = PlainContent {
            raw_content,
            schema: self.schema.unwrap_or_default(),
        };
        let content = if internal.encryption.is_encrypted() {
            let bytes = serde_json::to_vec(&plain)?;
            MessageContent::Encrypted(SealedPayload::seal(&bytes, &keys.shared_secret()?)?)
        } else {
            MessageContent::Unencrypted(plain)
        };

        let data = MessageData {
            internal_metadata: InternalMetadata {
                sender_subidentity: internal.sender_subidentity,
                recipient_subidentity: internal.recipient_subidentity,
                inbox,
                encryption: internal.encryption,
            },
            content,
        };
        let body = if body_encryption.is_encrypted() {
            let bytes = serde_json::to_vec(&data)?;
            MessageBody::Encrypted(SealedPayload::seal(&bytes, &keys.shared_secret()?)?)
        } else {
            MessageBody::Unencrypted(data)
        };

        let mut external_metadata = ExternalMetadata {
            sender: external.sender,
            recipient: external.recipient,
            scheduled_time: external.scheduled_time,
            signature: String::new(),
            other: external.other,
        };
        let payload = signing_payload(&body, &external_metadata, body_encryption)?;
        external_metadata.signature = signature_to_string(&sign(&payload, &keys.signature_secret));

        let envelope = Envelope::assemble(body, external_metadata, body_encryption)?;
        tracing::debug!(
            sender = %envelope.sender(),
            recipient = %envelope.recipient(),
            encryption = %body_encryption,
            hash = %envelope.hash(),
            "built envelope"
        );
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EncryptionStatus;
    use sealpost_crypto::agreement::unsafe_deterministic_encryption_keypair;
    use sealpost_crypto::signing::unsafe_deterministic_signature_keypair;
    use sealpost_crypto::CryptoError;

    fn alice() -> IdentityName {
        IdentityName::parse("@@alice.sealpost/main").unwrap()
    }

    fn bob() -> IdentityName {
        IdentityName::parse("@@bob.sealpost/main").unwrap()
    }

    fn alice_keys_to_bob() -> MessageKeys {
        let (encryption_secret, _) = unsafe_deterministic_encryption_keypair(0);
        let (signature_secret, _) = unsafe_deterministic_signature_keypair(0);
        let (_, receiver_public) = unsafe_deterministic_encryption_keypair(1);
        MessageKeys {
            encryption_secret,
            signature_secret,
            receiver_public,
        }
    }

    fn ready_builder(body: EncryptionMethod, content: EncryptionMethod) -> MessageBuilder {
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(body)
            .unwrap()
            .set_raw_content("hi bob")
            .unwrap()
            .set_internal_metadata("", "", content)
            .unwrap()
            .set_external_metadata(bob(), alice())
            .unwrap();
        builder
    }

    #[test]
    fn raw_content_before_encryption_is_missing_prerequisite() {
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        let err = builder.set_raw_content("too early").unwrap_err();
        assert!(matches!(
            err,
            MessageError::MissingPrerequisite {
                setter: "set_raw_content",
                requires: EnvelopeField::BodyEncryption,
            }
        ));
        assert_eq!(builder.state(), BuilderState::Fresh);
    }

    #[test]
    fn state_transitions() {
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        assert_eq!(builder.state(), BuilderState::Fresh);
        builder.set_schema(MessageSchemaType::TextContent).unwrap();
        assert_eq!(builder.state(), BuilderState::Accumulating);
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_internal_metadata("", "", EncryptionMethod::None)
            .unwrap();
        assert_eq!(builder.state(), BuilderState::Accumulating);
        builder.set_external_metadata(bob(), alice()).unwrap();
        assert_eq!(builder.state(), BuilderState::Finalizable);
    }

    #[test]
    fn missing_fields_are_reported_in_fixed_order() {
        let builder = MessageBuilder::new(alice_keys_to_bob());
        assert!(matches!(
            builder.build(),
            Err(MessageError::IncompleteEnvelope {
                missing: EnvelopeField::BodyEncryption
            })
        ));

        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_external_metadata(bob(), alice())
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(MessageError::IncompleteEnvelope {
                missing: EnvelopeField::RawContent
            })
        ));

        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_external_metadata(bob(), alice())
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(MessageError::IncompleteEnvelope {
                missing: EnvelopeField::InternalMetadata
            })
        ));
    }

    #[test]
    fn missing_external_metadata_is_named() {
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_internal_metadata("", "", EncryptionMethod::None)
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(MessageError::IncompleteEnvelope {
                missing: EnvelopeField::ExternalMetadata
            })
        ));
    }

    #[test]
    fn schema_defaults_to_empty() {
        let envelope = ready_builder(EncryptionMethod::None, EncryptionMethod::None)
            .build()
            .unwrap();
        let plain = envelope.message_data().unwrap().plain_content().unwrap();
        assert_eq!(plain.schema, MessageSchemaType::Empty);
    }

    #[test]
    fn derived_inbox_tracks_body_encryption() {
        let plain = ready_builder(EncryptionMethod::None, EncryptionMethod::None)
            .build()
            .unwrap();
        assert!(!plain.inbox().unwrap().is_end_to_end());

        let (bob_sk, _) = unsafe_deterministic_encryption_keypair(1);
        let (_, alice_pk) = unsafe_deterministic_encryption_keypair(0);
        let sealed = ready_builder(
            EncryptionMethod::DiffieHellmanChaChaPoly1305,
            EncryptionMethod::None,
        )
        .build()
        .unwrap();
        let data = sealed.open_body(&bob_sk, &alice_pk).unwrap();
        assert!(data.internal_metadata.inbox.is_end_to_end());
    }

    #[test]
    fn pinned_inbox_is_kept() {
        let inbox = InboxName::from_job_id("jobid_42").unwrap();
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_internal_metadata_with_inbox("", "", inbox.clone(), EncryptionMethod::None)
            .unwrap()
            .set_external_metadata(bob(), alice())
            .unwrap();
        assert_eq!(builder.build().unwrap().inbox(), Some(&inbox));
    }

    #[test]
    fn foreign_node_subidentity_fails_build() {
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_internal_metadata("@@mallory.sealpost/main", "", EncryptionMethod::None)
            .unwrap()
            .set_external_metadata(bob(), alice())
            .unwrap();
        assert!(matches!(builder.build(), Err(MessageError::Name(_))));
    }

    #[test]
    fn body_encrypted_round_trip() {
        let envelope = ready_builder(
            EncryptionMethod::DiffieHellmanChaChaPoly1305,
            EncryptionMethod::None,
        )
        .build()
        .unwrap();
        assert_eq!(envelope.encryption_status(), EncryptionStatus::BodyEncrypted);
        assert_eq!(envelope.raw_content(), None);
        assert_eq!(envelope.encryption().ordinal(), 0);

        let (bob_sk, _) = unsafe_deterministic_encryption_keypair(1);
        let (_, alice_pk) = unsafe_deterministic_encryption_keypair(0);
        let data = envelope.open_body(&bob_sk, &alice_pk).unwrap();
        assert_eq!(data.plain_content().unwrap().raw_content, "hi bob");
    }

    #[test]
    fn content_encrypted_round_trip() {
        let envelope = ready_builder(
            EncryptionMethod::None,
            EncryptionMethod::DiffieHellmanChaChaPoly1305,
        )
        .build()
        .unwrap();
        assert_eq!(envelope.encryption_status(), EncryptionStatus::ContentEncrypted);
        assert!(envelope.inbox().is_some());
        assert_eq!(envelope.raw_content(), None);

        let (bob_sk, _) = unsafe_deterministic_encryption_keypair(1);
        let (_, alice_pk) = unsafe_deterministic_encryption_keypair(0);
        let data = envelope.message_data().unwrap();
        assert_eq!(data.open_content(&bob_sk, &alice_pk).unwrap().raw_content, "hi bob");
    }

    #[test]
    fn wrong_key_cannot_open_body() {
        let envelope = ready_builder(
            EncryptionMethod::DiffieHellmanChaChaPoly1305,
            EncryptionMethod::None,
        )
        .build()
        .unwrap();
        let (eve_sk, _) = unsafe_deterministic_encryption_keypair(9);
        let (_, alice_pk) = unsafe_deterministic_encryption_keypair(0);
        assert!(matches!(
            envelope.open_body(&eve_sk, &alice_pk),
            Err(MessageError::Crypto(CryptoError::DecryptionFailed))
        ));
    }

    #[test]
    fn signature_verifies_with_sender_key_only() {
        let envelope = ready_builder(EncryptionMethod::None, EncryptionMethod::None)
            .build()
            .unwrap();
        let (_, alice_vk) = unsafe_deterministic_signature_keypair(0);
        let (_, bob_vk) = unsafe_deterministic_signature_keypair(1);
        assert!(envelope.verify_signature(&alice_vk));
        assert!(!envelope.verify_signature(&bob_vk));
    }

    #[test]
    fn other_and_schedule_are_carried() {
        let when = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut builder = MessageBuilder::new(alice_keys_to_bob());
        builder
            .set_body_encryption(EncryptionMethod::None)
            .unwrap()
            .set_raw_content("x")
            .unwrap()
            .set_internal_metadata("", "", EncryptionMethod::None)
            .unwrap()
            .set_external_metadata_with_schedule(bob(), alice(), Some("note".into()), when)
            .unwrap();
        let envelope = builder.build().unwrap();
        assert_eq!(envelope.external_metadata().other.as_deref(), Some("note"));
        assert_eq!(
            envelope.scheduled_time().to_rfc3339(),
            "2024-05-06T07:08:09.123+00:00"
        );
    }

    #[test]
    fn keys_debug_hides_secrets() {
        let keys = alice_keys_to_bob();
        let rendered = format!("{keys:?}");
        assert!(rendered.contains("MessageKeys"));
        assert!(!rendered.contains("signature_secret"));
    }
}

//! The signed message envelope and its canonical wire form.
//!
//! On the wire an envelope is compact JSON with a fixed field order:
//!
//! ```text
//! {"body":{...},"external_metadata":{...},"encryption":1}
//! ```
//!
//! `encryption` is the ordinal of [`EncryptionMethod`]. Decoding only accepts
//! bytes that re-encode identically, so every envelope has exactly one wire
//! form, and that form is what gets signed and hashed.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use sealpost_crypto::signing::{string_to_signature, VerifyingKey};
use sealpost_crypto::{
    content_hash, decrypt, derive_shared_secret, encrypt, verify, ContentHash, CryptoError,
    EncryptionPublicKey, EncryptionSecretKey, SharedSecret,
};
use sealpost_shared::api::MessageSchemaType;
use sealpost_shared::{IdentityName, InboxName};

use crate::error::MessageError;

/// Prefix of every sealed (encrypted) payload string.
pub const ENCRYPTED_PREFIX: &str = "encrypted:";

/// How a layer of the envelope is protected. Travels as its ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EncryptionMethod {
    /// X25519 agreement, HKDF-SHA256, ChaCha20-Poly1305.
    DiffieHellmanChaChaPoly1305,
    None,
}

impl EncryptionMethod {
    pub fn ordinal(self) -> u8 {
        match self {
            EncryptionMethod::DiffieHellmanChaChaPoly1305 => 0,
            EncryptionMethod::None => 1,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Result<Self, MessageError> {
        match ordinal {
            0 => Ok(EncryptionMethod::DiffieHellmanChaChaPoly1305),
            1 => Ok(EncryptionMethod::None),
            other => Err(MessageError::InvalidPayload(format!(
                "unknown encryption ordinal {other}"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EncryptionMethod::DiffieHellmanChaChaPoly1305 => "DiffieHellmanChaChaPoly1305",
            EncryptionMethod::None => "None",
        }
    }

    pub fn is_encrypted(self) -> bool {
        self != EncryptionMethod::None
    }
}

impl From<EncryptionMethod> for u8 {
    fn from(method: EncryptionMethod) -> Self {
        method.ordinal()
    }
}

impl TryFrom<u8> for EncryptionMethod {
    type Error = MessageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(value)
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EncryptionMethod {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DiffieHellmanChaChaPoly1305" | "default" => {
                Ok(EncryptionMethod::DiffieHellmanChaChaPoly1305)
            }
            "None" | "none" => Ok(EncryptionMethod::None),
            other => Err(MessageError::InvalidPayload(format!(
                "unknown encryption method {other}"
            ))),
        }
    }
}

/// Which layer of an envelope is currently sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionStatus {
    NotCurrentlyEncrypted,
    BodyEncrypted,
    ContentEncrypted,
}

/// An encrypted layer: `encrypted:` followed by base64 of `nonce || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SealedPayload {
    pub content: String,
}

impl SealedPayload {
    pub(crate) fn seal(plaintext: &[u8], secret: &SharedSecret) -> Result<Self, MessageError> {
        let data = encrypt(plaintext, secret)?;
        Ok(Self {
            content: format!(
                "{ENCRYPTED_PREFIX}{}",
                base64::engine::general_purpose::STANDARD.encode(data)
            ),
        })
    }

    /// Every failure is reported as [`CryptoError::DecryptionFailed`].
    pub(crate) fn open(&self, secret: &SharedSecret) -> Result<Vec<u8>, MessageError> {
        let encoded = self
            .content
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or(CryptoError::DecryptionFailed)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        decrypt(&data, secret).map_err(|e| {
            tracing::warn!("failed to open sealed payload");
            MessageError::Crypto(e)
        })
    }
}

/// Readable content of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainContent {
    pub raw_content: String,
    pub schema: MessageSchemaType,
}

impl PlainContent {
    /// Decode the raw content as the JSON payload its schema announces.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, MessageError> {
        serde_json::from_str(&self.raw_content)
            .map_err(|e| MessageError::InvalidPayload(format!("{}: {e}", self.schema)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContent {
    Unencrypted(PlainContent),
    Encrypted(SealedPayload),
}

/// Routing data only the recipient node gets to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InternalMetadata {
    pub sender_subidentity: String,
    pub recipient_subidentity: String,
    pub inbox: InboxName,
    /// Protection of the content layer.
    pub encryption: EncryptionMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageData {
    pub internal_metadata: InternalMetadata,
    pub content: MessageContent,
}

impl MessageData {
    /// Content in the clear, if the content layer is not sealed.
    pub fn plain_content(&self) -> Option<&PlainContent> {
        match &self.content {
            MessageContent::Unencrypted(plain) => Some(plain),
            MessageContent::Encrypted(_) => None,
        }
    }

    /// Open the content layer. Unsealed content is returned as is.
    pub fn open_content(
        &self,
        my_secret: &EncryptionSecretKey,
        their_public: &EncryptionPublicKey,
    ) -> Result<PlainContent, MessageError> {
        match &self.content {
            MessageContent::Unencrypted(plain) => Ok(plain.clone()),
            MessageContent::Encrypted(sealed) => {
                let secret = derive_shared_secret(my_secret, their_public)?;
                let bytes = sealed.open(&secret)?;
                Ok(serde_json::from_slice(&bytes)?)
            }
        }
    }

    fn check_consistency(&self) -> Result<(), MessageError> {
        let sealed = matches!(self.content, MessageContent::Encrypted(_));
        if sealed != self.internal_metadata.encryption.is_encrypted() {
            return Err(MessageError::InvalidPayload(
                "content layer does not match its encryption method".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBody {
    Unencrypted(MessageData),
    Encrypted(SealedPayload),
}

/// Routing data visible to every relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalMetadata {
    pub sender: IdentityName,
    pub recipient: IdentityName,
    pub scheduled_time: DateTime<Utc>,
    /// Base64 Ed25519 signature over the envelope with this field blanked.
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Serialize)]
struct WireRef<'a> {
    body: &'a MessageBody,
    external_metadata: &'a ExternalMetadata,
    encryption: EncryptionMethod,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEnvelope {
    body: MessageBody,
    external_metadata: ExternalMetadata,
    encryption: EncryptionMethod,
}

fn encode_wire(
    body: &MessageBody,
    external_metadata: &ExternalMetadata,
    encryption: EncryptionMethod,
) -> Result<Vec<u8>, MessageError> {
    Ok(serde_json::to_vec(&WireRef {
        body,
        external_metadata,
        encryption,
    })?)
}

/// Bytes covered by the signature: the wire form with an empty signature.
pub(crate) fn signing_payload(
    body: &MessageBody,
    external_metadata: &ExternalMetadata,
    encryption: EncryptionMethod,
) -> Result<Vec<u8>, MessageError> {
    let mut unsigned = external_metadata.clone();
    unsigned.signature.clear();
    encode_wire(body, &unsigned, encryption)
}

/// An immutable, signed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    body: MessageBody,
    external_metadata: ExternalMetadata,
    encryption: EncryptionMethod,
    hash: ContentHash,
}

impl Envelope {
    /// Assemble an envelope from parts, checking the layers agree with the
    /// declared methods.
    pub(crate) fn assemble(
        body: MessageBody,
        external_metadata: ExternalMetadata,
        encryption: EncryptionMethod,
    ) -> Result<Self, MessageError> {
        match (&body, encryption.is_encrypted()) {
            (MessageBody::Encrypted(_), true) => {}
            (MessageBody::Unencrypted(data), false) => data.check_consistency()?,
            _ => {
                return Err(MessageError::InvalidPayload(
                    "body does not match its encryption method".into(),
                ))
            }
        }
        let hash = content_hash(&encode_wire(&body, &external_metadata, encryption)?);
        Ok(Self {
            body,
            external_metadata,
            encryption,
            hash,
        })
    }

    /// Decode canonical wire bytes.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, MessageError> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.to_wire()? != bytes {
            return Err(MessageError::NonCanonical);
        }
        Ok(envelope)
    }

    pub fn from_wire_str(s: &str) -> Result<Self, MessageError> {
        Self::from_wire(s.as_bytes())
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, MessageError> {
        encode_wire(&self.body, &self.external_metadata, self.encryption)
    }

    pub fn to_wire_string(&self) -> Result<String, MessageError> {
        let bytes = self.to_wire()?;
        String::from_utf8(bytes).map_err(|e| MessageError::Serialization(e.to_string()))
    }

    pub fn signing_bytes(&self) -> Result<Vec<u8>, MessageError> {
        signing_payload(&self.body, &self.external_metadata, self.encryption)
    }

    /// Check the signature against the sender's public key.
    pub fn verify_signature(&self, public_key: &VerifyingKey) -> bool {
        let Ok(signature) = string_to_signature(&self.external_metadata.signature) else {
            tracing::warn!(sender = %self.external_metadata.sender, "malformed envelope signature");
            return false;
        };
        let Ok(payload) = self.signing_bytes() else {
            return false;
        };
        let ok = verify(&payload, &signature, public_key);
        if !ok {
            tracing::warn!(sender = %self.external_metadata.sender, "envelope signature rejected");
        }
        ok
    }

    /// Decode `bytes` and check the signature in one step. Any decoding
    /// problem counts as a failed verification.
    pub fn verify_wire(bytes: &[u8], public_key: &VerifyingKey) -> bool {
        match Self::from_wire(bytes) {
            Ok(envelope) => envelope.verify_signature(public_key),
            Err(e) => {
                tracing::warn!(error = %e, "envelope rejected before verification");
                false
            }
        }
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn external_metadata(&self) -> &ExternalMetadata {
        &self.external_metadata
    }

    pub fn encryption(&self) -> EncryptionMethod {
        self.encryption
    }

    /// SHA-256 of the canonical wire bytes.
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    pub fn sender(&self) -> &IdentityName {
        &self.external_metadata.sender
    }

    pub fn recipient(&self) -> &IdentityName {
        &self.external_metadata.recipient
    }

    pub fn signature(&self) -> &str {
        &self.external_metadata.signature
    }

    pub fn scheduled_time(&self) -> DateTime<Utc> {
        self.external_metadata.scheduled_time
    }

    pub fn encryption_status(&self) -> EncryptionStatus {
        match &self.body {
            MessageBody::Encrypted(_) => EncryptionStatus::BodyEncrypted,
            MessageBody::Unencrypted(data) => match data.content {
                MessageContent::Encrypted(_) => EncryptionStatus::ContentEncrypted,
                MessageContent::Unencrypted(_) => EncryptionStatus::NotCurrentlyEncrypted,
            },
        }
    }

    /// Message data, if the body is not sealed.
    pub fn message_data(&self) -> Option<&MessageData> {
        match &self.body {
            MessageBody::Unencrypted(data) => Some(data),
            MessageBody::Encrypted(_) => None,
        }
    }

    pub fn internal_metadata(&self) -> Option<&InternalMetadata> {
        self.message_data().map(|data| &data.internal_metadata)
    }

    pub fn inbox(&self) -> Option<&InboxName> {
        self.internal_metadata().map(|meta| &meta.inbox)
    }

    /// Raw content, if neither layer is sealed.
    pub fn raw_content(&self) -> Option<&str> {
        self.message_data()
            .and_then(MessageData::plain_content)
            .map(|plain| plain.raw_content.as_str())
    }

    /// Open the body layer with the recipient's secret and the sender's
    /// public encryption key.
    pub fn open_body(
        &self,
        my_secret: &EncryptionSecretKey,
        sender_public: &EncryptionPublicKey,
    ) -> Result<MessageData, MessageError> {
        match &self.body {
            MessageBody::Unencrypted(data) => Ok(data.clone()),
            MessageBody::Encrypted(sealed) => {
                let secret = derive_shared_secret(my_secret, sender_public)?;
                let bytes = sealed.open(&secret)?;
                let data: MessageData = serde_json::from_slice(&bytes)?;
                data.check_consistency()?;
                tracing::debug!(sender = %self.external_metadata.sender, "opened envelope body");
                Ok(data)
            }
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRef {
            body: &self.body,
            external_metadata: &self.external_metadata,
            encryption: self.encryption,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEnvelope::deserialize(deserializer)?;
        Envelope::assemble(wire.body, wire.external_metadata, wire.encryption)
            .map_err(serde::de::Error::custom)
    }
}

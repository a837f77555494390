//! Command implementations. Each returns the text to print.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sealpost_crypto::agreement::{
    encryption_public_key_to_string, encryption_secret_key_to_string, ephemeral_encryption_keys,
    string_to_encryption_public_key, unsafe_deterministic_encryption_keypair,
};
use sealpost_crypto::signing::{
    ephemeral_signature_keys, signature_public_key_to_string, signature_secret_key_to_string,
    string_to_signature_public_key, unsafe_deterministic_signature_keypair,
};
use sealpost_crypto::EncryptionPublicKey;
use sealpost_message::recipes::ping_pong_message;
use sealpost_message::{EncryptionStatus, Envelope, MessageKeys};
use sealpost_shared::api::control::PingPong;
use sealpost_shared::{IdentityName, InboxName};

use crate::config::CliConfig;
use crate::error::CliError;

/// A full set of key strings for one identity.
#[derive(Debug, Serialize)]
pub struct KeygenOutput {
    pub encryption_secret_key: String,
    pub encryption_public_key: String,
    pub identity_secret_key: String,
    pub identity_public_key: String,
}

/// Generate keys. A seed gives reproducible test keys.
pub fn keygen(seed: Option<u32>) -> Result<String, CliError> {
    let ((enc_sk, enc_pk), (sig_sk, sig_pk)) = match seed {
        Some(n) => {
            tracing::warn!(seed = n, "generating deterministic keys; not for real use");
            (
                unsafe_deterministic_encryption_keypair(n),
                unsafe_deterministic_signature_keypair(n),
            )
        }
        None => (ephemeral_encryption_keys(), ephemeral_signature_keys()),
    };
    let output = KeygenOutput {
        encryption_secret_key: encryption_secret_key_to_string(&enc_sk),
        encryption_public_key: encryption_public_key_to_string(&enc_pk),
        identity_secret_key: signature_secret_key_to_string(&sig_sk),
        identity_public_key: signature_public_key_to_string(&sig_pk),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Canonical inbox string for two identities.
pub fn inbox(a: &str, b: &str, end_to_end: bool) -> Result<String, CliError> {
    let a = IdentityName::parse(a)?;
    let b = IdentityName::parse(b)?;
    Ok(InboxName::from_identities(&a, "", &b, "", end_to_end)?.to_canonical_string())
}

/// Build a signed ping (or pong) from the configured identity.
pub fn ping(
    config: &CliConfig,
    receiver: &str,
    receiver_encryption_pk: &str,
    pong: bool,
) -> Result<String, CliError> {
    let sender = config.identity()?;
    let receiver = IdentityName::parse(receiver)?;
    let receiver_public: EncryptionPublicKey =
        string_to_encryption_public_key(receiver_encryption_pk)?;
    let local = config.local_keys()?;
    let keys = MessageKeys {
        encryption_secret: local.encryption_secret,
        signature_secret: local.signature_secret,
        receiver_public,
    };
    let kind = if pong { PingPong::Pong } else { PingPong::Ping };
    let envelope = ping_pong_message(keys, kind, sender, receiver)?;
    tracing::info!(hash = %envelope.hash(), "built {}", kind.as_str());
    Ok(envelope.to_wire_string()?)
}

/// Readable summary of an envelope's visible parts.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub sender: String,
    pub recipient: String,
    pub scheduled_time: DateTime<Utc>,
    pub encryption: &'static str,
    pub status: &'static str,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

fn status_name(status: EncryptionStatus) -> &'static str {
    match status {
        EncryptionStatus::NotCurrentlyEncrypted => "not encrypted",
        EncryptionStatus::BodyEncrypted => "body encrypted",
        EncryptionStatus::ContentEncrypted => "content encrypted",
    }
}

pub fn inspect(wire: &str) -> Result<String, CliError> {
    let envelope = Envelope::from_wire_str(wire.trim_end())?;
    let plain = envelope.message_data().and_then(|data| data.plain_content());
    let report = InspectReport {
        sender: envelope.sender().to_canonical_string(),
        recipient: envelope.recipient().to_canonical_string(),
        scheduled_time: envelope.scheduled_time(),
        encryption: envelope.encryption().as_str(),
        status: status_name(envelope.encryption_status()),
        hash: envelope.hash().to_hex(),
        inbox: envelope.inbox().map(InboxName::to_canonical_string),
        schema: plain.map(|p| p.schema.to_string()),
        raw_content: plain.map(|p| p.raw_content.clone()),
        other: envelope.external_metadata().other.clone(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// `"valid"` or `"invalid"`.
pub fn verify(wire: &str, sender_identity_pk: &str) -> Result<String, CliError> {
    let public_key = string_to_signature_public_key(sender_identity_pk)?;
    let valid = Envelope::verify_wire(wire.trim_end().as_bytes(), &public_key);
    Ok(if valid { "valid" } else { "invalid" }.to_string())
}

//! Fixed envelope recipes.
//!
//! Each recipe is a plain value describing one kind of message. Applying it
//! runs a fixed sequence of builder setters; [`build_from`] pairs a recipe
//! with the sender's keys and builds. The free functions at the bottom are
//! shorthands for the common cases.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sealpost_crypto::agreement::encryption_public_key_to_string;
use sealpost_crypto::signing::signature_public_key_to_string;
use sealpost_crypto::{EncryptionPublicKey, VerifyingKey};
use sealpost_shared::api::control::{ErrorPayload, PingPong, ACK_CONTENT, TERMINATE_CONTENT};
use sealpost_shared::api::inbox::{ApiGetMessagesFromInboxRequest, ApiReadUpToTimeRequest};
use sealpost_shared::api::job::{JobCreation, JobMessage, JobScope};
use sealpost_shared::api::registration::{
    IdentityPermissions, IdentityType, RegistrationCode, RegistrationCodeRequest,
    RegistrationCodeType,
};
use sealpost_shared::api::MessageSchemaType;
use sealpost_shared::{IdentityName, InboxName};

use crate::builder::{MessageBuilder, MessageKeys};
use crate::envelope::{EncryptionMethod, Envelope};
use crate::error::MessageError;

/// A fixed combination of builder setters.
pub trait Recipe {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError>;
}

/// Build one envelope from `recipe`, signed and sealed with `keys`.
pub fn build_from<R: Recipe + ?Sized>(recipe: &R, keys: MessageKeys) -> Result<Envelope, MessageError> {
    let mut builder = MessageBuilder::new(keys);
    recipe.apply(&mut builder)?;
    builder.build()
}

fn to_payload<T: Serialize>(value: &T) -> Result<String, MessageError> {
    Ok(serde_json::to_string(value)?)
}

/// Unencrypted peer-to-peer control message with a fixed content string.
fn apply_control(
    builder: &mut MessageBuilder,
    content: &str,
    sender: &IdentityName,
    receiver: &IdentityName,
) -> Result<(), MessageError> {
    builder
        .set_body_encryption(EncryptionMethod::None)?
        .set_raw_content(content)?
        .set_internal_metadata("", "", EncryptionMethod::None)?
        .set_external_metadata(receiver.clone(), sender.clone())?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub sender: IdentityName,
    pub receiver: IdentityName,
}

impl Recipe for Ack {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        apply_control(builder, ACK_CONTENT, &self.sender, &self.receiver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingPongMessage {
    pub kind: PingPong,
    pub sender: IdentityName,
    pub receiver: IdentityName,
}

impl Recipe for PingPongMessage {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        apply_control(builder, self.kind.as_str(), &self.sender, &self.receiver)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminate {
    pub sender: IdentityName,
    pub receiver: IdentityName,
}

impl Recipe for Terminate {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        apply_control(builder, TERMINATE_CONTENT, &self.sender, &self.receiver)
    }
}

/// Error notice. The content layer is sealed for the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub sender: IdentityName,
    pub receiver: IdentityName,
    pub error: String,
}

impl Recipe for ErrorNotice {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        let payload = to_payload(&ErrorPayload {
            error: self.error.clone(),
        })?;
        builder
            .set_body_encryption(EncryptionMethod::None)?
            .set_raw_content(payload)?
            .set_internal_metadata("", "", EncryptionMethod::DiffieHellmanChaChaPoly1305)?
            .set_external_metadata(self.receiver.clone(), self.sender.clone())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCreationRequest {
    pub scope: JobScope,
    pub sender: IdentityName,
    pub receiver: IdentityName,
    /// Agent or device that should run the job.
    pub receiver_subidentity: String,
}

impl Recipe for JobCreationRequest {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        let payload = to_payload(&JobCreation {
            scope: self.scope.clone(),
        })?;
        builder
            .set_body_encryption(EncryptionMethod::None)?
            .set_raw_content(payload)?
            .set_internal_metadata_with_schema(
                "",
                self.receiver_subidentity.as_str(),
                None,
                MessageSchemaType::JobCreationSchema,
                EncryptionMethod::None,
            )?
            .set_external_metadata(self.receiver.clone(), self.sender.clone())?;
        Ok(())
    }
}

/// A message posted into a job's inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMessagePost {
    pub job_id: String,
    pub content: String,
    pub files_inbox: Option<InboxName>,
    pub sender: IdentityName,
    pub receiver: IdentityName,
    pub receiver_subidentity: String,
}

impl Recipe for JobMessagePost {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        let inbox = InboxName::from_job_id(self.job_id.as_str())?;
        let payload = to_payload(&JobMessage {
            job_id: self.job_id.clone(),
            content: self.content.clone(),
            files_inbox: self.files_inbox.clone(),
        })?;
        builder
            .set_body_encryption(EncryptionMethod::None)?
            .set_raw_content(payload)?
            .set_internal_metadata_with_schema(
                "",
                self.receiver_subidentity.as_str(),
                Some(inbox),
                MessageSchemaType::JobMessageSchema,
                EncryptionMethod::None,
            )?
            .set_external_metadata(self.receiver.clone(), self.sender.clone())?;
        Ok(())
    }
}

/// A request from one of a node's profiles to the node itself.
///
/// The node appears as both sender and recipient; the profile rides in the
/// internal sender sub-identity. The body is sealed for the node and the
/// sender's encryption public key travels in `other` so the node can answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRequest {
    pub node: IdentityName,
    pub sender_profile: String,
    pub schema: MessageSchemaType,
    pub payload: String,
}

impl NodeRequest {
    pub fn new<T: Serialize>(
        node: IdentityName,
        sender_profile: impl Into<String>,
        schema: MessageSchemaType,
        payload: &T,
    ) -> Result<Self, MessageError> {
        Ok(Self {
            node,
            sender_profile: sender_profile.into(),
            schema,
            payload: to_payload(payload)?,
        })
    }
}

impl Recipe for NodeRequest {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        let other = encryption_public_key_to_string(&builder.keys().encryption_public());
        builder
            .set_body_encryption(EncryptionMethod::DiffieHellmanChaChaPoly1305)?
            .set_raw_content(self.payload.as_str())?
            .set_external_metadata_with_other(self.node.clone(), self.node.clone(), other)?
            .set_internal_metadata_with_schema(
                self.sender_profile.as_str(),
                "",
                None,
                self.schema,
                EncryptionMethod::None,
            )?;
        Ok(())
    }
}

/// Details of a registration code being redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRedemption {
    pub code: String,
    pub registration_name: String,
    pub permission_type: IdentityPermissions,
    pub profile_identity_public: VerifyingKey,
    pub profile_encryption_public: EncryptionPublicKey,
}

/// Redeem a code for a profile, or for the sending device when `for_device`
/// is set. Device keys are taken from the builder's own keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseRegistrationCode {
    pub redemption: CodeRedemption,
    pub for_device: bool,
    pub sender_profile: String,
    pub node: IdentityName,
}

impl Recipe for UseRegistrationCode {
    fn apply(&self, builder: &mut MessageBuilder) -> Result<(), MessageError> {
        let redemption = &self.redemption;
        let (identity_type, device_identity_pk, device_encryption_pk) = if self.for_device {
            let keys = builder.keys();
            (
                IdentityType::Device,
                Some(signature_public_key_to_string(&keys.signature_secret.verifying_key())),
                Some(encryption_public_key_to_string(&keys.encryption_public())),
            )
        } else {
            (IdentityType::Profile, None, None)
        };
        let code = RegistrationCode {
            code: redemption.code.clone(),
            registration_name: redemption.registration_name.clone(),
            identity_type,
            permission_type: redemption.permission_type,
            profile_identity_pk: signature_public_key_to_string(&redemption.profile_identity_public),
            profile_encryption_pk: encryption_public_key_to_string(
                &redemption.profile_encryption_public,
            ),
            device_identity_pk,
            device_encryption_pk,
        };
        NodeRequest::new(
            self.node.clone(),
            self.sender_profile.as_str(),
            MessageSchemaType::UseRegistrationCode,
            &code,
        )?
        .apply(builder)
    }
}

pub fn ack_message(
    keys: MessageKeys,
    sender: IdentityName,
    receiver: IdentityName,
) -> Result<Envelope, MessageError> {
    build_from(&Ack { sender, receiver }, keys)
}

pub fn ping_pong_message(
    keys: MessageKeys,
    kind: PingPong,
    sender: IdentityName,
    receiver: IdentityName,
) -> Result<Envelope, MessageError> {
    build_from(
        &PingPongMessage {
            kind,
            sender,
            receiver,
        },
        keys,
    )
}

pub fn terminate_message(
    keys: MessageKeys,
    sender: IdentityName,
    receiver: IdentityName,
) -> Result<Envelope, MessageError> {
    build_from(&Terminate { sender, receiver }, keys)
}

pub fn error_message(
    keys: MessageKeys,
    sender: IdentityName,
    receiver: IdentityName,
    error: impl Into<String>,
) -> Result<Envelope, MessageError> {
    build_from(
        &ErrorNotice {
            sender,
            receiver,
            error: error.into(),
        },
        keys,
    )
}

pub fn job_creation(
    keys: MessageKeys,
    scope: JobScope,
    sender: IdentityName,
    receiver: IdentityName,
    receiver_subidentity: impl Into<String>,
) -> Result<Envelope, MessageError> {
    build_from(
        &JobCreationRequest {
            scope,
            sender,
            receiver,
            receiver_subidentity: receiver_subidentity.into(),
        },
        keys,
    )
}

pub fn job_message(
    keys: MessageKeys,
    job_id: impl Into<String>,
    content: impl Into<String>,
    files_inbox: Option<InboxName>,
    sender: IdentityName,
    receiver: IdentityName,
    receiver_subidentity: impl Into<String>,
) -> Result<Envelope, MessageError> {
    build_from(
        &JobMessagePost {
            job_id: job_id.into(),
            content: content.into(),
            files_inbox,
            sender,
            receiver,
            receiver_subidentity: receiver_subidentity.into(),
        },
        keys,
    )
}

pub fn read_up_to_time(
    keys: MessageKeys,
    inbox: InboxName,
    up_to_time: DateTime<Utc>,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    let request = ApiReadUpToTimeRequest {
        inbox_name: inbox,
        up_to_time,
    };
    let recipe = NodeRequest::new(
        node,
        sender_profile,
        MessageSchemaType::ApiReadUpToTimeRequest,
        &request,
    )?;
    build_from(&recipe, keys)
}

pub fn request_code_registration(
    keys: MessageKeys,
    permissions: IdentityPermissions,
    code_type: RegistrationCodeType,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    let request = RegistrationCodeRequest {
        permissions,
        code_type,
    };
    let recipe = NodeRequest::new(
        node,
        sender_profile,
        MessageSchemaType::CreateRegistrationCode,
        &request,
    )?;
    build_from(&recipe, keys)
}

pub fn use_code_registration_for_profile(
    keys: MessageKeys,
    redemption: CodeRedemption,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    build_from(
        &UseRegistrationCode {
            redemption,
            for_device: false,
            sender_profile: sender_profile.to_string(),
            node,
        },
        keys,
    )
}

pub fn use_code_registration_for_device(
    keys: MessageKeys,
    redemption: CodeRedemption,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    build_from(
        &UseRegistrationCode {
            redemption,
            for_device: true,
            sender_profile: sender_profile.to_string(),
            node,
        },
        keys,
    )
}

fn inbox_page_request(
    keys: MessageKeys,
    schema: MessageSchemaType,
    inbox: InboxName,
    count: usize,
    offset: Option<String>,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    let request = ApiGetMessagesFromInboxRequest {
        inbox,
        count,
        offset,
    };
    build_from(&NodeRequest::new(node, sender_profile, schema, &request)?, keys)
}

pub fn get_last_messages_from_inbox(
    keys: MessageKeys,
    inbox: InboxName,
    count: usize,
    offset: Option<String>,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    inbox_page_request(
        keys,
        MessageSchemaType::ApiGetMessagesFromInboxRequest,
        inbox,
        count,
        offset,
        sender_profile,
        node,
    )
}

pub fn get_last_unread_messages_from_inbox(
    keys: MessageKeys,
    inbox: InboxName,
    count: usize,
    offset: Option<String>,
    sender_profile: &str,
    node: IdentityName,
) -> Result<Envelope, MessageError> {
    inbox_page_request(
        keys,
        MessageSchemaType::ApiGetLastUnreadMessagesFromInboxRequest,
        inbox,
        count,
        offset,
        sender_profile,
        node,
    )
}

use serde::{Deserialize, Serialize};

/// Permission level requested for a registered identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPermissions {
    Admin,
    Standard,
    None,
}

/// What a registration code will register once redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationCodeType {
    /// A device under the named profile.
    Device(String),
    Profile,
}

/// Kind of identity being registered with a redeemed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityType {
    Profile,
    Device,
}

/// Payload asking a node to issue a registration code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCodeRequest {
    pub permissions: IdentityPermissions,
    pub code_type: RegistrationCodeType,
}

/// Payload redeeming a previously issued code.
///
/// Public keys are base64 strings. Device keys are absent when a profile is
/// being registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCode {
    pub code: String,
    pub registration_name: String,
    pub identity_type: IdentityType,
    pub permission_type: IdentityPermissions,
    pub profile_identity_pk: String,
    pub profile_encryption_pk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_identity_pk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_encryption_pk: Option<String>,
}

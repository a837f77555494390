use std::path::Path;

use serde::Deserialize;

use sealpost_crypto::agreement::{ephemeral_encryption_keys, string_to_encryption_secret_key};
use sealpost_crypto::signing::{ephemeral_signature_keys, string_to_signature_secret_key};
use sealpost_crypto::{EncryptionSecretKey, SigningKey};
use sealpost_shared::IdentityName;

use crate::error::CliError;

/// CLI configuration loaded from sealpost.toml with env var overrides.
#[derive(Clone, Deserialize)]
pub struct CliConfig {
    /// Node this CLI acts for. Default: "@@localhost.sealpost"
    #[serde(default = "default_node_name")]
    pub node_name: String,
    /// Profile under the node. Default: "main"
    #[serde(default = "default_profile_name")]
    pub profile_name: String,
    /// Base64 x25519 secret key. Ephemeral when absent.
    #[serde(default)]
    pub encryption_secret_key: Option<String>,
    /// Base64 Ed25519 secret key. Ephemeral when absent.
    #[serde(default)]
    pub identity_secret_key: Option<String>,
    /// Tracing log level. Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_node_name() -> String {
    "@@localhost.sealpost".to_string()
}
fn default_profile_name() -> String {
    "main".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            profile_name: default_profile_name(),
            encryption_secret_key: None,
            identity_secret_key: None,
            log_level: default_log_level(),
        }
    }
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("node_name", &self.node_name)
            .field("profile_name", &self.profile_name)
            .field("encryption_secret_key", &self.encryption_secret_key.as_ref().map(|_| ".."))
            .field("identity_secret_key", &self.identity_secret_key.as_ref().map(|_| ".."))
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Local key material resolved from config.
pub struct LocalKeys {
    pub encryption_secret: EncryptionSecretKey,
    pub signature_secret: SigningKey,
}

impl CliConfig {
    /// Load configuration from TOML file with environment variable overrides.
    ///
    /// Reads `sealpost.toml` from CWD (or the path in `SEALPOST_CONFIG`). A
    /// missing default file means built-in defaults; a missing explicit path
    /// is an error.
    pub fn load() -> Result<Self, CliError> {
        match std::env::var("SEALPOST_CONFIG") {
            Ok(path) => Self::from_path(Path::new(&path)),
            Err(_) => {
                let path = Path::new("sealpost.toml");
                if path.exists() {
                    Self::from_path(path)
                } else {
                    Self::from_toml_str("")
                }
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Load configuration from a TOML string, then apply env var overrides.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, CliError> {
        let mut config: CliConfig =
            toml::from_str(toml_str).map_err(|e| CliError::Config(e.to_string()))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the config.
    ///
    /// Values are checked here so a malformed override fails at startup
    /// rather than at first use.
    pub fn apply_env_overrides(&mut self) -> Result<(), CliError> {
        if let Ok(val) = std::env::var("NODE_NAME") {
            self.node_name = val;
        }
        if let Ok(val) = std::env::var("PROFILE_NAME") {
            self.profile_name = val;
        }
        if let Ok(val) = std::env::var("ENCRYPTION_SECRET_KEY") {
            string_to_encryption_secret_key(&val)
                .map_err(|_| CliError::Config("invalid ENCRYPTION_SECRET_KEY value".into()))?;
            self.encryption_secret_key = Some(val);
        }
        if let Ok(val) = std::env::var("IDENTITY_SECRET_KEY") {
            string_to_signature_secret_key(&val)
                .map_err(|_| CliError::Config("invalid IDENTITY_SECRET_KEY value".into()))?;
            self.identity_secret_key = Some(val);
        }
        if let Ok(val) = std::env::var("LOG_LEVEL") {
            self.log_level = val;
        }
        Ok(())
    }

    /// The profile identity this CLI signs as.
    pub fn identity(&self) -> Result<IdentityName, CliError> {
        Ok(IdentityName::from_node_and_profile(
            &self.node_name,
            &self.profile_name,
        )?)
    }

    /// Configured keys, or fresh ephemeral ones for whichever is missing.
    pub fn local_keys(&self) -> Result<LocalKeys, CliError> {
        let encryption_secret = match &self.encryption_secret_key {
            Some(encoded) => string_to_encryption_secret_key(encoded)?,
            None => {
                tracing::error!("no encryption secret key configured, using an ephemeral key");
                ephemeral_encryption_keys().0
            }
        };
        let signature_secret = match &self.identity_secret_key {
            Some(encoded) => string_to_signature_secret_key(encoded)?,
            None => {
                tracing::error!("no identity secret key configured, using an ephemeral key");
                ephemeral_signature_keys().0
            }
        };
        Ok(LocalKeys {
            encryption_secret,
            signature_secret,
        })
    }
}

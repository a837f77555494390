use sealpost_crypto::CryptoError;
use sealpost_message::MessageError;
use sealpost_shared::error::{ParseError, ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error("output error: {0}")]
    Output(String),
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<CliError> for ProtocolError {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Parse(e) => ProtocolError::Parse(e),
            CliError::Crypto(e) => e.into(),
            CliError::Message(e) => e.into(),
            other => ProtocolError::Builder(other.to_string()),
        }
    }
}

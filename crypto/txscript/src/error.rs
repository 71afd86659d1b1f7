use crate::script_builder::ScriptBuilderError;
use alba_consensus_core::{errors::TxParseError, hashing::sighash_type::SigHashTypeError};
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum TxScriptError {
    #[error("malformed transaction: {0}")]
    Parse(#[from] TxParseError),

    #[error(transparent)]
    SigHashType(#[from] SigHashTypeError),

    #[error("opcode requires {0} bytes, but script only has {1} remaining")]
    MalformedPush(usize, usize),

    #[error("push encoding is not minimal: {0}")]
    NotMinimalData(String),

    #[error(transparent)]
    ScriptBuilder(#[from] ScriptBuilderError),

    #[error("script does not match any known template")]
    UnrecognizedScript,

    #[error("expected {expected} outputs, found {found}")]
    UnexpectedOutputCount { expected: &'static str, found: usize },

    #[error("output {index} is not a {expected} output")]
    UnexpectedOutput { index: usize, expected: &'static str },

    #[error("invalid DER signature: {0}")]
    InvalidDerSignature(&'static str),

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("signature invalid: {0}")]
    InvalidSignature(secp256k1::Error),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(secp256k1::Error),
}

pub type TxScriptResult<T> = std::result::Result<T, TxScriptError>;

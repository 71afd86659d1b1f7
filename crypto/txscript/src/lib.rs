pub mod commitment;
pub mod error;
pub mod opcodes;
pub mod raw;
pub mod script_builder;
pub mod script_class;
pub mod sign;
pub mod signatures;
pub mod standard;

pub use error::{TxScriptError, TxScriptResult};

/// Maximum number of bytes pushable to the stack
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum script length in bytes
pub const MAX_SCRIPTS_SIZE: usize = 10_000;

/// Length of a compressed secp256k1 public key
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// A compressed secp256k1 public key as it appears inside scripts
pub type CompressedPublicKey = [u8; COMPRESSED_PUBLIC_KEY_SIZE];

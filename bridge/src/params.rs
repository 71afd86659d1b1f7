use alba_consensus_core::hashing::sighash_type::{SIG_HASH_ALL, SigHashType};
use serde::{Deserialize, Serialize};

/// Bitcoin's standardness limit on transaction weight, in bytes of a legacy transaction
pub const DEFAULT_MAX_TRANSACTION_SIZE: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BridgeParams {
    /// Sighash mode the command line tools compute digests under when none is given
    pub default_sighash_type: SigHashType,
    /// Raw transactions above this size are rejected before they are parsed
    pub max_transaction_size: usize,
}

impl Default for BridgeParams {
    fn default() -> Self {
        Self { default_sighash_type: SIG_HASH_ALL, max_transaction_size: DEFAULT_MAX_TRANSACTION_SIZE }
    }
}

impl BridgeParams {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

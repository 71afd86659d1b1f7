use alba_hashes::Hash;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Represents the ID of a Bitcoin transaction, in the byte order block explorers display it
pub type TransactionId = Hash;

/// Value of an output, in satoshis
pub type Amount = u64;

pub const MAX_TX_IN_SEQUENCE_NUM: u32 = u32::MAX;
pub const TX_VERSION: u32 = 2;

/// The absolute lock time field of a transaction. Zero means the transaction is final.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockTime(u32);

impl LockTime {
    pub const UNLOCKED: LockTime = LockTime(0);

    pub const fn from_consensus(value: u32) -> Self {
        LockTime(value)
    }

    pub const fn from_raw(raw: [u8; 4]) -> Self {
        LockTime(u32::from_le_bytes(raw))
    }

    /// The field exactly as it is serialized
    pub const fn raw(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn is_locked(self) -> bool {
        self.0 != 0
    }
}

impl Display for LockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a Bitcoin transaction outpoint
#[derive(Eq, Hash, PartialEq, Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutpoint {
    pub transaction_id: TransactionId,
    pub index: u32,
}

impl TransactionOutpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self { transaction_id, index }
    }
}

impl Display for TransactionOutpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.index)
    }
}

/// Represents a Bitcoin transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub previous_outpoint: TransactionOutpoint,
    #[serde(with = "hex::serde")]
    pub signature_script: Vec<u8>,
    pub sequence: u32,
}

impl TransactionInput {
    pub fn new(previous_outpoint: TransactionOutpoint, signature_script: Vec<u8>, sequence: u32) -> Self {
        Self { previous_outpoint, signature_script, sequence }
    }
}

/// Represents a Bitcoin transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutput {
    pub value: Amount,
    #[serde(with = "hex::serde")]
    pub script_public_key: Vec<u8>,
}

impl TransactionOutput {
    pub fn new(value: Amount, script_public_key: Vec<u8>) -> Self {
        Self { value, script_public_key }
    }
}

/// Represents a legacy (non-witness) Bitcoin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: LockTime,
}

impl Transaction {
    pub fn new(version: u32, inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>, lock_time: LockTime) -> Self {
        Self { version, inputs, outputs, lock_time }
    }

    /// Double SHA-256 of the serialization, in display order
    pub fn id(&self) -> TransactionId {
        crate::hashing::tx::id(self)
    }

    pub fn serialize(&self) -> Vec<u8> {
        crate::hashing::tx::serialize(self)
    }

    pub fn deserialize(bytes: &[u8]) -> crate::errors::TxParseResult<Self> {
        crate::parse::parse_transaction(bytes)
    }
}

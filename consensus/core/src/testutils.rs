//! Transaction fixtures shared by the parser tests of this and the dependent crates.

use crate::tx::{LockTime, TX_VERSION, Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput};
use std::str::FromStr;

pub const FUNDING_TXID: &str = "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16";

pub fn funding_outpoint() -> TransactionOutpoint {
    // The constant is a well-formed 64 character hex string
    TransactionOutpoint::new(TransactionId::from_str(FUNDING_TXID).unwrap_or_default(), 1)
}

/// A single-input transaction with three opaque outputs, shaped like a commitment transaction
pub fn commitment_like_tx(spends: TransactionOutpoint, lock_time: u32) -> Transaction {
    Transaction::new(
        TX_VERSION,
        vec![TransactionInput::new(spends, vec![0x00, 0x02, 0x30, 0x01], 0xfffffffd)],
        vec![
            TransactionOutput::new(60_000, vec![0x63, 0x67, 0x68]),
            TransactionOutput::new(40_000, vec![0x76, 0xa9]),
            TransactionOutput::new(0, vec![0x6a]),
        ],
        LockTime::from_consensus(lock_time),
    )
}

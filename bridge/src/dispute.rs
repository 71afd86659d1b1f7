use alba_consensus_core::tx::TransactionId;
use alba_hashes::{HASH_SIZE, Hasher, Sha256Hash};
use alba_txscript::commitment::CommitmentTx;
use serde::Serialize;

/// A challenge, opened by V, claiming a locked CTxP is a revoked state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisputeRecord {
    pub disputed_txid: TransactionId,
    pub lock_time: u32,
    /// Host time the dispute was opened at
    pub opened_at: u64,
    #[serde(with = "hex::serde")]
    pub revocation_secret_hash: [u8; HASH_SIZE],
}

impl DisputeRecord {
    pub fn open(ctx_p: &CommitmentTx, now: u64) -> Self {
        Self {
            disputed_txid: ctx_p.tx().id(),
            lock_time: ctx_p.lock_time().value(),
            opened_at: now,
            revocation_secret_hash: ctx_p.htlc().revocation_secret_hash,
        }
    }

    /// Whether `now` falls within `[opened_at, opened_at + window)`
    pub fn is_within_window(&self, now: u64, window: u64) -> bool {
        now >= self.opened_at && now < self.opened_at.saturating_add(window)
    }

    /// Whether the window closed, after which P can no longer answer
    pub fn is_final(&self, now: u64, window: u64) -> bool {
        now >= self.opened_at.saturating_add(window)
    }

    pub fn is_revoked_by(&self, secret: &[u8]) -> bool {
        Sha256Hash::hash(secret).as_bytes() == self.revocation_secret_hash
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DisputeState {
    Opened(DisputeRecord),
    /// P showed the disputed state was superseded
    ResolvedValid,
    /// V revealed the revocation secret of the disputed state
    ResolvedInvalid,
}

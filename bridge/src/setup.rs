use crate::{
    attestation::{HostAddress, HostSignature, verify_host_signature},
    errors::{RejectReason, RejectResult},
    ledger::Party,
};
use alba_consensus_core::{
    hashing::sighash_type::SigHashType,
    tx::{TransactionId, TransactionOutpoint},
};
use alba_hashes::{Hash, Hasher, HasherBase, KeccakHash};
use alba_txscript::{CompressedPublicKey, standard::extract_compressed_public_keys};
use serde::{Deserialize, Serialize};

/// The channel parameters P and V jointly sign to open the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetupRequest {
    /// Id of the transaction funding the channel, in display order
    pub funding_txid: TransactionId,
    /// Locking script of the funding output
    #[serde(with = "hex::serde")]
    pub funding_script: Vec<u8>,
    pub funding_index: u32,
    /// Raw sighash mode the commitment signatures are made under
    pub sighash_type: u32,
    #[serde(with = "hex::serde")]
    pub pk_p: CompressedPublicKey,
    #[serde(with = "hex::serde")]
    pub pk_v: CompressedPublicKey,
    /// Absolute host-ledger time, in seconds, after which the channel can be closed
    pub timelock: u64,
    /// Length of the dispute window, in seconds
    pub relative_timelock: u64,
}

impl SetupRequest {
    /// Keccak-256 over every field, integers big-endian
    pub fn digest(&self) -> Hash {
        let mut hasher = KeccakHash::new();
        hasher
            .update(self.funding_txid)
            .update(&self.funding_script)
            .update(self.funding_index.to_be_bytes())
            .update(self.sighash_type.to_be_bytes())
            .update(self.pk_p)
            .update(self.pk_v)
            .update(self.timelock.to_be_bytes())
            .update(self.relative_timelock.to_be_bytes());
        hasher.finalize()
    }
}

/// The stored result of a successful setup. It never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetupRecord {
    pub funding_outpoint: TransactionOutpoint,
    #[serde(with = "hex::serde")]
    pub funding_script: Vec<u8>,
    pub sighash_type: SigHashType,
    #[serde(with = "hex::serde")]
    pub pk_p: CompressedPublicKey,
    #[serde(with = "hex::serde")]
    pub pk_v: CompressedPublicKey,
    pub address_p: HostAddress,
    pub address_v: HostAddress,
    pub timelock: u64,
    pub relative_timelock: u64,
}

impl SetupRecord {
    /// Validates a jointly signed request. Nothing is stored unless every check passes.
    pub fn authorize(request: SetupRequest, sig_p: &HostSignature, sig_v: &HostSignature) -> RejectResult<Self> {
        let address_p = HostAddress::from_compressed(&request.pk_p).map_err(|_| RejectReason::InvalidSetupSignatures)?;
        let address_v = HostAddress::from_compressed(&request.pk_v).map_err(|_| RejectReason::InvalidSetupSignatures)?;
        let digest = request.digest();
        if !verify_host_signature(digest, sig_p, &address_p) || !verify_host_signature(digest, sig_v, &address_v) {
            return Err(RejectReason::InvalidSetupSignatures);
        }

        let sighash_type = SigHashType::from_u32(request.sighash_type)?;
        let funding_keys = extract_compressed_public_keys(&request.funding_script).map_err(RejectReason::MalformedFundingScript)?;
        if funding_keys != (request.pk_p, request.pk_v) {
            return Err(RejectReason::FundingKeysMismatch);
        }

        Ok(Self {
            funding_outpoint: TransactionOutpoint::new(request.funding_txid, request.funding_index),
            funding_script: request.funding_script,
            sighash_type,
            pk_p: request.pk_p,
            pk_v: request.pk_v,
            address_p,
            address_v,
            timelock: request.timelock,
            relative_timelock: request.relative_timelock,
        })
    }

    pub fn party_of(&self, address: &HostAddress) -> Option<Party> {
        if *address == self.address_p {
            Some(Party::Prover)
        } else if *address == self.address_v {
            Some(Party::Verifier)
        } else {
            None
        }
    }

    pub fn address(&self, party: Party) -> HostAddress {
        match party {
            Party::Prover => self.address_p,
            Party::Verifier => self.address_v,
        }
    }

    pub fn key(&self, party: Party) -> &CompressedPublicKey {
        match party {
            Party::Prover => &self.pk_p,
            Party::Verifier => &self.pk_v,
        }
    }

    /// The lock time a disputed commitment must exceed, `T + T_rel`
    pub fn dispute_timelock(&self) -> u64 {
        self.timelock.saturating_add(self.relative_timelock)
    }
}

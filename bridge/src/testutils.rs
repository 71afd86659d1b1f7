//! Deterministic channel fixtures shared by the unit tests, the integration tests and the
//! scenario replays.

use crate::{
    attestation::{HostAddress, HostSignature, optimistic_proof_digest, sign_host_digest},
    ledger::Party,
    setup::{SetupRecord, SetupRequest},
};
use alba_consensus_core::{
    hashing::sighash_type::{SIG_HASH_ALL, SigHashType},
    testutils::commitment_like_tx,
    tx::{LockTime, TX_VERSION, Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput},
};
use alba_hashes::{Hasher, Sha256Hash};
use alba_txscript::{
    CompressedPublicKey,
    sign::sign_multisig_input,
    standard::{
        funding_script,
        test_helpers::{htlc_output, null_data_output, p2pkh_output},
    },
};
use secp256k1::{PublicKey, SECP256K1, SecretKey};

pub const PROVER_SECRET: [u8; 32] = [0x0a; 32];
pub const VERIFIER_SECRET: [u8; 32] = [0x0b; 32];
pub const TIMELOCK: u64 = 1_000;
pub const RELATIVE_TIMELOCK: u64 = 100;
pub const FUNDING_VALUE: u64 = 100_000;
/// CSV delay of the owner path of every HTLC built here
pub const TO_SELF_DELAY: u32 = 144;

/// How to build one party's commitment transaction. The defaults describe the final state of a
/// channel where P holds 70 000 and V 30 000 satoshis.
#[derive(Debug, Clone)]
pub struct CommitmentSpec {
    pub prover: u64,
    pub verifier: u64,
    pub lock_time: u32,
    /// Key on the revocation path of the HTLC, the owner's counterparty by default
    pub revocation_key: Option<Party>,
    /// Receiver of the direct payout, the owner's counterparty by default
    pub payee: Option<Party>,
    /// Spent outpoint, the funding output by default
    pub spends: Option<TransactionOutpoint>,
    /// Whether the counterparty signed in addition to the owner
    pub countersigned: bool,
    pub revocation_secret: [u8; 32],
    pub data: Option<Vec<u8>>,
}

impl Default for CommitmentSpec {
    fn default() -> Self {
        Self {
            prover: 70_000,
            verifier: 30_000,
            lock_time: 0,
            revocation_key: None,
            payee: None,
            spends: None,
            countersigned: true,
            revocation_secret: [0x5e; 32],
            data: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelFixture {
    secret_p: SecretKey,
    secret_v: SecretKey,
    pub sighash_type: SigHashType,
    pub timelock: u64,
    pub relative_timelock: u64,
}

impl Default for ChannelFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelFixture {
    pub fn new() -> Self {
        Self::with_secrets(PROVER_SECRET, VERIFIER_SECRET).expect("the fixture secrets are valid keys")
    }

    pub fn with_secrets(prover: [u8; 32], verifier: [u8; 32]) -> Result<Self, secp256k1::Error> {
        Ok(Self {
            secret_p: SecretKey::from_slice(&prover)?,
            secret_v: SecretKey::from_slice(&verifier)?,
            sighash_type: SIG_HASH_ALL,
            timelock: TIMELOCK,
            relative_timelock: RELATIVE_TIMELOCK,
        })
    }

    pub fn secret(&self, party: Party) -> &SecretKey {
        match party {
            Party::Prover => &self.secret_p,
            Party::Verifier => &self.secret_v,
        }
    }

    pub fn key(&self, party: Party) -> CompressedPublicKey {
        PublicKey::from_secret_key(SECP256K1, self.secret(party)).serialize()
    }

    pub fn address(&self, party: Party) -> HostAddress {
        HostAddress::from_public_key(&PublicKey::from_secret_key(SECP256K1, self.secret(party)))
    }

    pub fn funding_script(&self) -> Vec<u8> {
        funding_script(&self.key(Party::Prover), &self.key(Party::Verifier)).expect("two keys fit a 2-of-2 script")
    }

    /// A transaction paying the channel capacity to the funding script, at index 1
    pub fn funding_tx(&self) -> Transaction {
        Transaction::new(
            TX_VERSION,
            vec![TransactionInput::new(TransactionOutpoint::new(TransactionId::from_le_u64(0xfeed), 0), vec![], u32::MAX)],
            vec![p2pkh_output(5_000, &self.key(Party::Prover)), TransactionOutput::new(FUNDING_VALUE, self.funding_script())],
            LockTime::UNLOCKED,
        )
    }

    pub fn funding_outpoint(&self) -> TransactionOutpoint {
        TransactionOutpoint::new(self.funding_tx().id(), 1)
    }

    pub fn setup_request(&self) -> SetupRequest {
        let funding = self.funding_outpoint();
        SetupRequest {
            funding_txid: funding.transaction_id,
            funding_script: self.funding_script(),
            funding_index: funding.index,
            sighash_type: self.sighash_type.to_u32(),
            pk_p: self.key(Party::Prover),
            pk_v: self.key(Party::Verifier),
            timelock: self.timelock,
            relative_timelock: self.relative_timelock,
        }
    }

    pub fn sign_setup(&self, request: &SetupRequest) -> (HostSignature, HostSignature) {
        let digest = request.digest();
        (sign_host_digest(digest, &self.secret_p), sign_host_digest(digest, &self.secret_v))
    }

    pub fn setup_record(&self) -> SetupRecord {
        let request = self.setup_request();
        let (sig_p, sig_v) = self.sign_setup(&request);
        SetupRecord::authorize(request, &sig_p, &sig_v).expect("the fixture setup is valid")
    }

    pub fn optimistic_signatures(&self, epoch: u64) -> (HostSignature, HostSignature) {
        let digest = optimistic_proof_digest(epoch);
        (sign_host_digest(digest, &self.secret_p), sign_host_digest(digest, &self.secret_v))
    }

    /// P's commitment transaction: the HTLC pays P, the P2PKH pays V
    pub fn prover_commitment(&self, spec: &CommitmentSpec) -> Vec<u8> {
        self.build_commitment(Party::Prover, spec)
    }

    /// V's commitment transaction: the HTLC pays V, the P2PKH pays P
    pub fn verifier_commitment(&self, spec: &CommitmentSpec) -> Vec<u8> {
        self.build_commitment(Party::Verifier, spec)
    }

    fn build_commitment(&self, owner: Party, spec: &CommitmentSpec) -> Vec<u8> {
        let counterparty = owner.counterparty();
        let (own_value, other_value) = match owner {
            Party::Prover => (spec.prover, spec.verifier),
            Party::Verifier => (spec.verifier, spec.prover),
        };
        let revocation_hash = Sha256Hash::hash(spec.revocation_secret).as_bytes();

        let mut tx = commitment_like_tx(spec.spends.unwrap_or_else(|| self.funding_outpoint()), spec.lock_time);
        tx.outputs = vec![
            htlc_output(own_value, &self.key(spec.revocation_key.unwrap_or(counterparty)), &revocation_hash, TO_SELF_DELAY, &self.key(owner)),
            p2pkh_output(other_value, &self.key(spec.payee.unwrap_or(counterparty))),
        ];
        if let Some(data) = &spec.data {
            tx.outputs.push(null_data_output(data));
        }

        let signers: Vec<SecretKey> = match (spec.countersigned, owner) {
            (true, _) => vec![self.secret_p, self.secret_v],
            (false, party) => vec![*self.secret(party)],
        };
        sign_multisig_input(&mut tx, 0, &self.funding_script(), &signers, self.sighash_type).expect("input 0 exists");
        tx.serialize()
    }
}

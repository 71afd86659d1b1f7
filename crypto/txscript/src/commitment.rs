//! Commitment transactions: single-input transactions paying a revocable HTLC, a direct P2PKH
//! payout and optionally a commitment digest, in that order.

use crate::{
    CompressedPublicKey, TxScriptError, TxScriptResult,
    signatures::{EcdsaSignature, extract_signatures, signature_matches_key},
    standard::{CommitmentData, HtlcPayout, P2pkhPayout, ParsedOutput, classify_and_extract},
};
use alba_consensus_core::{
    hashing::{sighash::calc_signature_hash, sighash_type::SigHashType},
    parse::{ParsedInput, parse_inputs, parse_transaction},
    tx::{LockTime, Transaction, TransactionOutpoint},
};
use alba_core::trace;
use alba_hashes::Hash;
use itertools::Itertools;
use serde::Serialize;

/// Index of the only input of a commitment transaction
pub const COMMITMENT_INPUT_INDEX: usize = 0;

/// Classifies every output of `tx`, in transaction order
pub fn parse_outputs(tx: &Transaction) -> TxScriptResult<Vec<ParsedOutput>> {
    tx.outputs.iter().map(|output| classify_and_extract(output.value, &output.script_public_key)).try_collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitmentOutputs {
    pub htlc: HtlcPayout,
    pub p2pkh: P2pkhPayout,
    pub data: Option<CommitmentData>,
}

impl CommitmentOutputs {
    /// Locates the outputs positionally: 0 is the HTLC, 1 the P2PKH, 2 (optional) the commitment data.
    pub fn from_parsed(outputs: Vec<ParsedOutput>) -> TxScriptResult<Self> {
        if !(2..=3).contains(&outputs.len()) {
            return Err(TxScriptError::UnexpectedOutputCount { expected: "2 or 3", found: outputs.len() });
        }
        let mut outputs = outputs.into_iter();
        let htlc = match outputs.next() {
            Some(ParsedOutput::Htlc(htlc)) => htlc,
            _ => return Err(TxScriptError::UnexpectedOutput { index: 0, expected: "htlc" }),
        };
        let p2pkh = match outputs.next() {
            Some(ParsedOutput::P2pkh(p2pkh)) => p2pkh,
            _ => return Err(TxScriptError::UnexpectedOutput { index: 1, expected: "p2pkh" }),
        };
        let data = match outputs.next() {
            None => None,
            Some(ParsedOutput::CommitmentData(data)) => Some(data),
            Some(_) => return Err(TxScriptError::UnexpectedOutput { index: 2, expected: "commitment data" }),
        };
        Ok(Self { htlc, p2pkh, data })
    }
}

/// A decoded commitment transaction
#[derive(Debug, Clone)]
pub struct CommitmentTx {
    tx: Transaction,
    input: ParsedInput,
    outputs: CommitmentOutputs,
}

impl CommitmentTx {
    pub fn parse(raw: &[u8]) -> TxScriptResult<Self> {
        let input = parse_inputs(raw)?;
        let tx = parse_transaction(raw)?;
        let outputs = CommitmentOutputs::from_parsed(parse_outputs(&tx)?)?;
        trace!("parsed commitment transaction {} spending {}", tx.id(), input.outpoint());
        Ok(Self { tx, input, outputs })
    }

    pub fn tx(&self) -> &Transaction {
        &self.tx
    }

    pub fn input(&self) -> &ParsedInput {
        &self.input
    }

    pub fn outputs(&self) -> &CommitmentOutputs {
        &self.outputs
    }

    pub fn htlc(&self) -> &HtlcPayout {
        &self.outputs.htlc
    }

    pub fn p2pkh(&self) -> &P2pkhPayout {
        &self.outputs.p2pkh
    }

    pub fn lock_time(&self) -> LockTime {
        self.tx.lock_time
    }

    pub fn is_locked(&self) -> bool {
        self.tx.lock_time.is_locked()
    }

    pub fn spends(&self, outpoint: &TransactionOutpoint) -> bool {
        self.input.outpoint() == *outpoint
    }

    /// The digest the signatures of the input commit to, `script_code` being the funding script
    pub fn digest(&self, script_code: &[u8], hash_type: SigHashType) -> Hash {
        calc_signature_hash(&self.tx, COMMITMENT_INPUT_INDEX, script_code, hash_type)
    }

    pub fn signatures(&self) -> TxScriptResult<Vec<EcdsaSignature>> {
        extract_signatures(&self.tx.inputs[COMMITMENT_INPUT_INDEX].signature_script)
    }

    /// Whether the input carries a `hash_type` signature made by `key`
    pub fn carries_signature_of(&self, script_code: &[u8], hash_type: SigHashType, key: &CompressedPublicKey) -> TxScriptResult<bool> {
        let digest = self.digest(script_code, hash_type);
        let signatures = self.signatures()?;
        Ok(signatures.iter().filter(|sig| sig.commits_to(hash_type)).any(|sig| signature_matches_key(digest, sig, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sign::sign_multisig_input,
        standard::{
            funding_script,
            test_helpers::{htlc_output, null_data_output, p2pkh_output},
        },
    };
    use alba_consensus_core::{
        errors::TxParseError,
        hashing::sighash_type::{SIG_HASH_ALL, SIG_HASH_NONE},
        testutils::{commitment_like_tx, funding_outpoint},
        tx::TransactionOutput,
    };
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    struct Keys {
        secret_p: SecretKey,
        secret_v: SecretKey,
        pk_p: CompressedPublicKey,
        pk_v: CompressedPublicKey,
    }

    fn keys() -> Keys {
        let secret_p = SecretKey::from_slice(&[0x0a; 32]).unwrap();
        let secret_v = SecretKey::from_slice(&[0x0b; 32]).unwrap();
        Keys {
            secret_p,
            secret_v,
            pk_p: PublicKey::from_secret_key(SECP256K1, &secret_p).serialize(),
            pk_v: PublicKey::from_secret_key(SECP256K1, &secret_v).serialize(),
        }
    }

    /// P's commitment transaction: the HTLC pays P after a delay or V with the revocation secret
    fn prover_commitment(keys: &Keys, lock_time: u32, with_data: bool) -> Transaction {
        let mut tx = commitment_like_tx(funding_outpoint(), lock_time);
        tx.outputs = vec![htlc_output(70_000, &keys.pk_v, &[0x99; 32], 144, &keys.pk_p), p2pkh_output(30_000, &keys.pk_v)];
        if with_data {
            tx.outputs.push(null_data_output(&[0x44; 32]));
        }
        tx
    }

    #[test]
    fn test_parse_commitment() {
        let keys = keys();
        for with_data in [false, true] {
            let tx = prover_commitment(&keys, 0, with_data);
            let commitment = CommitmentTx::parse(&tx.serialize()).unwrap();
            assert_eq!(commitment.tx(), &tx);
            assert_eq!(commitment.htlc().pk1, keys.pk_v);
            assert_eq!(commitment.htlc().pk2, keys.pk_p);
            assert_eq!(commitment.htlc().value, 70_000);
            assert_eq!(commitment.p2pkh().value, 30_000);
            assert_eq!(commitment.outputs().data.is_some(), with_data);
            assert!(!commitment.is_locked());
            assert!(commitment.spends(&funding_outpoint()));
            assert_eq!(commitment.input().count, 1);
        }
    }

    #[test]
    fn test_commitment_layout_errors() {
        let keys = keys();
        struct Test {
            name: &'static str,
            outputs: Vec<TransactionOutput>,
            expected: TxScriptError,
        }
        let htlc = htlc_output(1, &keys.pk_v, &[0x99; 32], 144, &keys.pk_p);
        let p2pkh = p2pkh_output(1, &keys.pk_v);
        let data = null_data_output(&[0x44; 32]);
        let tests = vec![
            Test { name: "one output", outputs: vec![htlc.clone()], expected: TxScriptError::UnexpectedOutputCount { expected: "2 or 3", found: 1 } },
            Test {
                name: "four outputs",
                outputs: vec![htlc.clone(), p2pkh.clone(), data.clone(), data.clone()],
                expected: TxScriptError::UnexpectedOutputCount { expected: "2 or 3", found: 4 },
            },
            Test {
                name: "swapped",
                outputs: vec![p2pkh.clone(), htlc.clone()],
                expected: TxScriptError::UnexpectedOutput { index: 0, expected: "htlc" },
            },
            Test {
                name: "two htlcs",
                outputs: vec![htlc.clone(), htlc.clone()],
                expected: TxScriptError::UnexpectedOutput { index: 1, expected: "p2pkh" },
            },
            Test {
                name: "p2pkh as data",
                outputs: vec![htlc.clone(), p2pkh.clone(), p2pkh.clone()],
                expected: TxScriptError::UnexpectedOutput { index: 2, expected: "commitment data" },
            },
            Test {
                name: "unknown script",
                outputs: vec![htlc.clone(), TransactionOutput::new(1, vec![0x51])],
                expected: TxScriptError::UnrecognizedScript,
            },
        ];
        for test in tests {
            let mut tx = prover_commitment(&keys, 0, false);
            tx.outputs = test.outputs;
            assert_eq!(CommitmentTx::parse(&tx.serialize()).map(|_| ()), Err(test.expected), "{}", test.name);
        }

        let mut two_inputs = prover_commitment(&keys, 0, false);
        two_inputs.inputs.push(two_inputs.inputs[0].clone());
        assert_eq!(CommitmentTx::parse(&two_inputs.serialize()).map(|_| ()), Err(TxScriptError::Parse(TxParseError::TooManyInputs(2))));
    }

    #[test]
    fn test_carries_signature_of() {
        let keys = keys();
        let script = funding_script(&keys.pk_p, &keys.pk_v).unwrap();
        let mut tx = prover_commitment(&keys, 0, true);
        sign_multisig_input(&mut tx, 0, &script, &[keys.secret_p, keys.secret_v], SIG_HASH_ALL).unwrap();
        let commitment = CommitmentTx::parse(&tx.serialize()).unwrap();

        assert_eq!(commitment.signatures().unwrap().len(), 2);
        assert!(commitment.carries_signature_of(&script, SIG_HASH_ALL, &keys.pk_v).unwrap());
        assert!(commitment.carries_signature_of(&script, SIG_HASH_ALL, &keys.pk_p).unwrap());
        // Signatures under another hash type, or over another script, do not count
        assert!(!commitment.carries_signature_of(&script, SIG_HASH_NONE, &keys.pk_v).unwrap());
        assert!(!commitment.carries_signature_of(&script[1..], SIG_HASH_ALL, &keys.pk_v).unwrap());

        // Only V signs
        let mut only_v = prover_commitment(&keys, 0, true);
        sign_multisig_input(&mut only_v, 0, &script, &[keys.secret_v], SIG_HASH_ALL).unwrap();
        let only_v = CommitmentTx::parse(&only_v.serialize()).unwrap();
        assert!(only_v.carries_signature_of(&script, SIG_HASH_ALL, &keys.pk_v).unwrap());
        assert!(!only_v.carries_signature_of(&script, SIG_HASH_ALL, &keys.pk_p).unwrap());
    }
}

//! Read-only entry points over raw transaction bytes, as consumed by the bridge.

use crate::{
    CompressedPublicKey, TxScriptResult,
    commitment::{COMMITMENT_INPUT_INDEX, CommitmentOutputs, CommitmentTx, parse_outputs},
    signatures::{EcdsaSignature, extract_signatures},
    standard::{ParsedOutput, extract_compressed_public_keys},
};
use alba_consensus_core::{
    hashing::{sighash::calc_signature_hash, sighash_type::SigHashType},
    parse::{self, ParsedInput, parse_transaction},
    tx::LockTime,
};
use alba_hashes::Hash;

pub use crate::signatures::verify_btc_signature;

/// Every output of the transaction, classified, in transaction order
pub fn get_outputs_data(raw_tx: &[u8]) -> TxScriptResult<Vec<ParsedOutput>> {
    parse_outputs(&parse_transaction(raw_tx)?)
}

/// The HTLC, P2PKH and optional commitment data outputs of a commitment transaction
pub fn get_commitment_outputs(raw_tx: &[u8]) -> TxScriptResult<CommitmentOutputs> {
    CommitmentOutputs::from_parsed(get_outputs_data(raw_tx)?)
}

pub fn get_inputs_data(raw_tx: &[u8]) -> TxScriptResult<ParsedInput> {
    Ok(parse::parse_inputs(raw_tx)?)
}

pub fn get_timelock(raw_tx: &[u8]) -> TxScriptResult<LockTime> {
    Ok(parse::get_timelock(raw_tx)?)
}

/// The signature digest of the first input, which spends an output locked by `locking_script`
pub fn get_tx_digest(raw_tx: &[u8], locking_script: &[u8], hash_type: SigHashType) -> TxScriptResult<Hash> {
    let tx = parse_transaction(raw_tx)?;
    Ok(calc_signature_hash(&tx, COMMITMENT_INPUT_INDEX, locking_script, hash_type))
}

/// The DER signatures of the first input's unlocking script
pub fn get_signatures(signed_raw_tx: &[u8]) -> TxScriptResult<Vec<EcdsaSignature>> {
    let tx = parse_transaction(signed_raw_tx)?;
    extract_signatures(&tx.inputs[COMMITMENT_INPUT_INDEX].signature_script)
}

pub fn extract_compressed_pk(locking_script: &[u8]) -> TxScriptResult<(CompressedPublicKey, CompressedPublicKey)> {
    extract_compressed_public_keys(locking_script)
}

/// Whether the commitment transaction carries a signature of `expected_key` over its digest
pub fn verify_counterparty_signature(
    raw_tx: &[u8],
    locking_script: &[u8],
    hash_type: SigHashType,
    expected_key: &CompressedPublicKey,
) -> TxScriptResult<bool> {
    CommitmentTx::parse(raw_tx)?.carries_signature_of(locking_script, hash_type, expected_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        TxScriptError,
        sign::sign_multisig_input,
        standard::{
            funding_script,
            test_helpers::{htlc_output, null_data_output, p2pkh_output},
        },
    };
    use alba_consensus_core::{
        errors::TxParseError,
        hashing::sighash_type::SIG_HASH_ALL,
        testutils::{commitment_like_tx, funding_outpoint},
    };
    use secp256k1::{PublicKey, SECP256K1, SecretKey};

    #[test]
    fn test_entry_points() {
        let secret_p = SecretKey::from_slice(&[0x31; 32]).unwrap();
        let secret_v = SecretKey::from_slice(&[0x32; 32]).unwrap();
        let pk_p = PublicKey::from_secret_key(SECP256K1, &secret_p);
        let pk_v = PublicKey::from_secret_key(SECP256K1, &secret_v);
        let script = funding_script(&pk_p.serialize(), &pk_v.serialize()).unwrap();

        let mut tx = commitment_like_tx(funding_outpoint(), 0);
        tx.outputs = vec![
            htlc_output(8_000, &pk_v.serialize(), &[0x01; 32], 10, &pk_p.serialize()),
            p2pkh_output(2_000, &pk_v.serialize()),
            null_data_output(&[0x02; 32]),
        ];
        sign_multisig_input(&mut tx, 0, &script, &[secret_p, secret_v], SIG_HASH_ALL).unwrap();
        let raw = tx.serialize();

        assert_eq!(get_outputs_data(&raw).unwrap().len(), 3);
        assert_eq!(get_commitment_outputs(&raw).unwrap().p2pkh.value, 2_000);
        assert_eq!(get_inputs_data(&raw).unwrap().outpoint(), funding_outpoint());
        assert_eq!(get_timelock(&raw).unwrap(), LockTime::UNLOCKED);
        assert_eq!(extract_compressed_pk(&script).unwrap(), (pk_p.serialize(), pk_v.serialize()));

        let digest = get_tx_digest(&raw, &script, SIG_HASH_ALL).unwrap();
        let signatures = get_signatures(&raw).unwrap();
        let recovered: Vec<PublicKey> =
            (0..2).filter_map(|id| verify_btc_signature(digest, id, &signatures[1].r, &signatures[1].s).ok()).collect();
        assert!(recovered.contains(&pk_v));

        assert!(verify_counterparty_signature(&raw, &script, SIG_HASH_ALL, &pk_v.serialize()).unwrap());
        let other = PublicKey::from_secret_key(SECP256K1, &SecretKey::from_slice(&[0x33; 32]).unwrap());
        assert!(!verify_counterparty_signature(&raw, &script, SIG_HASH_ALL, &other.serialize()).unwrap());
    }

    #[test]
    fn test_malformed_input() {
        let raw = commitment_like_tx(funding_outpoint(), 0).serialize();
        assert!(matches!(get_timelock(&raw[..raw.len() - 1]), Err(TxScriptError::Parse(TxParseError::OutOfBounds { .. }))));
        // The fixture's opaque scripts match no template
        assert_eq!(get_outputs_data(&raw), Err(TxScriptError::UnrecognizedScript));
        // and its scriptSig pushes two bytes that look like the start of a DER sequence
        assert_eq!(get_signatures(&raw), Err(TxScriptError::InvalidDerSignature("invalid length")));
    }
}

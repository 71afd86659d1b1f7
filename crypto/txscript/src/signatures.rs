//! DER signatures embedded in unlocking scripts, and public key recovery over Bitcoin digests.

use crate::{CompressedPublicKey, TxScriptError, TxScriptResult, opcodes::parse_script};
use alba_consensus_core::hashing::sighash_type::SigHashType;
use alba_core::trace;
use alba_hashes::Hash;
use secp256k1::{
    Message, PublicKey, SECP256K1,
    ecdsa::{RecoverableSignature, RecoveryId, Signature},
};
use serde::Serialize;

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// Shortest and longest strict DER signature, including the trailing hash type byte
const MIN_SIG_LEN: usize = 9;
const MAX_SIG_LEN: usize = 73;

const SCALAR_SIZE: usize = 32;

/// An ECDSA signature as carried by a scriptSig, with the hash type it commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EcdsaSignature {
    #[serde(serialize_with = "hex::serialize")]
    pub r: [u8; SCALAR_SIZE],
    #[serde(serialize_with = "hex::serialize")]
    pub s: [u8; SCALAR_SIZE],
    pub hash_type: u8,
}

impl EcdsaSignature {
    /// Decodes a strict (BIP66) DER signature followed by its hash type byte
    pub fn from_der(sig: &[u8]) -> TxScriptResult<Self> {
        check_signature_encoding(sig)?;
        let r_len = sig[3] as usize;
        let s_len = sig[5 + r_len] as usize;
        Ok(Self {
            r: left_pad_scalar(&sig[4..4 + r_len])?,
            s: left_pad_scalar(&sig[6 + r_len..6 + r_len + s_len])?,
            hash_type: sig[sig.len() - 1],
        })
    }

    pub fn from_secp(sig: &Signature, hash_type: SigHashType) -> Self {
        let compact = sig.serialize_compact();
        let mut r = [0u8; SCALAR_SIZE];
        let mut s = [0u8; SCALAR_SIZE];
        r.copy_from_slice(&compact[..SCALAR_SIZE]);
        s.copy_from_slice(&compact[SCALAR_SIZE..]);
        Self { r, s, hash_type: hash_type.to_signature_byte() }
    }

    /// `r || s`
    pub fn compact(&self) -> [u8; 2 * SCALAR_SIZE] {
        let mut compact = [0u8; 2 * SCALAR_SIZE];
        compact[..SCALAR_SIZE].copy_from_slice(&self.r);
        compact[SCALAR_SIZE..].copy_from_slice(&self.s);
        compact
    }

    /// DER encoding followed by the hash type byte, as pushed by a scriptSig
    pub fn to_der(&self) -> TxScriptResult<Vec<u8>> {
        let sig = Signature::from_compact(&self.compact()).map_err(TxScriptError::InvalidSignature)?;
        let mut out = sig.serialize_der().to_vec();
        out.push(self.hash_type);
        Ok(out)
    }

    /// Whether the signature was made under `hash_type`
    pub fn commits_to(&self, hash_type: SigHashType) -> bool {
        self.hash_type == hash_type.to_signature_byte()
    }
}

/// Checks the BIP66 rules: a minimal sequence of two minimal, positive integers.
fn check_signature_encoding(sig: &[u8]) -> TxScriptResult<()> {
    let len = sig.len();
    if !(MIN_SIG_LEN..=MAX_SIG_LEN).contains(&len) {
        return Err(TxScriptError::InvalidDerSignature("invalid length"));
    }
    if sig[0] != DER_SEQUENCE {
        return Err(TxScriptError::InvalidDerSignature("not a compound structure"));
    }
    if sig[1] as usize != len - 3 {
        return Err(TxScriptError::InvalidDerSignature("sequence length does not match the signature"));
    }
    let r_len = sig[3] as usize;
    if 5 + r_len >= len {
        return Err(TxScriptError::InvalidDerSignature("r length exceeds the signature"));
    }
    let s_len = sig[5 + r_len] as usize;
    if r_len + s_len + 7 != len {
        return Err(TxScriptError::InvalidDerSignature("r and s lengths do not add up"));
    }
    check_integer(&sig[2..4 + r_len], &R_ERRORS)?;
    check_integer(&sig[4 + r_len..6 + r_len + s_len], &S_ERRORS)
}

struct IntegerErrors {
    tag: &'static str,
    empty: &'static str,
    negative: &'static str,
    padding: &'static str,
}

const R_ERRORS: IntegerErrors =
    IntegerErrors { tag: "r is not an integer", empty: "r is empty", negative: "r is negative", padding: "r is not minimally encoded" };
const S_ERRORS: IntegerErrors =
    IntegerErrors { tag: "s is not an integer", empty: "s is empty", negative: "s is negative", padding: "s is not minimally encoded" };

/// `element` is the whole `0x02 <len> <bytes>` encoding
fn check_integer(element: &[u8], errors: &IntegerErrors) -> TxScriptResult<()> {
    let reason = match element {
        [tag, ..] if *tag != DER_INTEGER => errors.tag,
        [_, _] => errors.empty,
        [_, _, first, ..] if first & 0x80 != 0 => errors.negative,
        [_, _, 0x00, second, ..] if second & 0x80 == 0 => errors.padding,
        _ => return Ok(()),
    };
    Err(TxScriptError::InvalidDerSignature(reason))
}

fn left_pad_scalar(value: &[u8]) -> TxScriptResult<[u8; SCALAR_SIZE]> {
    let value = match value {
        [0x00, rest @ ..] => rest,
        _ => value,
    };
    if value.len() > SCALAR_SIZE {
        return Err(TxScriptError::InvalidDerSignature("integer exceeds 32 bytes"));
    }
    let mut out = [0u8; SCALAR_SIZE];
    out[SCALAR_SIZE - value.len()..].copy_from_slice(value);
    Ok(out)
}

/// Extracts the DER signatures of an unlocking script in push order. Empty pushes (the
/// `OP_CHECKMULTISIG` dummy) and pushes that do not start a DER sequence are skipped.
pub fn extract_signatures(signature_script: &[u8]) -> TxScriptResult<Vec<EcdsaSignature>> {
    let mut signatures = Vec::new();
    for op in parse_script(signature_script) {
        let op = op?;
        match op.data.first() {
            Some(&DER_SEQUENCE) => signatures.push(EcdsaSignature::from_der(op.data)?),
            Some(_) => trace!("skipping a {} byte push that is not a signature", op.data.len()),
            None => {}
        }
    }
    Ok(signatures)
}

fn recovery_id(id: u8) -> TxScriptResult<RecoveryId> {
    let normalized = match id {
        0..=3 => id,
        27..=30 => id - 27,
        _ => return Err(TxScriptError::InvalidRecoveryId(id)),
    };
    RecoveryId::from_i32(normalized as i32).map_err(|_| TxScriptError::InvalidRecoveryId(id))
}

/// Recovers the public key that produced `(r, s)` over `digest`.
///
/// `recovery_id` is either raw (`0..=3`) or offset by 27 as in compact message signatures.
pub fn verify_btc_signature(digest: Hash, recovery_id_byte: u8, r: &[u8; 32], s: &[u8; 32]) -> TxScriptResult<PublicKey> {
    let id = recovery_id(recovery_id_byte)?;
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(r);
    compact[32..].copy_from_slice(s);
    let signature = RecoverableSignature::from_compact(&compact, id).map_err(TxScriptError::InvalidSignature)?;
    let msg = Message::from_digest(digest.as_bytes());
    SECP256K1.recover_ecdsa(&msg, &signature).map_err(TxScriptError::InvalidSignature)
}

/// Whether `signature` over `digest` was made by `expected_key`, trying every recovery id
pub fn signature_matches_key(digest: Hash, signature: &EcdsaSignature, expected_key: &CompressedPublicKey) -> bool {
    (0..4u8).any(|id| {
        verify_btc_signature(digest, id, &signature.r, &signature.s).is_ok_and(|key| key.serialize() == *expected_key)
    })
}

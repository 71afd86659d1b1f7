use crate::{
    COMPRESSED_PUBLIC_KEY_SIZE, CompressedPublicKey, TxScriptError, TxScriptResult,
    opcodes::{
        ParsedOpcode,
        codes::{
            OpCheckSequenceVerify, OpCheckSig, OpCheckSigVerify, OpData75, OpDrop, OpDup, OpElse, OpEndIf, OpEqual, OpEqualVerify,
            OpHash160, OpIf, OpPushData1, OpPushData4, OpReturn, OpSha256,
        },
        deserialize_i64, parse_script_strict,
    },
    script_builder::{ScriptBuilder, ScriptBuilderResult},
    script_class::ScriptClass,
};
use alba_consensus_core::tx::Amount;
use alba_hashes::{HASH_SIZE, HASH160_SIZE, hash160};
use serde::Serialize;

mod multisig;

pub use multisig::{Error as MultisigCreateError, extract_compressed_public_keys, funding_script, multisig_redeem_script};
use multisig::compressed_key;

/// Longest relative delay encoding accepted inside an HTLC, as `OP_CHECKSEQUENCEVERIFY` reads a 4-byte number
const MAX_DELAY_NUM_LEN: usize = 4;

/// Creates a new script paying to the HASH160 of a public key
pub fn pay_to_pub_key_hash(pubkey_hash: &[u8; HASH160_SIZE]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend([OpDup, OpHash160, HASH160_SIZE as u8]);
    script.extend_from_slice(pubkey_hash);
    script.extend([OpEqualVerify, OpCheckSig]);
    script
}

/// Creates a pay-to-pubkey-hash script for a compressed public key
pub fn pay_to_pub_key(pub_key: &CompressedPublicKey) -> Vec<u8> {
    pay_to_pub_key_hash(&hash160(pub_key))
}

/// Creates the revocable output of a commitment transaction:
///
/// ```text
/// OP_IF
///     <revocation_key> OP_CHECKSIGVERIFY OP_SHA256 <revocation_secret_hash> OP_EQUAL
/// OP_ELSE
///     <to_self_delay> OP_CHECKSEQUENCEVERIFY OP_DROP <owner_key> OP_CHECKSIG
/// OP_ENDIF
/// ```
pub fn revocable_htlc_script(
    revocation_key: &CompressedPublicKey,
    revocation_secret_hash: &[u8; HASH_SIZE],
    to_self_delay: u32,
    owner_key: &CompressedPublicKey,
) -> ScriptBuilderResult<Vec<u8>> {
    Ok(ScriptBuilder::new()
        .add_op(OpIf)?
        .add_data(revocation_key)?
        .add_ops(&[OpCheckSigVerify, OpSha256])?
        .add_data(revocation_secret_hash)?
        .add_ops(&[OpEqual, OpElse])?
        .add_i64(to_self_delay as i64)?
        .add_ops(&[OpCheckSequenceVerify, OpDrop])?
        .add_data(owner_key)?
        .add_ops(&[OpCheckSig, OpEndIf])?
        .drain())
}

/// Creates a provably unspendable output carrying `data`
pub fn null_data_script(data: &[u8]) -> ScriptBuilderResult<Vec<u8>> {
    let mut builder = ScriptBuilder::new();
    builder.add_op(OpReturn)?;
    if !data.is_empty() {
        builder.add_data(data)?;
    }
    Ok(builder.drain())
}

/// The revocable payout of a commitment transaction. `pk1` can spend with the revocation secret,
/// `pk2` (the owner) after `to_self_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtlcPayout {
    pub value: Amount,
    #[serde(serialize_with = "hex::serialize")]
    pub pk1: CompressedPublicKey,
    #[serde(serialize_with = "hex::serialize")]
    pub revocation_secret_hash: [u8; HASH_SIZE],
    #[serde(serialize_with = "hex::serialize")]
    pub pk2: CompressedPublicKey,
    pub to_self_delay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct P2pkhPayout {
    pub value: Amount,
    #[serde(serialize_with = "hex::serialize")]
    pub pubkey_hash: [u8; HASH160_SIZE],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitmentData {
    pub value: Amount,
    #[serde(serialize_with = "hex::serialize")]
    pub data: Vec<u8>,
}

/// A transaction output decoded by its locking script template
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedOutput {
    Htlc(HtlcPayout),
    P2pkh(P2pkhPayout),
    CommitmentData(CommitmentData),
}

impl ParsedOutput {
    pub fn value(&self) -> Amount {
        match self {
            ParsedOutput::Htlc(htlc) => htlc.value,
            ParsedOutput::P2pkh(p2pkh) => p2pkh.value,
            ParsedOutput::CommitmentData(data) => data.value,
        }
    }

    pub fn script_class(&self) -> ScriptClass {
        match self {
            ParsedOutput::Htlc(_) => ScriptClass::Htlc,
            ParsedOutput::P2pkh(_) => ScriptClass::PubKeyHash,
            ParsedOutput::CommitmentData(_) => ScriptClass::NullData,
        }
    }

    pub fn as_htlc(&self) -> Option<&HtlcPayout> {
        match self {
            ParsedOutput::Htlc(htlc) => Some(htlc),
            _ => None,
        }
    }

    pub fn as_p2pkh(&self) -> Option<&P2pkhPayout> {
        match self {
            ParsedOutput::P2pkh(p2pkh) => Some(p2pkh),
            _ => None,
        }
    }

    pub fn as_commitment_data(&self) -> Option<&CommitmentData> {
        match self {
            ParsedOutput::CommitmentData(data) => Some(data),
            _ => None,
        }
    }
}

fn push_array<const N: usize>(op: &ParsedOpcode) -> Option<[u8; N]> {
    op.push_of(N).and_then(|data| data.try_into().ok())
}

fn push_compressed_key(op: &ParsedOpcode) -> Option<CompressedPublicKey> {
    op.push_of(COMPRESSED_PUBLIC_KEY_SIZE).and_then(compressed_key)
}

/// A non-negative, minimally encoded script number of at most four bytes
fn script_delay(op: &ParsedOpcode) -> Option<u32> {
    if let Some(n) = op.small_int() {
        return u32::try_from(n).ok();
    }
    if op.opcode > OpPushData4 || op.data.is_empty() || op.check_minimal_data_push().is_err() {
        return None;
    }
    deserialize_i64(op.data, MAX_DELAY_NUM_LEN).ok().and_then(|n| u32::try_from(n).ok())
}

pub(crate) fn match_htlc(value: Amount, ops: &[ParsedOpcode]) -> Option<HtlcPayout> {
    let [if_op, pk1, checksig_verify, sha256, hash, equal, else_op, delay, csv, drop, pk2, checksig, endif] = ops else {
        return None;
    };
    let opcodes_match = if_op.is(OpIf)
        && checksig_verify.is(OpCheckSigVerify)
        && sha256.is(OpSha256)
        && equal.is(OpEqual)
        && else_op.is(OpElse)
        && csv.is(OpCheckSequenceVerify)
        && drop.is(OpDrop)
        && checksig.is(OpCheckSig)
        && endif.is(OpEndIf);
    if !opcodes_match {
        return None;
    }
    Some(HtlcPayout {
        value,
        pk1: push_compressed_key(pk1)?,
        revocation_secret_hash: push_array(hash)?,
        pk2: push_compressed_key(pk2)?,
        to_self_delay: script_delay(delay)?,
    })
}

pub(crate) fn match_p2pkh(value: Amount, ops: &[ParsedOpcode]) -> Option<P2pkhPayout> {
    let [dup, op_hash160, pubkey_hash, equal_verify, checksig] = ops else {
        return None;
    };
    if !(dup.is(OpDup) && op_hash160.is(OpHash160) && equal_verify.is(OpEqualVerify) && checksig.is(OpCheckSig)) {
        return None;
    }
    Some(P2pkhPayout { value, pubkey_hash: push_array(pubkey_hash)? })
}

pub(crate) fn match_null_data(value: Amount, ops: &[ParsedOpcode]) -> Option<CommitmentData> {
    match ops {
        [op_return] if op_return.is(OpReturn) => Some(CommitmentData { value, data: vec![] }),
        [op_return, push] if op_return.is(OpReturn) && ((1..=OpData75).contains(&push.opcode) || push.is(OpPushData1)) => {
            Some(CommitmentData { value, data: push.data.to_vec() })
        }
        _ => None,
    }
}

/// Classifies a locking script and extracts the fields of its template.
///
/// Fails with [`TxScriptError::UnrecognizedScript`] on scripts of any other form, and with
/// [`TxScriptError::MalformedPush`] on scripts that cannot be decoded at all.
pub fn classify_and_extract(value: Amount, script: &[u8]) -> TxScriptResult<ParsedOutput> {
    let ops = parse_script_strict(script)?;
    if let Some(htlc) = match_htlc(value, &ops) {
        return Ok(ParsedOutput::Htlc(htlc));
    }
    if let Some(p2pkh) = match_p2pkh(value, &ops) {
        return Ok(ParsedOutput::P2pkh(p2pkh));
    }
    if let Some(data) = match_null_data(value, &ops) {
        return Ok(ParsedOutput::CommitmentData(data));
    }
    Err(TxScriptError::UnrecognizedScript)
}

#[cfg(any(test, feature = "testutils"))]
pub mod test_helpers {
    use super::*;
    use alba_consensus_core::tx::TransactionOutput;

    pub fn htlc_output(
        value: Amount,
        revocation_key: &CompressedPublicKey,
        revocation_secret_hash: &[u8; HASH_SIZE],
        to_self_delay: u32,
        owner_key: &CompressedPublicKey,
    ) -> TransactionOutput {
        let script = revocable_htlc_script(revocation_key, revocation_secret_hash, to_self_delay, owner_key).expect("the script is canonical");
        TransactionOutput::new(value, script)
    }

    pub fn p2pkh_output(value: Amount, payee_key: &CompressedPublicKey) -> TransactionOutput {
        TransactionOutput::new(value, pay_to_pub_key(payee_key))
    }

    pub fn null_data_output(data: &[u8]) -> TransactionOutput {
        TransactionOutput::new(0, null_data_script(data).expect("the script is canonical"))
    }
}

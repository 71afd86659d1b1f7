use crate::{
    COMPRESSED_PUBLIC_KEY_SIZE, CompressedPublicKey, TxScriptError, TxScriptResult,
    opcodes::{
        ParsedOpcode,
        codes::{Op2, OpCheckMultiSig},
        parse_script_strict,
    },
    script_builder::{ScriptBuilder, ScriptBuilderError},
};
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Debug, Clone)]
pub enum Error {
    // ErrTooManyRequiredSigs is returned from multisig_redeem_script when the
    // specified number of required signatures is larger than the number of
    // provided public keys.
    #[error("too many required signatures")]
    ErrTooManyRequiredSigs,
    #[error(transparent)]
    ScriptBuilderError(#[from] ScriptBuilderError),
    #[error("provided public keys should not be empty")]
    EmptyKeys,
}

/// Generates a `required`-of-n multi-signature script over the compressed keys, in the order given.
///
/// # Errors
///
/// This function will return an error if:
/// * There are no public keys provided.
/// * The number of provided keys is less than `required`.
pub fn multisig_redeem_script<'a>(pub_keys: impl Iterator<Item = &'a CompressedPublicKey>, required: usize) -> Result<Vec<u8>, Error> {
    let mut builder = ScriptBuilder::new();
    builder.add_i64(required as i64)?;

    let mut count = 0i64;
    for pub_key in pub_keys {
        count += 1;
        builder.add_data(pub_key)?;
    }
    if count == 0 {
        return Err(Error::EmptyKeys);
    }
    if (count as usize) < required {
        return Err(Error::ErrTooManyRequiredSigs);
    }

    builder.add_i64(count)?;
    builder.add_op(OpCheckMultiSig)?;
    Ok(builder.drain())
}

/// The 2-of-2 locking script of a channel funding output, `OP_2 <pk_p> <pk_v> OP_2 OP_CHECKMULTISIG`
pub fn funding_script(pk_p: &CompressedPublicKey, pk_v: &CompressedPublicKey) -> Result<Vec<u8>, Error> {
    multisig_redeem_script([pk_p, pk_v].into_iter(), 2)
}

pub(super) fn compressed_key(data: &[u8]) -> Option<CompressedPublicKey> {
    match data.first() {
        Some(0x02 | 0x03) => data.try_into().ok(),
        _ => None,
    }
}

/// Returns the two compressed keys of a 2-of-2 funding script, in script order
pub fn extract_compressed_public_keys(script: &[u8]) -> TxScriptResult<(CompressedPublicKey, CompressedPublicKey)> {
    let ops = parse_script_strict(script)?;
    let [required, first, second, total, check] = ops.as_slice() else {
        return Err(TxScriptError::UnrecognizedScript);
    };
    if !required.is(Op2) || !total.is(Op2) || !check.is(OpCheckMultiSig) {
        return Err(TxScriptError::UnrecognizedScript);
    }
    let key = |op: &ParsedOpcode| op.push_of(COMPRESSED_PUBLIC_KEY_SIZE).and_then(compressed_key);
    match (key(first), key(second)) {
        (Some(pk_p), Some(pk_v)) => Ok((pk_p, pk_v)),
        _ => Err(TxScriptError::UnrecognizedScript),
    }
}

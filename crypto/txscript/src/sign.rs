use crate::{
    TxScriptResult,
    opcodes::codes::Op0,
    script_builder::{ScriptBuilder, ScriptBuilderResult},
    signatures::EcdsaSignature,
};
use alba_consensus_core::{
    hashing::{sighash::calc_signature_hash, sighash_type::SigHashType},
    tx::Transaction,
};
use secp256k1::{Message, SECP256K1, SecretKey};

/// Signs the input at `input_index` of `tx`, spending an output locked by `script_code`.
///
/// The signature is returned as an unlocking script push expects it: DER followed by the hash type byte.
pub fn sign_input(tx: &Transaction, input_index: usize, script_code: &[u8], secret_key: &SecretKey, hash_type: SigHashType) -> TxScriptResult<Vec<u8>> {
    let hash = calc_signature_hash(tx, input_index, script_code, hash_type);
    let msg = Message::from_digest(hash.as_bytes());
    let sig = SECP256K1.sign_ecdsa(&msg, secret_key);
    EcdsaSignature::from_secp(&sig, hash_type).to_der()
}

/// The unlocking script of a 2-of-2 multi-signature output: the `OP_CHECKMULTISIG` dummy
/// followed by the signatures in key order.
pub fn multisig_signature_script(signatures: &[Vec<u8>]) -> ScriptBuilderResult<Vec<u8>> {
    let mut builder = ScriptBuilder::new();
    builder.add_op(Op0)?;
    for signature in signatures {
        builder.add_data(signature)?;
    }
    Ok(builder.drain())
}

/// Signs input `input_index` with every key, in order, and installs the resulting unlocking script.
pub fn sign_multisig_input(
    tx: &mut Transaction,
    input_index: usize,
    script_code: &[u8],
    secret_keys: &[SecretKey],
    hash_type: SigHashType,
) -> TxScriptResult<()> {
    let signatures =
        secret_keys.iter().map(|key| sign_input(tx, input_index, script_code, key, hash_type)).collect::<TxScriptResult<Vec<_>>>()?;
    tx.inputs[input_index].signature_script = multisig_signature_script(&signatures)?;
    Ok(())
}

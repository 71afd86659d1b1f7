use alba_hashes::{Hash, Hasher, HasherBase, TransactionSigningHash};

use crate::tx::{Transaction, TransactionOutput};

use super::{
    HasherExtensions,
    sighash_type::SigHashType,
    tx::{write_outpoint, write_output},
};

const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_CODESEPARATOR: u8 = 0xab;

/// The digest Bitcoin signs when `SIGHASH_SINGLE` has no matching output, or the input does not exist
pub fn sighash_one() -> Hash {
    Hash::from_le_u64(1)
}

/// Removes every `OP_CODESEPARATOR` that sits on an opcode boundary. Bytes following a truncated
/// push are kept as they are.
pub fn strip_code_separators(script: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(script.len());
    let mut pos = 0;
    while pos < script.len() {
        let opcode = script[pos];
        let push_len = match opcode {
            0x01..=0x4b => Some(opcode as usize),
            OP_PUSHDATA1 => script.get(pos + 1).map(|&n| 1 + n as usize),
            OP_PUSHDATA2 => script.get(pos + 1..pos + 3).map(|n| 2 + u16::from_le_bytes([n[0], n[1]]) as usize),
            OP_PUSHDATA4 => script.get(pos + 1..pos + 5).map(|n| 4 + u32::from_le_bytes([n[0], n[1], n[2], n[3]]) as usize),
            _ => Some(0),
        };
        let Some(push_len) = push_len.filter(|len| pos + 1 + len <= script.len()) else {
            out.extend_from_slice(&script[pos..]);
            break;
        };
        if opcode != OP_CODESEPARATOR {
            out.extend_from_slice(&script[pos..pos + 1 + push_len]);
        }
        pos += 1 + push_len;
    }
    out
}

/// Computes the legacy (pre-segwit) signature hash of `tx` for the input at `input_index`, where
/// `script_code` is the locking script of the output being spent.
pub fn calc_signature_hash(tx: &Transaction, input_index: usize, script_code: &[u8], hash_type: SigHashType) -> Hash {
    if input_index >= tx.inputs.len() {
        return sighash_one();
    }
    if hash_type.is_sighash_single() && input_index >= tx.outputs.len() {
        return sighash_one();
    }

    let script_code = strip_code_separators(script_code);
    let mut hasher = TransactionSigningHash::new();
    hasher.write_u32(tx.version);

    let signed_inputs: Vec<usize> = if hash_type.is_sighash_anyone_can_pay() { vec![input_index] } else { (0..tx.inputs.len()).collect() };
    hasher.write_compact_size(signed_inputs.len());
    for i in signed_inputs {
        let input = &tx.inputs[i];
        write_outpoint(&mut hasher, &input.previous_outpoint);
        if i == input_index {
            hasher.write_var_bytes(&script_code);
        } else {
            hasher.write_var_bytes(&[]);
        }
        let sequence = if i != input_index && (hash_type.is_sighash_none() || hash_type.is_sighash_single()) { 0 } else { input.sequence };
        hasher.write_u32(sequence);
    }

    hash_outputs(&mut hasher, tx, input_index, hash_type);

    hasher.update(tx.lock_time.raw()).write_u32(hash_type.to_u32());
    hasher.finalize()
}

fn hash_outputs(hasher: &mut impl HasherBase, tx: &Transaction, input_index: usize, hash_type: SigHashType) {
    if hash_type.is_sighash_none() {
        hasher.write_compact_size(0);
    } else if hash_type.is_sighash_single() {
        // Outputs preceding the signed one are committed to as blank placeholders
        let blank = TransactionOutput::new(u64::MAX, vec![]);
        hasher.write_compact_size(input_index + 1);
        for _ in 0..input_index {
            write_output(hasher, &blank);
        }
        write_output(hasher, &tx.outputs[input_index]);
    } else {
        hasher.write_compact_size(tx.outputs.len());
        for output in tx.outputs.iter() {
            write_output(hasher, output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hashing::sighash_type::{SIG_HASH_ALL, SIG_HASH_ANY_ONE_CAN_PAY, SIG_HASH_NONE, SIG_HASH_SINGLE},
        tx::{LockTime, TransactionId, TransactionInput, TransactionOutpoint},
    };
    use std::str::FromStr;

    const P2PKH_SCRIPT: &str = "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac";

    fn two_by_two_tx() -> Transaction {
        let prev = TransactionId::from_str("0437cd7f8525ceed2324359c2d0ba26006d92d856a9c20fa0241106ee5a597c9").unwrap();
        Transaction::new(
            1,
            vec![
                TransactionInput::new(TransactionOutpoint::new(prev, 0), vec![0x00, 0x01], 0xffff_fffe),
                TransactionInput::new(TransactionOutpoint::new(prev, 1), vec![], 0xffff_ffff),
            ],
            vec![
                TransactionOutput::new(1_000_000, hex::decode(P2PKH_SCRIPT).unwrap()),
                TransactionOutput::new(2_000_000, vec![0x6a, 0x01, 0x02]),
            ],
            LockTime::from_consensus(500_000),
        )
    }

    #[test]
    fn test_sighash_all_vector() {
        let tx = two_by_two_tx();
        let script = hex::decode(P2PKH_SCRIPT).unwrap();
        struct Test {
            name: &'static str,
            input_index: usize,
            hash_type: SigHashType,
            expected: &'static str,
        }
        let tests = vec![
            Test {
                name: "all, input 0",
                input_index: 0,
                hash_type: SIG_HASH_ALL,
                expected: "4c6daf19c7c02f3eb36c7d50e2c4813380c9bd801f9fa6a865eb71bfd10ec767",
            },
            Test {
                name: "all, input 1",
                input_index: 1,
                hash_type: SIG_HASH_ALL,
                expected: "7cfe6b044dedd5f8d07d12a6953ba0bcd25e1b845c88adfdef0b7f5c65a6c2e5",
            },
        ];
        for test in tests {
            let digest = calc_signature_hash(&tx, test.input_index, &script, test.hash_type);
            assert_eq!(digest, Hash::from_str(test.expected).unwrap(), "{}", test.name);
        }
    }

    #[test]
    fn test_sighash_masking() {
        let tx = two_by_two_tx();
        let script = hex::decode(P2PKH_SCRIPT).unwrap();
        let anyone_can_pay_all = SigHashType::from_u32(SIG_HASH_ALL.to_u32() | SIG_HASH_ANY_ONE_CAN_PAY.to_u32()).unwrap();

        // NONE does not commit to outputs
        let mut other_outputs = tx.clone();
        other_outputs.outputs[1].value += 1;
        assert_eq!(calc_signature_hash(&tx, 0, &script, SIG_HASH_NONE), calc_signature_hash(&other_outputs, 0, &script, SIG_HASH_NONE));
        assert_ne!(calc_signature_hash(&tx, 0, &script, SIG_HASH_ALL), calc_signature_hash(&other_outputs, 0, &script, SIG_HASH_ALL));

        // SINGLE commits to its own output only
        assert_eq!(calc_signature_hash(&tx, 0, &script, SIG_HASH_SINGLE), calc_signature_hash(&other_outputs, 0, &script, SIG_HASH_SINGLE));
        assert_ne!(calc_signature_hash(&tx, 1, &script, SIG_HASH_SINGLE), calc_signature_hash(&other_outputs, 1, &script, SIG_HASH_SINGLE));

        // ANYONECANPAY does not commit to the other inputs
        let mut other_inputs = tx.clone();
        other_inputs.inputs[1].previous_outpoint.index = 9;
        assert_eq!(calc_signature_hash(&tx, 0, &script, anyone_can_pay_all), calc_signature_hash(&other_inputs, 0, &script, anyone_can_pay_all));
        assert_ne!(calc_signature_hash(&tx, 0, &script, SIG_HASH_ALL), calc_signature_hash(&other_inputs, 0, &script, SIG_HASH_ALL));

        // The existing scriptSig of the signed input is never committed to
        let mut other_script_sig = tx.clone();
        other_script_sig.inputs[0].signature_script = vec![0x51; 12];
        assert_eq!(calc_signature_hash(&tx, 0, &script, SIG_HASH_ALL), calc_signature_hash(&other_script_sig, 0, &script, SIG_HASH_ALL));
    }

    #[test]
    fn test_sighash_one_cases() {
        let mut tx = two_by_two_tx();
        let script = hex::decode(P2PKH_SCRIPT).unwrap();
        assert_eq!(calc_signature_hash(&tx, 2, &script, SIG_HASH_ALL), sighash_one());
        tx.outputs.truncate(1);
        assert_eq!(calc_signature_hash(&tx, 1, &script, SIG_HASH_SINGLE), sighash_one());
        assert_ne!(calc_signature_hash(&tx, 0, &script, SIG_HASH_SINGLE), sighash_one());
    }

    #[test]
    fn test_script_code_sensitivity() {
        let tx = two_by_two_tx();
        let script = hex::decode(P2PKH_SCRIPT).unwrap();
        let digest = calc_signature_hash(&tx, 0, &script, SIG_HASH_ALL);
        assert_eq!(digest, calc_signature_hash(&tx, 0, &script, SIG_HASH_ALL));
        for i in 0..script.len() {
            let mut mutated = script.clone();
            mutated[i] ^= 0x01;
            if mutated[i] == OP_CODESEPARATOR {
                continue;
            }
            assert_ne!(calc_signature_hash(&tx, 0, &mutated, SIG_HASH_ALL), digest, "mutation at byte {i}");
        }
    }

    #[test]
    fn test_strip_code_separators() {
        struct Test {
            name: &'static str,
            script: Vec<u8>,
            expected: Vec<u8>,
        }
        let tests = vec![
            Test { name: "no separators", script: vec![0x76, 0xa9], expected: vec![0x76, 0xa9] },
            Test { name: "bare separators", script: vec![0xab, 0x51, 0xab, 0xac], expected: vec![0x51, 0xac] },
            Test { name: "separator inside push data is kept", script: vec![0x02, 0xab, 0xab, 0xab], expected: vec![0x02, 0xab, 0xab] },
            Test { name: "pushdata1", script: vec![0x4c, 0x01, 0xab, 0xab], expected: vec![0x4c, 0x01, 0xab] },
            Test { name: "truncated push is kept verbatim", script: vec![0xab, 0x05, 0xab], expected: vec![0x05, 0xab] },
        ];
        for test in tests {
            assert_eq!(strip_code_separators(&test.script), test.expected, "{}", test.name);
        }
    }
}

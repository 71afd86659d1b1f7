use super::HasherExtensions;
use crate::tx::{Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput};
use alba_hashes::{Hasher, HasherBase};

/// Not intended for direct use by clients. Instead use `tx.id()`
pub fn id(tx: &Transaction) -> TransactionId {
    let mut hasher = alba_hashes::TransactionID::new();
    write_transaction(&mut hasher, tx);
    hasher.finalize().reversed()
}

/// Not intended for direct use by clients. Instead use `tx.serialize()`
pub fn serialize(tx: &Transaction) -> Vec<u8> {
    let mut buf = Vec::new();
    write_transaction(&mut buf, tx);
    buf
}

/// Write the legacy serialization of the transaction into the provided hasher
pub(crate) fn write_transaction<T: HasherBase>(hasher: &mut T, tx: &Transaction) {
    hasher.write_u32(tx.version).write_compact_size(tx.inputs.len());
    for input in tx.inputs.iter() {
        write_input(hasher, input);
    }

    hasher.write_compact_size(tx.outputs.len());
    for output in tx.outputs.iter() {
        write_output(hasher, output);
    }

    hasher.update(tx.lock_time.raw());
}

#[inline(always)]
fn write_input<T: HasherBase>(hasher: &mut T, input: &TransactionInput) {
    write_outpoint(hasher, &input.previous_outpoint);
    hasher.write_var_bytes(&input.signature_script).write_u32(input.sequence);
}

/// Outpoints are stored in display order and written in wire order
#[inline(always)]
pub(crate) fn write_outpoint<T: HasherBase>(hasher: &mut T, outpoint: &TransactionOutpoint) {
    hasher.update(outpoint.transaction_id.reversed()).write_u32(outpoint.index);
}

#[inline(always)]
pub(crate) fn write_output<T: HasherBase>(hasher: &mut T, output: &TransactionOutput) {
    hasher.write_u64(output.value).write_var_bytes(&output.script_public_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{LockTime, TransactionInput, TransactionOutpoint};
    use std::str::FromStr;

    fn bitcoin_genesis_coinbase() -> Transaction {
        let signature_script = hex::decode(concat!(
            "04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72",
            "206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73"
        ))
        .unwrap();
        let script_public_key = hex::decode(concat!(
            "4104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38",
            "c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac"
        ))
        .unwrap();
        Transaction::new(
            1,
            vec![TransactionInput::new(TransactionOutpoint::new(TransactionId::ZERO, u32::MAX), signature_script, u32::MAX)],
            vec![TransactionOutput::new(50 * 100_000_000, script_public_key)],
            LockTime::UNLOCKED,
        )
    }

    #[test]
    fn test_genesis_coinbase_id() {
        let tx = bitcoin_genesis_coinbase();
        assert_eq!(tx.id(), TransactionId::from_str("4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b").unwrap());
        assert_eq!(tx.serialize().len(), 204);
    }

    #[test]
    fn test_outpoint_written_in_wire_order() {
        let outpoint = TransactionOutpoint::new(TransactionId::from_le_u64(0x0102), 5);
        let mut buf = Vec::new();
        write_outpoint(&mut buf, &outpoint);
        assert_eq!(buf.len(), 36);
        // Display-order first byte is 0x02, so the wire order ends with it
        assert_eq!(buf[31], 0x02);
        assert_eq!(buf[30], 0x01);
        assert_eq!(&buf[32..], &[5, 0, 0, 0]);
    }
}

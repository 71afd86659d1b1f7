//! Decoding of legacy Bitcoin transactions.

use crate::{
    errors::{TxParseError, TxParseResult},
    reader::ByteReader,
    tx::{LockTime, Transaction, TransactionId, TransactionInput, TransactionOutpoint, TransactionOutput},
};
use alba_hashes::{HASH_SIZE, Hash};
use serde::Serialize;

// Smallest possible encodings, used to bound allocations driven by untrusted counts
const MIN_INPUT_SIZE: usize = HASH_SIZE + 4 + 1 + 4;
const MIN_OUTPUT_SIZE: usize = 8 + 1;

/// The single input of a commitment transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedInput {
    pub count: u64,
    pub referenced_txid: TransactionId,
    pub referenced_index: u32,
}

impl ParsedInput {
    pub fn outpoint(&self) -> TransactionOutpoint {
        TransactionOutpoint::new(self.referenced_txid, self.referenced_index)
    }
}

fn read_input_count(reader: &mut ByteReader) -> TxParseResult<u64> {
    match reader.read_compact_size()? {
        0 => Err(TxParseError::NoInputs),
        count => Ok(count),
    }
}

fn read_outpoint(reader: &mut ByteReader) -> TxParseResult<TransactionOutpoint> {
    let txid = Hash::from_bytes(reader.read_array()?).reversed();
    Ok(TransactionOutpoint::new(txid, reader.read_u32_le()?))
}

fn read_input(reader: &mut ByteReader) -> TxParseResult<TransactionInput> {
    let previous_outpoint = read_outpoint(reader)?;
    let signature_script = reader.read_var_bytes()?.to_vec();
    Ok(TransactionInput::new(previous_outpoint, signature_script, reader.read_u32_le()?))
}

fn read_output(reader: &mut ByteReader) -> TxParseResult<TransactionOutput> {
    let value = reader.read_u64_le()?;
    Ok(TransactionOutput::new(value, reader.read_var_bytes()?.to_vec()))
}

fn bounded_capacity(count: u64, reader: &ByteReader, min_size: usize) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX).min(reader.remaining() / min_size)
}

/// Parses a complete legacy serialization. Any byte after the lock time is an error.
pub fn parse_transaction(bytes: &[u8]) -> TxParseResult<Transaction> {
    let mut reader = ByteReader::new(bytes);
    let version = reader.read_u32_le()?;

    let input_count = read_input_count(&mut reader)?;
    let mut inputs = Vec::with_capacity(bounded_capacity(input_count, &reader, MIN_INPUT_SIZE));
    for _ in 0..input_count {
        inputs.push(read_input(&mut reader)?);
    }

    let output_count = reader.read_compact_size()?;
    let mut outputs = Vec::with_capacity(bounded_capacity(output_count, &reader, MIN_OUTPUT_SIZE));
    for _ in 0..output_count {
        outputs.push(read_output(&mut reader)?);
    }

    let lock_time = LockTime::from_raw(reader.read_array()?);
    if !reader.is_empty() {
        return Err(TxParseError::TrailingBytes(reader.remaining()));
    }
    Ok(Transaction::new(version, inputs, outputs, lock_time))
}

/// Reads the version and the spent outpoint of a single-input transaction. Transactions with more
/// than one input are rejected before any of their inputs is read.
pub fn parse_inputs(bytes: &[u8]) -> TxParseResult<ParsedInput> {
    let mut reader = ByteReader::new(bytes);
    reader.skip(4)?;
    let count = read_input_count(&mut reader)?;
    if count > 1 {
        return Err(TxParseError::TooManyInputs(count));
    }
    let outpoint = read_outpoint(&mut reader)?;
    Ok(ParsedInput { count, referenced_txid: outpoint.transaction_id, referenced_index: outpoint.index })
}

/// The trailing lock time field, as stored
pub fn get_timelock(bytes: &[u8]) -> TxParseResult<LockTime> {
    Ok(parse_transaction(bytes)?.lock_time)
}

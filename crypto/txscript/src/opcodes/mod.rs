use crate::{TxScriptError, TxScriptResult};

/// First value in the range formed by the "small integer" Op# opcodes
pub const OP_SMALL_INT_MIN_VAL: u8 = 1;
/// Last value in the range formed by the "small integer" Op# opcodes
pub const OP_SMALL_INT_MAX_VAL: u8 = 16;
/// First value in the range formed by OpData# opcodes (where opcode == value)
pub const OP_DATA_MIN_VAL: u8 = self::codes::OpData1;
/// Last value in the range formed by OpData# opcodes (where opcode == value)
pub const OP_DATA_MAX_VAL: u8 = self::codes::OpData75;
/// Minus 1 value
pub const OP_1_NEGATE_VAL: u8 = 0x81;

#[allow(non_upper_case_globals)]
pub mod codes {
    pub const OpFalse: u8 = 0x00;
    pub const Op0: u8 = 0x00;
    pub const OpData1: u8 = 0x01;
    pub const OpData20: u8 = 0x14;
    pub const OpData32: u8 = 0x20;
    pub const OpData33: u8 = 0x21;
    pub const OpData75: u8 = 0x4b;
    pub const OpPushData1: u8 = 0x4c;
    pub const OpPushData2: u8 = 0x4d;
    pub const OpPushData4: u8 = 0x4e;
    pub const Op1Negate: u8 = 0x4f;
    pub const OpReserved: u8 = 0x50;
    pub const OpTrue: u8 = 0x51;
    pub const Op1: u8 = 0x51;
    pub const Op2: u8 = 0x52;
    pub const Op3: u8 = 0x53;
    pub const Op16: u8 = 0x60;

    pub const OpNop: u8 = 0x61;
    pub const OpIf: u8 = 0x63;
    pub const OpNotIf: u8 = 0x64;
    pub const OpElse: u8 = 0x67;
    pub const OpEndIf: u8 = 0x68;
    pub const OpVerify: u8 = 0x69;
    pub const OpReturn: u8 = 0x6a;

    pub const OpDrop: u8 = 0x75;
    pub const OpDup: u8 = 0x76;
    pub const OpSwap: u8 = 0x7c;
    pub const OpSize: u8 = 0x82;
    pub const OpEqual: u8 = 0x87;
    pub const OpEqualVerify: u8 = 0x88;

    pub const OpRipemd160: u8 = 0xa6;
    pub const OpSha1: u8 = 0xa7;
    pub const OpSha256: u8 = 0xa8;
    pub const OpHash160: u8 = 0xa9;
    pub const OpHash256: u8 = 0xaa;
    pub const OpCodeSeparator: u8 = 0xab;
    pub const OpCheckSig: u8 = 0xac;
    pub const OpCheckSigVerify: u8 = 0xad;
    pub const OpCheckMultiSig: u8 = 0xae;
    pub const OpCheckMultiSigVerify: u8 = 0xaf;

    pub const OpCheckLockTimeVerify: u8 = 0xb1;
    pub const OpCheckSequenceVerify: u8 = 0xb2;
}

use codes::*;

/// One decoded instruction. `data` is empty for non-push opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedOpcode<'a> {
    pub opcode: u8,
    pub data: &'a [u8],
}

impl<'a> ParsedOpcode<'a> {
    pub fn is_push_opcode(&self) -> bool {
        self.opcode <= Op16 && self.opcode != OpReserved
    }

    pub fn is(&self, opcode: u8) -> bool {
        self.opcode == opcode
    }

    /// Returns the pushed bytes if this is a data push of exactly `len` bytes
    pub fn push_of(&self, len: usize) -> Option<&'a [u8]> {
        (self.opcode <= OpPushData4 && self.data.len() == len).then_some(self.data)
    }

    /// The value of a small-integer opcode
    pub fn small_int(&self) -> Option<i64> {
        match self.opcode {
            Op0 => Some(0),
            Op1Negate => Some(-1),
            Op1..=Op16 => Some((self.opcode - (Op1 - 1)) as i64),
            _ => None,
        }
    }

    /// Whether the push uses the shortest possible encoding of its data
    pub fn check_minimal_data_push(&self) -> TxScriptResult<()> {
        let data_len = self.data.len();
        let opcode = self.opcode;
        let expected = if data_len == 0 {
            OpFalse
        } else if data_len == 1 && (OP_SMALL_INT_MIN_VAL..=OP_SMALL_INT_MAX_VAL).contains(&self.data[0]) {
            Op1 - 1 + self.data[0]
        } else if data_len == 1 && self.data[0] == OP_1_NEGATE_VAL {
            Op1Negate
        } else if data_len <= OP_DATA_MAX_VAL as usize {
            data_len as u8
        } else if data_len <= u8::MAX as usize {
            OpPushData1
        } else if data_len <= u16::MAX as usize {
            OpPushData2
        } else {
            OpPushData4
        };
        if opcode != expected {
            return Err(TxScriptError::NotMinimalData(format!("data push of {data_len} bytes encoded with opcode {opcode:#04x}")));
        }
        Ok(())
    }
}

/// Iterates over the instructions of a script. A truncated push ends the iteration with an error.
pub struct ScriptIter<'a> {
    script: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for ScriptIter<'a> {
    type Item = TxScriptResult<ParsedOpcode<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let opcode = *self.script.get(self.pos)?;
        let rest = &self.script[self.pos + 1..];
        let (prefix, len) = match opcode {
            OpData1..=OpData75 => (0, opcode as usize),
            OpPushData1 => match rest.first() {
                Some(&n) => (1, n as usize),
                None => return Some(self.fail(1, 0)),
            },
            OpPushData2 => match rest.get(..2) {
                Some(n) => (2, u16::from_le_bytes([n[0], n[1]]) as usize),
                None => return Some(self.fail(2, rest.len())),
            },
            OpPushData4 => match rest.get(..4) {
                Some(n) => (4, u32::from_le_bytes([n[0], n[1], n[2], n[3]]) as usize),
                None => return Some(self.fail(4, rest.len())),
            },
            _ => (0, 0),
        };
        let Some(data) = rest.get(prefix..prefix + len) else {
            return Some(self.fail(len, rest.len().saturating_sub(prefix)));
        };
        self.pos += 1 + prefix + len;
        Some(Ok(ParsedOpcode { opcode, data }))
    }
}

impl ScriptIter<'_> {
    fn fail(&mut self, needed: usize, remaining: usize) -> TxScriptResult<ParsedOpcode<'static>> {
        self.pos = self.script.len();
        Err(TxScriptError::MalformedPush(needed, remaining))
    }
}

pub fn parse_script(script: &[u8]) -> ScriptIter<'_> {
    ScriptIter { script, pos: 0 }
}

/// Decodes the whole script, failing on the first malformed push
pub fn parse_script_strict(script: &[u8]) -> TxScriptResult<Vec<ParsedOpcode<'_>>> {
    parse_script(script).collect()
}

/// Minimal script-number encoding: little-endian magnitude, sign in the top bit of the last byte
pub fn serialize_i64(value: i64) -> Vec<u8> {
    if value == 0 {
        return vec![];
    }
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while magnitude > 0 {
        out.push((magnitude & 0xff) as u8);
        magnitude >>= 8;
    }
    if out[out.len() - 1] & 0x80 != 0 {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = out.len() - 1;
        out[last] |= 0x80;
    }
    out
}

/// Decodes a minimally encoded script number of at most `max_len` bytes
pub fn deserialize_i64(data: &[u8], max_len: usize) -> TxScriptResult<i64> {
    if data.len() > max_len {
        return Err(TxScriptError::NotMinimalData(format!("numeric value encoded as {} bytes exceeds {max_len}", data.len())));
    }
    let Some(&last) = data.last() else {
        return Ok(0);
    };
    if last & 0x7f == 0 && (data.len() == 1 || data[data.len() - 2] & 0x80 == 0) {
        return Err(TxScriptError::NotMinimalData(format!("numeric value encoded as {:02x?} is not minimally encoded", data)));
    }
    let mut magnitude: i64 = 0;
    for (i, byte) in data.iter().enumerate() {
        let byte = if i == data.len() - 1 { byte & 0x7f } else { *byte };
        magnitude |= (byte as i64) << (8 * i);
    }
    Ok(if last & 0x80 != 0 { -magnitude } else { magnitude })
}

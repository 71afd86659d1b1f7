use crate::{
    MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPTS_SIZE,
    opcodes::{OP_1_NEGATE_VAL, OP_DATA_MAX_VAL, OP_SMALL_INT_MAX_VAL, codes::*, serialize_i64},
};
use thiserror::Error;

/// Initial capacity of a builder; every template of this crate fits in it
const DEFAULT_SCRIPT_ALLOC: usize = 128;

#[derive(Error, PartialEq, Eq, Debug, Clone, Copy)]
pub enum ScriptBuilderError {
    #[error("adding opcode {0} would exceed the maximum allowed canonical script length of {MAX_SCRIPTS_SIZE}")]
    OpCodeRejected(u8),

    #[error("adding {0} opcodes would exceed the maximum allowed canonical script length of {MAX_SCRIPTS_SIZE}")]
    OpCodesRejected(usize),

    #[error("adding {0} bytes of data would exceed the maximum allowed canonical script length of {MAX_SCRIPTS_SIZE}")]
    DataRejected(usize),

    #[error("adding a data element of {0} bytes exceed the maximum allowed script element size of {MAX_SCRIPT_ELEMENT_SIZE}")]
    ElementExceedsMaxSize(usize),
}
pub type ScriptBuilderResult<T> = std::result::Result<T, ScriptBuilderError>;

/// Builds scripts out of opcodes, integers and data, always choosing the canonical (BIP62) push
/// for the data. The funding script of a channel, for example:
///
/// ```
/// use alba_txscript::opcodes::codes::*;
/// use alba_txscript::script_builder::{ScriptBuilderResult, ScriptBuilder};
/// fn funding_script(pk_p: &[u8], pk_v: &[u8]) -> ScriptBuilderResult<Vec<u8>> {
///     Ok(ScriptBuilder::new().add_op(Op2)?.add_data(pk_p)?.add_data(pk_v)?.add_op(Op2)?.add_op(OpCheckMultiSig)?.drain())
/// }
/// ```
pub struct ScriptBuilder {
    script: Vec<u8>,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { script: Vec::with_capacity(DEFAULT_SCRIPT_ALLOC) }
    }

    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Takes the script out of the builder, which is left empty
    pub fn drain(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.script)
    }

    pub fn add_op(&mut self, opcode: u8) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() >= MAX_SCRIPTS_SIZE {
            return Err(ScriptBuilderError::OpCodeRejected(opcode));
        }
        self.script.push(opcode);
        Ok(self)
    }

    pub fn add_ops(&mut self, opcodes: &[u8]) -> ScriptBuilderResult<&mut Self> {
        if self.script.len() + opcodes.len() > MAX_SCRIPTS_SIZE {
            return Err(ScriptBuilderError::OpCodesRejected(opcodes.len()));
        }
        self.script.extend_from_slice(opcodes);
        Ok(self)
    }

    /// Returns the number of bytes the canonical encoding of the data will take.
    pub fn canonical_data_size(data: &[u8]) -> usize {
        let data_len = data.len();
        if data_len == 0 || (data_len == 1 && (data[0] <= OP_SMALL_INT_MAX_VAL || data[0] == OP_1_NEGATE_VAL)) {
            return 1;
        }
        data_len
            + if data_len <= OP_DATA_MAX_VAL as usize {
                1
            } else if data_len <= u8::MAX as usize {
                2
            } else if data_len <= u16::MAX as usize {
                3
            } else {
                5
            }
    }

    fn add_raw_data(&mut self, data: &[u8]) -> &mut Self {
        let data_len = data.len();
        match data {
            [] | [0] => {
                self.script.push(Op0);
                return self;
            }
            [n] if *n <= OP_SMALL_INT_MAX_VAL => {
                self.script.push(Op1 - 1 + *n);
                return self;
            }
            [OP_1_NEGATE_VAL] => {
                self.script.push(Op1Negate);
                return self;
            }
            _ => {}
        }

        if data_len <= OP_DATA_MAX_VAL as usize {
            self.script.push(data_len as u8);
        } else if data_len <= u8::MAX as usize {
            self.script.extend([OpPushData1, data_len as u8]);
        } else if data_len <= u16::MAX as usize {
            self.script.push(OpPushData2);
            self.script.extend((data_len as u16).to_le_bytes());
        } else {
            self.script.push(OpPushData4);
            self.script.extend((data_len as u32).to_le_bytes());
        }
        self.script.extend_from_slice(data);
        self
    }

    /// Pushes `data` with its canonical encoding. Pushes above [`MAX_SCRIPT_ELEMENT_SIZE`], or
    /// ones that would grow the script beyond [`MAX_SCRIPTS_SIZE`], leave the script unchanged.
    pub fn add_data(&mut self, data: &[u8]) -> ScriptBuilderResult<&mut Self> {
        let data_size = Self::canonical_data_size(data);
        if self.script.len() + data_size > MAX_SCRIPTS_SIZE {
            return Err(ScriptBuilderError::DataRejected(data_size));
        }
        if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
            return Err(ScriptBuilderError::ElementExceedsMaxSize(data.len()));
        }
        Ok(self.add_raw_data(data))
    }

    /// Pushes `val` as a script number, using a small-integer opcode when one exists
    pub fn add_i64(&mut self, val: i64) -> ScriptBuilderResult<&mut Self> {
        match val {
            0 => self.add_op(Op0),
            -1 => self.add_op(Op1Negate),
            1..=16 => self.add_op(Op1 - 1 + val as u8),
            _ => self.add_data(&serialize_i64(val)),
        }
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

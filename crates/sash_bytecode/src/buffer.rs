//! Append-only byte buffer with big-endian fixed-width writes.
//!
//! Forward jumps are written as a placeholder and back-patched once the
//! target is known: [`CodeBuffer::put_jump`] returns the offset of the
//! 16-bit operand, and [`CodeBuffer::patch_jump`] later overwrites it.

use crate::error::EmitError;
use crate::opcode::Opcode;

/// Written into a jump operand until it is patched.
pub const JUMP_PLACEHOLDER: i16 = i16::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    // ========================================================================
    // Raw appends
    // ========================================================================

    pub fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i16(&mut self, value: i16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    // ========================================================================
    // Instructions
    // ========================================================================

    pub fn put_op(&mut self, opcode: Opcode) {
        self.put_u8(opcode.as_byte());
    }

    /// Write an opcode with a u16 index or count operand.
    pub fn put_op_u16(&mut self, opcode: Opcode, operand: usize, what: &'static str) -> Result<(), EmitError> {
        let operand = to_u16(operand, what)?;
        self.put_op(opcode);
        self.put_u16(operand);
        Ok(())
    }

    /// Write a forward jump with a placeholder offset. Returns the position
    /// of the operand for [`CodeBuffer::patch_jump`].
    pub fn put_jump(&mut self, opcode: Opcode) -> usize {
        debug_assert!(opcode.is_jump());
        self.put_op(opcode);
        let operand = self.len();
        self.put_i16(JUMP_PLACEHOLDER);
        operand
    }

    /// Write a jump to an already known address.
    pub fn put_jump_to(&mut self, opcode: Opcode, target: usize) -> Result<(), EmitError> {
        debug_assert!(opcode.is_jump());
        let operand = self.len() + 1;
        let offset = jump_offset(operand, target)?;
        self.put_op(opcode);
        self.put_i16(offset);
        Ok(())
    }

    /// Point the jump whose operand sits at `operand` to `target`.
    pub fn patch_jump(&mut self, operand: usize, target: usize) -> Result<(), EmitError> {
        let offset = jump_offset(operand, target)?;
        self.set_i16(operand, offset)
    }

    /// Point the jump at `operand` to the current end of the buffer.
    pub fn patch_jump_here(&mut self, operand: usize) -> Result<(), EmitError> {
        self.patch_jump(operand, self.len())
    }

    // ========================================================================
    // Overwrites
    // ========================================================================

    pub fn set_i16(&mut self, offset: usize, value: i16) -> Result<(), EmitError> {
        self.set_2_bytes(offset, value.to_be_bytes())
    }

    pub fn set_u16(&mut self, offset: usize, value: u16) -> Result<(), EmitError> {
        self.set_2_bytes(offset, value.to_be_bytes())
    }

    fn set_2_bytes(&mut self, offset: usize, bytes: [u8; 2]) -> Result<(), EmitError> {
        let len = self.bytes.len();
        let field = self
            .bytes
            .get_mut(offset..offset.saturating_add(2))
            .ok_or(EmitError::PatchOutOfBounds { offset, len })?;
        field.copy_from_slice(&bytes);
        Ok(())
    }
}

/// Relative offset from the end of a jump operand at `operand` to `target`.
fn jump_offset(operand: usize, target: usize) -> Result<i16, EmitError> {
    let offset = target as i64 - (operand as i64 + 2);
    i16::try_from(offset).map_err(|_| EmitError::ValueOutOfRange {
        what: "jump offset",
        value: offset,
        width: "i16",
    })
}

/// Narrow an index or count to an unsigned 16-bit operand.
pub fn to_u16(value: usize, what: &'static str) -> Result<u16, EmitError> {
    u16::try_from(value).map_err(|_| EmitError::ValueOutOfRange {
        what,
        value: value as i64,
        width: "u16",
    })
}

/// Narrow a small count to an unsigned 8-bit operand.
pub fn to_u8(value: usize, what: &'static str) -> Result<u8, EmitError> {
    u8::try_from(value).map_err(|_| EmitError::ValueOutOfRange {
        what,
        value: value as i64,
        width: "u8",
    })
}

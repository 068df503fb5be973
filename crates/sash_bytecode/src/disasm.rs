//! Decoding of emitted bytecode.
//!
//! `disassemble` walks an instruction stream with the fixed operand table
//! and fails on unknown opcodes or truncated operands, so a successful
//! decode proves the stream is well formed.

use crate::constant_pool::{tag, Constant, ConstantPool, FunctionPointer};
use crate::error::DecodeError;
use crate::opcode::{Opcode, OperandShape};
use std::fmt;

/// One captured binding in a CLOSURE instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capture {
    /// Whether `index` is a local slot of the enclosing frame rather than
    /// one of its own free variables.
    pub is_local: bool,
    pub index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    None,
    Jump { offset: i16, target: i64 },
    Index(u16),
    Count(u16),
    Captures(Vec<Capture>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub operand: Operand,
    /// Encoded size including the opcode byte.
    pub size: usize,
}

impl Instruction {
    /// Absolute target address of a jump.
    pub fn jump_target(&self) -> Option<i64> {
        match self.operand {
            Operand::Jump { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The u16 index of a load, store or CONSTANT.
    pub fn index(&self) -> Option<u16> {
        match self.operand {
            Operand::Index(index) => Some(index),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}  {}", self.offset, self.opcode)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Jump { target, .. } => write!(f, " -> {:04}", target),
            Operand::Index(index) => write!(f, " {}", index),
            Operand::Count(count) => write!(f, " {}", count),
            Operand::Captures(captures) => {
                write!(f, " {} [", captures.len())?;
                for (i, capture) in captures.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let kind = if capture.is_local { "local" } else { "free" };
                    write!(f, "{} {}", kind, capture.index)?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// Reader
// ============================================================================

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let slice = self
            .bytes
            .get(start..start + n)
            .ok_or(DecodeError::Truncated { what, offset: start })?;
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, what)?);
        Ok(out)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, DecodeError> {
        Ok(self.array::<1>(what)?[0])
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, DecodeError> {
        self.array(what).map(u16::from_be_bytes)
    }

    fn i16(&mut self, what: &'static str) -> Result<i16, DecodeError> {
        self.array(what).map(i16::from_be_bytes)
    }

    fn i32(&mut self, what: &'static str) -> Result<i32, DecodeError> {
        self.array(what).map(i32::from_be_bytes)
    }

    fn i64(&mut self, what: &'static str) -> Result<i64, DecodeError> {
        self.array(what).map(i64::from_be_bytes)
    }
}

// ============================================================================
// Instructions
// ============================================================================

/// Decode a whole instruction stream.
pub fn disassemble(code: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut reader = Reader::new(code);
    let mut instructions = Vec::new();
    while !reader.is_at_end() {
        instructions.push(decode_instruction(&mut reader)?);
    }
    Ok(instructions)
}

fn decode_instruction(reader: &mut Reader<'_>) -> Result<Instruction, DecodeError> {
    let offset = reader.pos;
    let byte = reader.u8("opcode")?;
    let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { byte, offset })?;

    let operand = match opcode.shape() {
        OperandShape::None => Operand::None,
        OperandShape::Jump => {
            let jump = reader.i16("jump offset")?;
            Operand::Jump {
                offset: jump,
                target: reader.pos as i64 + jump as i64,
            }
        }
        OperandShape::Index => Operand::Index(reader.u16("index")?),
        OperandShape::Count => Operand::Count(reader.u16("count")?),
        OperandShape::Captures => {
            let count = reader.u16("capture count")?;
            let mut captures = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let is_local = reader.u8("capture kind")? != 0;
                let index = reader.u16("capture index")?;
                captures.push(Capture { is_local, index });
            }
            Operand::Captures(captures)
        }
    };

    Ok(Instruction {
        offset,
        opcode,
        operand,
        size: reader.pos - offset,
    })
}

// ============================================================================
// Constant pool
// ============================================================================

/// Read a constant pool from the front of `bytes`. Returns the pool and the
/// number of bytes it occupied.
pub fn decode_constant_pool(bytes: &[u8]) -> Result<(ConstantPool, usize), DecodeError> {
    let mut reader = Reader::new(bytes);
    let count = reader.u16("constant count")?;
    let mut pool = ConstantPool::new();
    for _ in 0..count {
        let offset = reader.pos;
        if !pool.push_decoded(decode_constant(&mut reader)?) {
            return Err(DecodeError::DuplicateConstant { offset });
        }
    }
    Ok((pool, reader.pos))
}

fn decode_constant(reader: &mut Reader<'_>) -> Result<Constant, DecodeError> {
    let offset = reader.pos;
    let constant = match reader.u8("constant tag")? {
        tag::INT => Constant::Int(reader.i32("int constant")?),
        tag::DOUBLE => Constant::Double(reader.i64("double constant")? as u64),
        tag::STRING => {
            let len = reader.u16("string length")? as usize;
            let start = reader.pos;
            let bytes = reader.take(len, "string constant")?;
            let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset: start })?;
            Constant::String(text.to_string())
        }
        tag::FLOAT => Constant::Float(reader.i32("float constant")? as u32),
        tag::LONG => Constant::Long(reader.i64("long constant")?),
        tag::FUNCTION => {
            let entry = reader.u16("function entry")?;
            let arity = reader.u8("function arity")?;
            Constant::Function(FunctionPointer { entry, arity })
        }
        tag => return Err(DecodeError::UnknownConstantTag { tag, offset }),
    };
    Ok(constant)
}

/// Read the global count that follows the pool.
pub(crate) fn decode_u16(bytes: &[u8], what: &'static str) -> Result<u16, DecodeError> {
    Reader::new(bytes).u16(what)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::CodeBuffer;

    #[test]
    fn test_decode_simple_stream() {
        let code = [
            Opcode::Constant as u8, 0, 3,
            Opcode::Print as u8,
            Opcode::Halt as u8,
        ];
        let instructions = disassemble(&code).unwrap();
        assert_eq!(instructions.len(), 3);
        assert_eq!(instructions[0].opcode, Opcode::Constant);
        assert_eq!(instructions[0].index(), Some(3));
        assert_eq!(instructions[0].size, 3);
        assert_eq!(instructions[1].offset, 3);
        assert_eq!(instructions[2].opcode, Opcode::Halt);
    }

    #[test]
    fn test_jump_targets_are_absolute() {
        let mut buf = CodeBuffer::new();
        buf.put_op(Opcode::PushTrue);
        let operand = buf.put_jump(Opcode::GotoDropFalse);
        buf.put_op(Opcode::PushFalse);
        buf.patch_jump_here(operand).unwrap();
        buf.put_jump_to(Opcode::Goto, 0).unwrap();

        let instructions = disassemble(buf.as_bytes()).unwrap();
        assert_eq!(instructions[1].jump_target(), Some(5));
        assert_eq!(instructions[3].jump_target(), Some(0));
        assert_eq!(instructions[3].to_string(), "0005  GOTO -> 0000");
    }

    #[test]
    fn test_closure_operands() {
        let code = [Opcode::Closure as u8, 0, 2, 1, 0, 4, 0, 0, 1];
        let instructions = disassemble(&code).unwrap();
        assert_eq!(
            instructions[0].operand,
            Operand::Captures(vec![
                Capture { is_local: true, index: 4 },
                Capture { is_local: false, index: 1 },
            ])
        );
        assert_eq!(instructions[0].size, code.len());
        assert_eq!(instructions[0].to_string(), "0000  CLOSURE 2 [local 4, free 1]");
    }

    #[test]
    fn test_truncated_operand() {
        let code = [Opcode::GetLocal as u8, 0];
        assert_eq!(
            disassemble(&code),
            Err(DecodeError::Truncated { what: "index", offset: 1 })
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let code = [Opcode::Pop as u8, 99];
        assert_eq!(
            disassemble(&code),
            Err(DecodeError::UnknownOpcode { byte: 99, offset: 1 })
        );
    }

    #[test]
    fn test_decode_constant_pool() {
        let mut pool = ConstantPool::new();
        pool.add(Constant::Long(-9)).unwrap();
        pool.add(Constant::String("hi".into())).unwrap();
        pool.add(Constant::double(0.25)).unwrap();
        let mut out = CodeBuffer::new();
        pool.write(&mut out);
        out.put_u16(2);

        let (decoded, used) = decode_constant_pool(out.as_bytes()).unwrap();
        assert_eq!(decoded, pool);
        assert_eq!(used, out.len() - 2);
    }

    #[test]
    fn test_duplicate_constant_is_rejected() {
        let mut out = CodeBuffer::new();
        out.put_u16(2);
        for _ in 0..2 {
            out.put_u8(tag::INT);
            out.put_i32(5);
        }
        assert_eq!(
            decode_constant_pool(out.as_bytes()).map(|(pool, _)| pool.len()),
            Err(DecodeError::DuplicateConstant { offset: 7 })
        );
    }

    #[test]
    fn test_unknown_constant_tag() {
        let bytes = [0, 1, 9];
        assert_eq!(
            decode_constant_pool(&bytes).map(|(pool, _)| pool.len()),
            Err(DecodeError::UnknownConstantTag { tag: 9, offset: 2 })
        );
    }
}

//! The program image consumed by the VM.
//!
//! Layout: constant pool (`u16 count`, entries), `u16` global count, then
//! the instruction stream ending in HALT.

use crate::buffer::CodeBuffer;
use crate::constant_pool::ConstantPool;
use crate::disasm::{decode_constant_pool, decode_u16, disassemble, Instruction};
use crate::error::DecodeError;
use std::fmt;
use std::io;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub constants: ConstantPool,
    pub global_count: u16,
    pub code: Vec<u8>,
}

impl ProgramImage {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = CodeBuffer::with_capacity(self.code.len() + 64);
        self.constants.write(&mut out);
        out.put_u16(self.global_count);
        out.put_bytes(&self.code);
        out.into_bytes()
    }

    pub fn write_to(&self, mut writer: impl io::Write) -> io::Result<()> {
        writer.write_all(&self.to_bytes())?;
        writer.flush()
    }

    /// Parse an image and check that its code decodes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (constants, pool_len) = decode_constant_pool(bytes)?;
        let global_count = decode_u16(&bytes[pool_len..], "global count").map_err(|_| DecodeError::Truncated {
            what: "global count",
            offset: pool_len,
        })?;
        let code = bytes[pool_len + 2..].to_vec();
        disassemble(&code)?;
        Ok(Self {
            constants,
            global_count,
            code,
        })
    }

    /// A human-readable listing of the pool, the global count and the code.
    pub fn listing(&self) -> Result<String, DecodeError> {
        let listing = Listing {
            image: self,
            instructions: disassemble(&self.code)?,
        };
        Ok(listing.to_string())
    }
}

/// An image whose code has already been decoded.
struct Listing<'a> {
    image: &'a ProgramImage,
    instructions: Vec<Instruction>,
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "constants ({}):", self.image.constants.len())?;
        for (index, constant) in self.image.constants.iter().enumerate() {
            writeln!(f, "  #{:<4} {}", index, constant)?;
        }
        writeln!(f, "globals: {}", self.image.global_count)?;
        writeln!(f, "code ({} bytes):", self.image.code.len())?;
        for instruction in &self.instructions {
            writeln!(f, "  {}", instruction)?;
        }
        Ok(())
    }
}

//! sash_bytecode: The binary contract between the compiler and the VM.
//!
//! Defines the opcode table, the append-only code buffer with its
//! back-patching support, the deduplicating constant pool, and the program
//! image layout. A disassembler decodes emitted code with the same operand
//! table the VM uses.

pub mod buffer;
pub mod constant_pool;
pub mod disasm;
pub mod error;
pub mod image;
pub mod opcode;

pub use buffer::CodeBuffer;
pub use constant_pool::{Constant, ConstantPool, FunctionPointer};
pub use disasm::{decode_constant_pool, disassemble, Capture, Instruction, Operand};
pub use error::{DecodeError, EmitError};
pub use image::ProgramImage;
pub use opcode::{Opcode, OperandShape};

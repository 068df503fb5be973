//! Fatal errors of the back end.
//!
//! None of these are user-facing diagnostics. An `EmitError` means the
//! bound tree broke a contract the binder is supposed to guarantee, or the
//! program outgrew a fixed-width field of the binary format.

use sash_core::text::TextSpan;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("{what} {value} does not fit in {width}")]
    ValueOutOfRange {
        what: &'static str,
        value: i64,
        width: &'static str,
    },

    #[error("cannot patch a 16-bit field at offset {offset}: buffer holds {len} bytes")]
    PatchOutOfBounds { offset: usize, len: usize },

    #[error("constant pool is full ({max} entries)")]
    ConstantPoolOverflow { max: usize },

    #[error("string constant is {len} bytes long, the limit is {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("symbol '{name}' has no global, local or free slot")]
    UnresolvedSymbol { name: String },

    #[error("error node at {span} reached the emitter")]
    ErrorNode { span: TextSpan },

    #[error("too many {kind} slots")]
    SlotOverflow { kind: &'static str },

    #[error("'{keyword}' at {span} has no enclosing loop")]
    JumpOutsideLoop { keyword: &'static str, span: TextSpan },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { byte: u8, offset: usize },

    #[error("unexpected end of input reading {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("unknown constant tag {tag} at offset {offset}")]
    UnknownConstantTag { tag: u8, offset: usize },

    #[error("string constant at offset {offset} is not valid UTF-8")]
    InvalidUtf8 { offset: usize },

    #[error("constant at offset {offset} repeats an earlier entry")]
    DuplicateConstant { offset: usize },

    #[error("{count} trailing bytes after the program at offset {offset}")]
    TrailingBytes { count: usize, offset: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EmitError::ValueOutOfRange {
            what: "jump offset",
            value: 40000,
            width: "i16",
        };
        assert_eq!(err.to_string(), "jump offset 40000 does not fit in i16");

        let err = EmitError::ErrorNode {
            span: TextSpan::new(4, 2),
        };
        assert_eq!(err.to_string(), "error node at [4, 6) reached the emitter");

        let err = DecodeError::UnknownOpcode { byte: 0xff, offset: 7 };
        assert_eq!(err.to_string(), "unknown opcode 0xff at offset 7");
    }
}

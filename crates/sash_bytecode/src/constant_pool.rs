//! The deduplicating constant pool.
//!
//! Entries are interned by value, so every occurrence of an equal literal
//! or function pointer shares one index. Floating-point values are keyed by
//! their bit pattern.

use crate::buffer::CodeBuffer;
use crate::error::EmitError;
use sash_core::FxIndexSet;
use std::fmt;
use tracing::trace;

/// Tag bytes that prefix each encoded entry.
pub mod tag {
    pub const INT: u8 = 0;
    pub const DOUBLE: u8 = 1;
    pub const STRING: u8 = 2;
    pub const FLOAT: u8 = 3;
    pub const LONG: u8 = 4;
    pub const FUNCTION: u8 = 5;
}

/// Entry point and arity of a compiled function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionPointer {
    pub entry: u16,
    pub arity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Int(i32),
    /// An `f64` stored as its bits.
    Double(u64),
    String(String),
    /// An `f32` stored as its bits.
    Float(u32),
    Long(i64),
    Function(FunctionPointer),
}

impl Constant {
    pub fn double(value: f64) -> Self {
        Constant::Double(value.to_bits())
    }

    pub fn float(value: f32) -> Self {
        Constant::Float(value.to_bits())
    }

    pub fn tag(&self) -> u8 {
        match self {
            Constant::Int(_) => tag::INT,
            Constant::Double(_) => tag::DOUBLE,
            Constant::String(_) => tag::STRING,
            Constant::Float(_) => tag::FLOAT,
            Constant::Long(_) => tag::LONG,
            Constant::Function(_) => tag::FUNCTION,
        }
    }

    fn encode(&self, out: &mut CodeBuffer) {
        out.put_u8(self.tag());
        match self {
            Constant::Int(value) => out.put_i32(*value),
            Constant::Double(bits) => out.put_i64(*bits as i64),
            Constant::String(value) => {
                // Length is checked when the string is interned.
                out.put_u16(value.len() as u16);
                out.put_bytes(value.as_bytes());
            }
            Constant::Float(bits) => out.put_i32(*bits as i32),
            Constant::Long(value) => out.put_i64(*value),
            Constant::Function(pointer) => {
                out.put_u16(pointer.entry);
                out.put_u8(pointer.arity);
            }
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(value) => write!(f, "INT {}", value),
            Constant::Double(bits) => write!(f, "DOUBLE {:?}", f64::from_bits(*bits)),
            Constant::String(value) => write!(f, "STRING {:?}", value),
            Constant::Float(bits) => write!(f, "FLOAT {:?}", f32::from_bits(*bits)),
            Constant::Long(value) => write!(f, "LONG {}", value),
            Constant::Function(pointer) => write!(f, "FUNCTION entry={} arity={}", pointer.entry, pointer.arity),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    entries: FxIndexSet<Constant>,
}

impl ConstantPool {
    /// Entry count is written as a u16.
    pub const MAX_ENTRIES: usize = u16::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a constant and return its index.
    pub fn add(&mut self, constant: Constant) -> Result<u16, EmitError> {
        if let Some(index) = self.entries.get_index_of(&constant) {
            return Ok(index as u16);
        }
        if self.entries.len() >= Self::MAX_ENTRIES {
            return Err(EmitError::ConstantPoolOverflow {
                max: Self::MAX_ENTRIES,
            });
        }
        if let Constant::String(value) = &constant {
            if value.len() > u16::MAX as usize {
                return Err(EmitError::StringTooLong {
                    len: value.len(),
                    max: u16::MAX as usize,
                });
            }
        }

        trace!(index = self.entries.len(), constant = %constant, "new constant");
        let (index, _) = self.entries.insert_full(constant);
        Ok(index as u16)
    }

    /// Append a decoded entry. Returns false, leaving the pool unchanged,
    /// if an equal entry is already present: indices would shift.
    pub(crate) fn push_decoded(&mut self, constant: Constant) -> bool {
        self.entries.insert(constant)
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get_index(index as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    /// Append `u16 count` and every entry in index order.
    pub fn write(&self, out: &mut CodeBuffer) {
        out.put_u16(self.entries.len() as u16);
        for constant in &self.entries {
            constant.encode(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_values_share_an_index() {
        let mut pool = ConstantPool::new();
        let hi = pool.add(Constant::String("hi".into())).unwrap();
        let one = pool.add(Constant::Int(1)).unwrap();
        assert_eq!(pool.add(Constant::String("hi".into())).unwrap(), hi);
        assert_eq!(pool.add(Constant::Int(1)).unwrap(), one);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_same_bits_different_kinds_are_distinct() {
        let mut pool = ConstantPool::new();
        let int = pool.add(Constant::Int(0)).unwrap();
        let long = pool.add(Constant::Long(0)).unwrap();
        let float = pool.add(Constant::float(0.0)).unwrap();
        assert_ne!(int, long);
        assert_ne!(long, float);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_function_pointers_are_deduplicated() {
        let mut pool = ConstantPool::new();
        let f = FunctionPointer { entry: 3, arity: 1 };
        let a = pool.add(Constant::Function(f)).unwrap();
        let b = pool.add(Constant::Function(f)).unwrap();
        let c = pool.add(Constant::Function(FunctionPointer { entry: 3, arity: 2 })).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_encoding() {
        let mut pool = ConstantPool::new();
        pool.add(Constant::Int(-1)).unwrap();
        pool.add(Constant::String("é".into())).unwrap();
        pool.add(Constant::Function(FunctionPointer { entry: 0x0102, arity: 3 })).unwrap();
        pool.add(Constant::float(1.0)).unwrap();

        let mut out = CodeBuffer::new();
        pool.write(&mut out);
        assert_eq!(
            out.as_bytes(),
            &[
                0, 4, // count
                tag::INT, 0xff, 0xff, 0xff, 0xff,
                tag::STRING, 0, 2, 0xc3, 0xa9,
                tag::FUNCTION, 0x01, 0x02, 3,
                tag::FLOAT, 0x3f, 0x80, 0, 0,
            ]
        );
    }

    #[test]
    fn test_double_encoding_uses_bits() {
        let mut pool = ConstantPool::new();
        pool.add(Constant::double(2.0)).unwrap();
        let mut out = CodeBuffer::new();
        pool.write(&mut out);
        assert_eq!(out.as_bytes(), &[0, 1, tag::DOUBLE, 0x40, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_string_too_long() {
        let mut pool = ConstantPool::new();
        let err = pool.add(Constant::String("x".repeat(70_000))).unwrap_err();
        assert!(matches!(err, EmitError::StringTooLong { len: 70_000, .. }));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_overflow() {
        let mut pool = ConstantPool::new();
        for i in 0..ConstantPool::MAX_ENTRIES {
            pool.add(Constant::Int(i as i32)).unwrap();
        }
        // Existing entries still resolve.
        assert_eq!(pool.add(Constant::Int(7)).unwrap(), 7);
        assert_eq!(
            pool.add(Constant::Int(-1)),
            Err(EmitError::ConstantPoolOverflow { max: 65_535 })
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Constant::Int(5).to_string(), "INT 5");
        assert_eq!(Constant::double(1.5).to_string(), "DOUBLE 1.5");
        assert_eq!(Constant::String("a\"b".into()).to_string(), "STRING \"a\\\"b\"");
        assert_eq!(
            Constant::Function(FunctionPointer { entry: 9, arity: 0 }).to_string(),
            "FUNCTION entry=9 arity=0"
        );
    }
}

//! Opcode definitions for the sash VM.
//!
//! Each instruction is one opcode byte followed by a fixed operand layout
//! given by [`Opcode::shape`]. The byte values are part of the wire format
//! and must never be renumbered.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // =========================================================================
    // Jumps (0-4), all with an i16 offset relative to the next instruction
    // =========================================================================
    /// Jump if the top is false, otherwise drop it. Short-circuit `&&`.
    GotoFalseOrDrop = 0,
    /// Jump if the top is true, otherwise drop it. Short-circuit `||`.
    GotoTrueOrDrop = 1,
    /// Pop and jump if false.
    GotoDropFalse = 2,
    /// Pop and jump if true.
    GotoDropTrue = 3,
    Goto = 4,

    // =========================================================================
    // Stack values (5-7)
    // =========================================================================
    /// Pop a captured local, moving it into its closure cell.
    CloseFree = 5,
    PushFalse = 6,
    PushTrue = 7,

    // =========================================================================
    // Arithmetic (8-12)
    // =========================================================================
    Add = 8,
    Sub = 9,
    Mul = 10,
    Div = 11,
    Neg = 12,

    // =========================================================================
    // Loads and stores (13-18), all with a u16 slot index
    // =========================================================================
    GetGlobal = 13,
    SetGlobal = 14,
    GetFree = 15,
    SetFree = 16,
    GetLocal = 17,
    SetLocal = 18,

    // =========================================================================
    // Calls (19-20)
    // =========================================================================
    Return = 19,
    /// Call the function on top of the stack. Arity comes from the callee.
    Call = 20,

    // =========================================================================
    // Comparison and logic (21-24)
    // =========================================================================
    Greater = 21,
    Equals = 22,
    Less = 23,
    Not = 24,

    // =========================================================================
    // Misc (25-30)
    // =========================================================================
    /// Concatenate the top N values into one string.
    Concat = 25,
    Print = 26,
    /// Push a constant pool entry.
    Constant = 27,
    /// Turn the function pointer on top of the stack into a closure.
    Closure = 28,
    Pop = 29,
    Halt = 30,
}

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandShape {
    None,
    /// Signed 16-bit offset from the end of the instruction.
    Jump,
    /// Unsigned 16-bit slot or constant index.
    Index,
    /// Unsigned 16-bit operand count.
    Count,
    /// u16 count followed by `count` entries of `{u8 is_local, u16 index}`.
    Captures,
}

impl OperandShape {
    /// Size in bytes of a fixed-size operand. `Captures` reports its header only.
    pub fn fixed_size(self) -> usize {
        match self {
            OperandShape::None => 0,
            OperandShape::Jump | OperandShape::Index | OperandShape::Count | OperandShape::Captures => 2,
        }
    }
}

impl Opcode {
    /// Every opcode, indexed by its byte value.
    pub const ALL: [Opcode; 31] = [
        Opcode::GotoFalseOrDrop,
        Opcode::GotoTrueOrDrop,
        Opcode::GotoDropFalse,
        Opcode::GotoDropTrue,
        Opcode::Goto,
        Opcode::CloseFree,
        Opcode::PushFalse,
        Opcode::PushTrue,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Neg,
        Opcode::GetGlobal,
        Opcode::SetGlobal,
        Opcode::GetFree,
        Opcode::SetFree,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::Return,
        Opcode::Call,
        Opcode::Greater,
        Opcode::Equals,
        Opcode::Less,
        Opcode::Not,
        Opcode::Concat,
        Opcode::Print,
        Opcode::Constant,
        Opcode::Closure,
        Opcode::Pop,
        Opcode::Halt,
    ];

    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(byte as usize).copied()
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn shape(self) -> OperandShape {
        match self {
            Opcode::GotoFalseOrDrop
            | Opcode::GotoTrueOrDrop
            | Opcode::GotoDropFalse
            | Opcode::GotoDropTrue
            | Opcode::Goto => OperandShape::Jump,

            Opcode::GetGlobal
            | Opcode::SetGlobal
            | Opcode::GetFree
            | Opcode::SetFree
            | Opcode::GetLocal
            | Opcode::SetLocal
            | Opcode::Constant => OperandShape::Index,

            Opcode::Concat => OperandShape::Count,
            Opcode::Closure => OperandShape::Captures,

            Opcode::CloseFree
            | Opcode::PushFalse
            | Opcode::PushTrue
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Neg
            | Opcode::Return
            | Opcode::Call
            | Opcode::Greater
            | Opcode::Equals
            | Opcode::Less
            | Opcode::Not
            | Opcode::Print
            | Opcode::Pop
            | Opcode::Halt => OperandShape::None,
        }
    }

    pub fn is_jump(self) -> bool {
        self.shape() == OperandShape::Jump
    }

    /// The name used in listings.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::GotoFalseOrDrop => "GOTO_FALSE_OR_DROP",
            Opcode::GotoTrueOrDrop => "GOTO_TRUE_OR_DROP",
            Opcode::GotoDropFalse => "GOTO_DROP_FALSE",
            Opcode::GotoDropTrue => "GOTO_DROP_TRUE",
            Opcode::Goto => "GOTO",
            Opcode::CloseFree => "CLOSE_FREE",
            Opcode::PushFalse => "PUSH_FALSE",
            Opcode::PushTrue => "PUSH_TRUE",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Neg => "NEG",
            Opcode::GetGlobal => "GET_GLOBAL",
            Opcode::SetGlobal => "SET_GLOBAL",
            Opcode::GetFree => "GET_FREE",
            Opcode::SetFree => "SET_FREE",
            Opcode::GetLocal => "GET_LOCAL",
            Opcode::SetLocal => "SET_LOCAL",
            Opcode::Return => "RETURN",
            Opcode::Call => "CALL",
            Opcode::Greater => "GREATER",
            Opcode::Equals => "EQUALS",
            Opcode::Less => "LESS",
            Opcode::Not => "NOT",
            Opcode::Concat => "CONCAT",
            Opcode::Print => "PRINT",
            Opcode::Constant => "CONSTANT",
            Opcode::Closure => "CLOSURE",
            Opcode::Pop => "POP",
            Opcode::Halt => "HALT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_byte() {
        for (byte, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(opcode.as_byte() as usize, byte);
            assert_eq!(Opcode::from_byte(byte as u8), Some(*opcode));
        }
        assert_eq!(Opcode::from_byte(31), None);
        assert_eq!(Opcode::from_byte(255), None);
    }

    #[test]
    fn test_wire_values() {
        assert_eq!(Opcode::GotoFalseOrDrop as u8, 0);
        assert_eq!(Opcode::Goto as u8, 4);
        assert_eq!(Opcode::CloseFree as u8, 5);
        assert_eq!(Opcode::GetGlobal as u8, 13);
        assert_eq!(Opcode::Call as u8, 20);
        assert_eq!(Opcode::Concat as u8, 25);
        assert_eq!(Opcode::Constant as u8, 27);
        assert_eq!(Opcode::Halt as u8, 30);
    }

    #[test]
    fn test_shapes() {
        assert!(Opcode::GotoTrueOrDrop.is_jump());
        assert!(!Opcode::Call.is_jump());
        assert_eq!(Opcode::SetFree.shape(), OperandShape::Index);
        assert_eq!(Opcode::Concat.shape(), OperandShape::Count);
        assert_eq!(Opcode::Closure.shape(), OperandShape::Captures);
        assert_eq!(Opcode::Return.shape(), OperandShape::None);
        assert_eq!(OperandShape::None.fixed_size(), 0);
        assert_eq!(OperandShape::Jump.fixed_size(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(Opcode::GotoDropFalse.to_string(), "GOTO_DROP_FALSE");
        assert_eq!(Opcode::PushTrue.to_string(), "PUSH_TRUE");
    }
}

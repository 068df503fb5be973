//! Bytecode generation from the bound tree.
//!
//! A single pass in source order. Forward jumps are written with a
//! placeholder and patched once their target is known; backward jumps are
//! written directly.

use crate::frame::{FrameStack, GlobalSlots, Slot};
use sash_ast::LiteralValue;
use sash_binder::bound::*;
use sash_binder::operators::{BinaryOperation, UnaryOperation};
use sash_binder::{SymbolId, SymbolTable};
use sash_bytecode::buffer::{to_u16, to_u8};
use sash_bytecode::{CodeBuffer, Constant, ConstantPool, EmitError, FunctionPointer, Opcode, ProgramImage};
use sash_core::text::TextSpan;
use tracing::{debug, error, trace};

/// Pending jumps of one enclosing loop.
#[derive(Debug)]
struct LoopContext {
    /// Local slots at or above this index were declared inside the loop.
    local_base: usize,
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// Load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Get,
    Set,
}

impl Access {
    fn opcode(self, slot: Slot) -> (Opcode, u16) {
        match (self, slot) {
            (Access::Get, Slot::Local(i)) => (Opcode::GetLocal, i),
            (Access::Get, Slot::Free(i)) => (Opcode::GetFree, i),
            (Access::Get, Slot::Global(i)) => (Opcode::GetGlobal, i),
            (Access::Set, Slot::Local(i)) => (Opcode::SetLocal, i),
            (Access::Set, Slot::Free(i)) => (Opcode::SetFree, i),
            (Access::Set, Slot::Global(i)) => (Opcode::SetGlobal, i),
        }
    }
}

/// Per-compilation emitter state.
pub struct Emitter<'a> {
    symbols: &'a SymbolTable,
    code: CodeBuffer,
    constants: ConstantPool,
    globals: GlobalSlots,
    frames: FrameStack,
    loops: Vec<LoopContext>,
}

impl<'a> Emitter<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            code: CodeBuffer::new(),
            constants: ConstantPool::new(),
            globals: GlobalSlots::default(),
            frames: FrameStack::new(),
            loops: Vec::new(),
        }
    }

    /// Emit a whole program. The tree must be free of diagnostics.
    pub fn emit_program(mut self, statements: &[BoundStatement]) -> Result<ProgramImage, EmitError> {
        debug!(statements = statements.len(), "emitting");

        let result = statements
            .iter()
            .try_for_each(|statement| self.emit_statement(statement));
        if let Err(err) = result {
            error!(%err, offset = self.code.len(), "emission aborted");
            return Err(err);
        }
        self.code.put_op(Opcode::Halt);

        let global_count = to_u16(self.globals.len(), "global count")?;
        debug!(
            code = self.code.len(),
            constants = self.constants.len(),
            globals = global_count,
            "emission finished"
        );

        Ok(ProgramImage {
            constants: self.constants,
            global_count,
            code: self.code.into_bytes(),
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn emit_statement(&mut self, statement: &BoundStatement) -> Result<(), EmitError> {
        match statement {
            BoundStatement::Function(node) => self.emit_function(node),
            BoundStatement::Variable(node) => {
                self.emit_expression(&node.value)?;
                if self.frames.is_global() {
                    let slot = self.globals.put(node.symbol)?;
                    self.code.put_op_u16(Opcode::SetGlobal, slot as usize, "global slot")?;
                    self.code.put_op(Opcode::Pop);
                } else {
                    // The value already sits in the new local's slot.
                    self.frames.put_local(node.symbol)?;
                }
                Ok(())
            }
            BoundStatement::If(node) => {
                self.emit_expression(&node.condition)?;
                let skip_then = self.code.put_jump(Opcode::GotoDropFalse);
                self.emit_statement(&node.then_branch)?;
                match &node.else_branch {
                    None => self.code.patch_jump_here(skip_then),
                    Some(else_branch) => {
                        let skip_else = self.code.put_jump(Opcode::Goto);
                        self.code.patch_jump_here(skip_then)?;
                        self.emit_statement(else_branch)?;
                        self.code.patch_jump_here(skip_else)
                    }
                }
            }
            BoundStatement::While(node) => {
                self.begin_loop();
                let condition = self.code.len();
                self.emit_expression(&node.condition)?;
                let exit = self.code.put_jump(Opcode::GotoDropFalse);
                self.emit_statement(&node.body)?;
                self.code.put_jump_to(Opcode::Goto, condition)?;
                self.code.patch_jump_here(exit)?;
                self.end_loop(condition)
            }
            BoundStatement::DoWhile(node) => {
                self.begin_loop();
                let body = self.code.len();
                self.emit_statement(&node.body)?;
                let condition = self.code.len();
                self.emit_expression(&node.condition)?;
                self.code.put_jump_to(Opcode::GotoDropTrue, body)?;
                self.end_loop(condition)
            }
            BoundStatement::Block(block) => self.emit_block(block),
            BoundStatement::Return(node) => {
                match &node.value {
                    Some(value) => self.emit_expression(value)?,
                    None => self.code.put_op(Opcode::PushTrue),
                }
                self.code.put_op(Opcode::Return);
                Ok(())
            }
            BoundStatement::Break(span) => self.emit_loop_jump(*span, "break"),
            BoundStatement::Continue(span) => self.emit_loop_jump(*span, "continue"),
            BoundStatement::Print(node) => {
                self.emit_expression(&node.expression)?;
                self.code.put_op(Opcode::Print);
                Ok(())
            }
            BoundStatement::Expression(node) => {
                self.emit_expression(&node.expression)?;
                self.code.put_op(Opcode::Pop);
                Ok(())
            }
        }
    }

    fn emit_block(&mut self, block: &BoundBlock) -> Result<(), EmitError> {
        self.frames.start_block();
        for statement in &block.statements {
            self.emit_statement(statement)?;
        }
        for local in self.frames.end_block() {
            self.code.put_op(if local.captured { Opcode::CloseFree } else { Opcode::Pop });
        }
        Ok(())
    }

    fn emit_function(&mut self, node: &BoundFunction) -> Result<(), EmitError> {
        let skip = self.code.put_jump(Opcode::Goto);
        let entry = self.code.len();

        // The slot exists before the body so the body can refer to itself.
        let global = self.frames.is_global();
        let global_slot = if global {
            Some(self.globals.put(node.symbol)?)
        } else {
            self.frames.put_local(node.symbol)?;
            None
        };

        self.frames.push_frame();
        self.frames.start_block();
        for &parameter in &node.parameters {
            self.frames.put_local(parameter)?;
        }

        let outer_loops = std::mem::take(&mut self.loops);
        self.emit_block(&node.body)?;
        self.loops = outer_loops;

        if node.insert_return {
            self.code.put_op(Opcode::PushTrue);
            self.code.put_op(Opcode::Return);
        }

        self.frames.end_block();
        let captures = self.frames.pop_frame();
        self.code.patch_jump_here(skip)?;

        let pointer = FunctionPointer {
            entry: to_u16(entry, "function entry")?,
            arity: to_u8(node.parameters.len(), "function arity")?,
        };
        let constant = self.constants.add(Constant::Function(pointer))?;
        self.code.put_op_u16(Opcode::Constant, constant as usize, "constant index")?;

        if !captures.is_empty() {
            self.code.put_op_u16(Opcode::Closure, captures.len(), "capture count")?;
            for capture in &captures {
                self.code.put_u8(u8::from(capture.is_local));
                self.code.put_u16(capture.index);
            }
        }

        if let Some(slot) = global_slot {
            self.code.put_op_u16(Opcode::SetGlobal, slot as usize, "global slot")?;
            self.code.put_op(Opcode::Pop);
        }

        trace!(
            function = %self.symbols[node.symbol].name,
            entry,
            arity = pointer.arity,
            captures = captures.len(),
            "emitted function"
        );
        Ok(())
    }

    // ========================================================================
    // Loops
    // ========================================================================

    fn begin_loop(&mut self) {
        self.loops.push(LoopContext {
            local_base: self.frames.local_count(),
            breaks: Vec::new(),
            continues: Vec::new(),
        });
    }

    /// Patch the loop's jumps: `continue` to `continue_target`, `break` to here.
    fn end_loop(&mut self, continue_target: usize) -> Result<(), EmitError> {
        let Some(context) = self.loops.pop() else {
            return Ok(());
        };
        for operand in context.continues {
            self.code.patch_jump(operand, continue_target)?;
        }
        for operand in context.breaks {
            self.code.patch_jump_here(operand)?;
        }
        Ok(())
    }

    /// Discard the loop's locals, then jump.
    fn emit_loop_jump(&mut self, span: TextSpan, keyword: &'static str) -> Result<(), EmitError> {
        let Some(base) = self.loops.last().map(|context| context.local_base) else {
            return Err(EmitError::JumpOutsideLoop { keyword, span });
        };
        for local in self.frames.locals_from(base) {
            self.code.put_op(if local.captured { Opcode::CloseFree } else { Opcode::Pop });
        }
        let operand = self.code.put_jump(Opcode::Goto);
        if let Some(context) = self.loops.last_mut() {
            if keyword == "break" {
                context.breaks.push(operand);
            } else {
                context.continues.push(operand);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn emit_expression(&mut self, expression: &BoundExpression) -> Result<(), EmitError> {
        match expression {
            BoundExpression::Literal(node) => self.emit_literal(&node.value),
            BoundExpression::Variable(node) => self.emit_access(node.symbol, Access::Get),
            BoundExpression::Assignment(node) => {
                self.emit_expression(&node.value)?;
                self.emit_access(node.symbol, Access::Set)
            }
            BoundExpression::Binary(node) => self.emit_binary(node),
            BoundExpression::Unary(node) => {
                self.emit_expression(&node.operand)?;
                match node.operation {
                    UnaryOperation::Identity => {}
                    UnaryOperation::Negation => self.code.put_op(Opcode::Neg),
                    UnaryOperation::LogicalNegation => self.code.put_op(Opcode::Not),
                }
                Ok(())
            }
            BoundExpression::Parenthesized(node) => self.emit_expression(&node.expression),
            BoundExpression::Call(node) => {
                for argument in &node.arguments {
                    self.emit_expression(argument)?;
                }
                self.emit_expression(&node.target)?;
                self.code.put_op(Opcode::Call);
                Ok(())
            }
            BoundExpression::Ternary(node) => {
                self.emit_expression(&node.condition)?;
                let skip_then = self.code.put_jump(Opcode::GotoDropFalse);
                self.emit_expression(&node.then_expression)?;
                let skip_else = self.code.put_jump(Opcode::Goto);
                self.code.patch_jump_here(skip_then)?;
                self.emit_expression(&node.else_expression)?;
                self.code.patch_jump_here(skip_else)
            }
            BoundExpression::Error(span) => Err(EmitError::ErrorNode { span: *span }),
        }
    }

    fn emit_literal(&mut self, value: &LiteralValue) -> Result<(), EmitError> {
        let constant = match value {
            LiteralValue::Boolean(true) => {
                self.code.put_op(Opcode::PushTrue);
                return Ok(());
            }
            LiteralValue::Boolean(false) => {
                self.code.put_op(Opcode::PushFalse);
                return Ok(());
            }
            LiteralValue::Int(value) => Constant::Int(*value),
            LiteralValue::Long(value) => Constant::Long(*value),
            LiteralValue::Float(value) => Constant::float(*value),
            LiteralValue::Double(value) => Constant::double(*value),
            LiteralValue::String(value) => Constant::String(value.clone()),
            // Chars travel as their code point.
            LiteralValue::Char(value) => Constant::Int(*value as u32 as i32),
        };
        let index = self.constants.add(constant)?;
        self.code.put_op_u16(Opcode::Constant, index as usize, "constant index")
    }

    fn emit_access(&mut self, symbol: SymbolId, access: Access) -> Result<(), EmitError> {
        let slot = self.resolve(symbol)?;
        let (opcode, index) = access.opcode(slot);
        self.code.put_op_u16(opcode, index as usize, "slot index")
    }

    /// Local, then free, then global.
    fn resolve(&mut self, symbol: SymbolId) -> Result<Slot, EmitError> {
        if let Some(slot) = self.frames.resolve(symbol)? {
            return Ok(slot);
        }
        if let Some(index) = self.globals.get(symbol) {
            return Ok(Slot::Global(index));
        }
        let name = self
            .symbols
            .get(symbol)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{}", symbol.0));
        Err(EmitError::UnresolvedSymbol { name })
    }

    fn emit_binary(&mut self, node: &BoundBinary) -> Result<(), EmitError> {
        let (first, second) = match node.operation {
            BinaryOperation::LogicalAnd => return self.emit_short_circuit(node, Opcode::GotoFalseOrDrop),
            BinaryOperation::LogicalOr => return self.emit_short_circuit(node, Opcode::GotoTrueOrDrop),
            BinaryOperation::Concat => return self.emit_concat(node),
            BinaryOperation::Addition => (Opcode::Add, None),
            BinaryOperation::Subtraction => (Opcode::Sub, None),
            BinaryOperation::Multiplication => (Opcode::Mul, None),
            BinaryOperation::Division => (Opcode::Div, None),
            BinaryOperation::Equals => (Opcode::Equals, None),
            BinaryOperation::NotEquals => (Opcode::Equals, Some(Opcode::Not)),
            BinaryOperation::GreaterThan => (Opcode::Greater, None),
            BinaryOperation::GreaterThanEqual => (Opcode::Less, Some(Opcode::Not)),
            BinaryOperation::LessThan => (Opcode::Less, None),
            BinaryOperation::LessThanEqual => (Opcode::Greater, Some(Opcode::Not)),
        };
        self.emit_expression(&node.left)?;
        self.emit_expression(&node.right)?;
        self.code.put_op(first);
        if let Some(second) = second {
            self.code.put_op(second);
        }
        Ok(())
    }

    /// `a && b && c`: every operand but the last is followed by a test that
    /// skips to the end of the chain.
    fn emit_short_circuit(&mut self, node: &BoundBinary, test: Opcode) -> Result<(), EmitError> {
        let operands = flatten(node);
        let mut exits = Vec::with_capacity(operands.len() - 1);
        for (i, operand) in operands.iter().enumerate() {
            self.emit_expression(operand)?;
            if i + 1 < operands.len() {
                exits.push(self.code.put_jump(test));
            }
        }
        let end = self.code.len();
        for operand in exits {
            self.code.patch_jump(operand, end)?;
        }
        Ok(())
    }

    /// A `+` chain over strings becomes one CONCAT. Operands are pushed last
    /// first.
    fn emit_concat(&mut self, node: &BoundBinary) -> Result<(), EmitError> {
        let operands = flatten(node);
        for operand in operands.iter().rev() {
            self.emit_expression(operand)?;
        }
        self.code.put_op_u16(Opcode::Concat, operands.len(), "concat operand count")
    }
}

/// Collect the operands of a chain of `node.operation`, left to right.
/// Parentheses end the chain.
fn flatten(node: &BoundBinary) -> Vec<&BoundExpression> {
    fn walk<'e>(expression: &'e BoundExpression, operation: BinaryOperation, out: &mut Vec<&'e BoundExpression>) {
        match expression {
            BoundExpression::Binary(inner) if inner.operation == operation => {
                walk(&inner.left, operation, out);
                walk(&inner.right, operation, out);
            }
            _ => out.push(expression),
        }
    }

    let mut operands = Vec::new();
    walk(&node.left, node.operation, &mut operands);
    walk(&node.right, node.operation, &mut operands);
    operands
}

#[cfg(test)]
mod tests {
    use super::*;
    use sash_binder::types::Type;

    fn literal(value: i32) -> BoundExpression {
        BoundExpression::Literal(BoundLiteral {
            value: LiteralValue::Int(value),
            ty: Type::Int,
            span: TextSpan::default(),
        })
    }

    fn binary(left: BoundExpression, operation: BinaryOperation, right: BoundExpression) -> BoundExpression {
        BoundExpression::Binary(BoundBinary {
            left: Box::new(left),
            operation,
            right: Box::new(right),
            ty: Type::Int,
            span: TextSpan::default(),
        })
    }

    #[test]
    fn test_flatten_stops_at_other_operations_and_parentheses() {
        let parenthesized = BoundExpression::Parenthesized(BoundParenthesized {
            expression: Box::new(binary(literal(3), BinaryOperation::Concat, literal(4))),
            span: TextSpan::default(),
        });
        let chain = binary(
            binary(literal(1), BinaryOperation::Concat, literal(2)),
            BinaryOperation::Concat,
            binary(parenthesized, BinaryOperation::Concat, binary(literal(5), BinaryOperation::Addition, literal(6))),
        );
        let BoundExpression::Binary(node) = &chain else {
            unreachable!()
        };
        assert_eq!(flatten(node).len(), 4);
    }

    #[test]
    fn test_error_node_is_fatal() {
        let symbols = SymbolTable::new();
        let statements = vec![BoundStatement::Print(BoundPrint {
            expression: BoundExpression::Error(TextSpan::new(3, 1)),
            span: TextSpan::default(),
        })];
        let err = Emitter::new(&symbols).emit_program(&statements).unwrap_err();
        assert_eq!(err, EmitError::ErrorNode { span: TextSpan::new(3, 1) });
    }

    #[test]
    fn test_unresolved_symbol_is_fatal() {
        let mut symbols = SymbolTable::new();
        let ghost = symbols.alloc("ghost", Type::Int, sash_binder::SymbolKind::Parameter);
        let statements = vec![BoundStatement::Print(BoundPrint {
            expression: BoundExpression::Variable(BoundVariableReference {
                symbol: ghost,
                ty: Type::Int,
                span: TextSpan::default(),
            }),
            span: TextSpan::default(),
        })];
        let err = Emitter::new(&symbols).emit_program(&statements).unwrap_err();
        assert_eq!(err, EmitError::UnresolvedSymbol { name: "ghost".into() });
    }

    #[test]
    fn test_break_outside_loop_is_fatal() {
        let symbols = SymbolTable::new();
        let statements = vec![BoundStatement::Break(TextSpan::new(0, 5))];
        let err = Emitter::new(&symbols).emit_program(&statements).unwrap_err();
        assert!(matches!(err, EmitError::JumpOutsideLoop { keyword: "break", .. }));
    }
}

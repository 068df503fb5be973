//! The bound tree: the syntax tree after name resolution and type checking.
//!
//! Expressions carry their resolved type. Names are replaced by symbol ids
//! into the program's [`SymbolTable`]. An [`BoundExpression::Error`] node
//! stands for an expression whose problem was already diagnosed; it never
//! reaches the emitter because emission only runs on diagnostic-free trees.

use crate::operators::{BinaryOperation, UnaryOperation};
use crate::symbol::{SymbolId, SymbolTable};
use crate::types::Type;
use sash_ast::LiteralValue;
use sash_core::text::TextSpan;

/// A bound program plus the symbols its nodes refer to.
#[derive(Debug, Clone)]
pub struct BoundProgram {
    pub statements: Vec<BoundStatement>,
    pub symbols: SymbolTable,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone)]
pub enum BoundStatement {
    Function(BoundFunction),
    Variable(BoundVariable),
    If(BoundIf),
    While(BoundWhile),
    DoWhile(BoundDoWhile),
    Block(BoundBlock),
    Return(BoundReturn),
    Break(TextSpan),
    Continue(TextSpan),
    Print(BoundPrint),
    Expression(BoundExpressionStatement),
}

impl BoundStatement {
    pub fn span(&self) -> TextSpan {
        match self {
            BoundStatement::Function(n) => n.span,
            BoundStatement::Variable(n) => n.span,
            BoundStatement::If(n) => n.span,
            BoundStatement::While(n) => n.span,
            BoundStatement::DoWhile(n) => n.span,
            BoundStatement::Block(n) => n.span,
            BoundStatement::Return(n) => n.span,
            BoundStatement::Break(span) | BoundStatement::Continue(span) => *span,
            BoundStatement::Print(n) => n.span,
            BoundStatement::Expression(n) => n.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoundFunction {
    pub symbol: SymbolId,
    /// Parameter symbols in declaration order.
    pub parameters: Vec<SymbolId>,
    pub body: BoundBlock,
    /// The body can fall off its end, so the emitter appends a return.
    pub insert_return: bool,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundVariable {
    pub symbol: SymbolId,
    pub value: BoundExpression,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundIf {
    pub condition: BoundExpression,
    pub then_branch: Box<BoundStatement>,
    pub else_branch: Option<Box<BoundStatement>>,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundWhile {
    pub condition: BoundExpression,
    pub body: Box<BoundStatement>,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundDoWhile {
    pub body: Box<BoundStatement>,
    pub condition: BoundExpression,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundBlock {
    pub statements: Vec<BoundStatement>,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundReturn {
    pub value: Option<BoundExpression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundPrint {
    pub expression: BoundExpression,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundExpressionStatement {
    pub expression: BoundExpression,
    pub span: TextSpan,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone)]
pub enum BoundExpression {
    Literal(BoundLiteral),
    Variable(BoundVariableReference),
    Assignment(BoundAssignment),
    Binary(BoundBinary),
    Unary(BoundUnary),
    Parenthesized(BoundParenthesized),
    Call(BoundCall),
    Ternary(BoundTernary),
    Error(TextSpan),
}

impl BoundExpression {
    /// The resolved type of this expression.
    pub fn ty(&self) -> Type {
        match self {
            BoundExpression::Literal(n) => n.ty.clone(),
            BoundExpression::Variable(n) => n.ty.clone(),
            BoundExpression::Assignment(n) => n.ty.clone(),
            BoundExpression::Binary(n) => n.ty.clone(),
            BoundExpression::Unary(n) => n.ty.clone(),
            BoundExpression::Parenthesized(n) => n.expression.ty(),
            BoundExpression::Call(n) => n.ty.clone(),
            BoundExpression::Ternary(n) => n.ty.clone(),
            BoundExpression::Error(_) => Type::Error,
        }
    }

    pub fn span(&self) -> TextSpan {
        match self {
            BoundExpression::Literal(n) => n.span,
            BoundExpression::Variable(n) => n.span,
            BoundExpression::Assignment(n) => n.span,
            BoundExpression::Binary(n) => n.span,
            BoundExpression::Unary(n) => n.span,
            BoundExpression::Parenthesized(n) => n.span,
            BoundExpression::Call(n) => n.span,
            BoundExpression::Ternary(n) => n.span,
            BoundExpression::Error(span) => *span,
        }
    }

    /// Whether this expression has already been diagnosed. A parenthesized
    /// error is an error too.
    pub fn is_error(&self) -> bool {
        self.ty().is_error()
    }
}

#[derive(Debug, Clone)]
pub struct BoundLiteral {
    pub value: LiteralValue,
    pub ty: Type,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundVariableReference {
    pub symbol: SymbolId,
    pub ty: Type,
    pub span: TextSpan,
}

/// Assignment to a variable. The value stays on the stack as the result.
#[derive(Debug, Clone)]
pub struct BoundAssignment {
    pub symbol: SymbolId,
    pub value: Box<BoundExpression>,
    pub ty: Type,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundBinary {
    pub left: Box<BoundExpression>,
    pub operation: BinaryOperation,
    pub right: Box<BoundExpression>,
    pub ty: Type,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundUnary {
    pub operation: UnaryOperation,
    pub operand: Box<BoundExpression>,
    pub ty: Type,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundParenthesized {
    pub expression: Box<BoundExpression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundCall {
    pub target: Box<BoundExpression>,
    pub arguments: Vec<BoundExpression>,
    pub ty: Type,
    pub span: TextSpan,
}

#[derive(Debug, Clone)]
pub struct BoundTernary {
    pub condition: Box<BoundExpression>,
    pub then_expression: Box<BoundExpression>,
    pub else_expression: Box<BoundExpression>,
    pub ty: Type,
    pub span: TextSpan,
}

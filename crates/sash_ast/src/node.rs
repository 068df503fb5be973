//! Syntax tree node definitions.
//!
//! Statement and expression kinds are closed sets; consumers match on them
//! exhaustively.

use crate::operator::{BinaryOperator, UnaryOperator};
use sash_core::text::TextSpan;
use serde::{Deserialize, Serialize};

// ============================================================================
// Source File
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub file_name: String,
    /// The source text, when the parser chose to carry it along. Only used
    /// for rendering diagnostics.
    #[serde(default)]
    pub text: Option<String>,
    pub statements: Vec<Statement>,
    pub span: TextSpan,
}

// ============================================================================
// Identifier
// ============================================================================

/// A name in source. The parser emits an empty name when it recovered from a
/// missing identifier; empty names never declare or resolve anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: TextSpan,
}

impl Identifier {
    pub fn new(name: impl Into<String>, span: TextSpan) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.name.is_empty()
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Statement {
    Function(FunctionDeclaration),
    Variable(VariableDeclaration),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Block(Block),
    Return(ReturnStatement),
    Break(TextSpan),
    Continue(TextSpan),
    Print(PrintStatement),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn span(&self) -> TextSpan {
        match self {
            Statement::Function(n) => n.span,
            Statement::Variable(n) => n.span,
            Statement::If(n) => n.span,
            Statement::While(n) => n.span,
            Statement::DoWhile(n) => n.span,
            Statement::Block(n) => n.span,
            Statement::Return(n) => n.span,
            Statement::Break(span) | Statement::Continue(span) => *span,
            Statement::Print(n) => n.span,
            Statement::Expression(n) => n.span,
        }
    }
}

/// `fun name(a: T, b: U): R { ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<Identifier>,
    pub body: Block,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Identifier,
    pub type_annotation: Identifier,
    pub span: TextSpan,
}

/// `let name: T = value` (read-only) or `def name: T = value` (mutable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: Identifier,
    #[serde(default)]
    pub type_annotation: Option<Identifier>,
    pub read_only: bool,
    pub initializer: Expression,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    #[serde(default)]
    pub else_branch: Option<Box<Statement>>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub condition: Expression,
    pub span: TextSpan,
}

/// A braced statement list. Its span ends at the closing brace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    #[serde(default)]
    pub value: Option<Expression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStatement {
    pub expression: Expression,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: TextSpan,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expression {
    Literal(Literal),
    Variable(Identifier),
    Assignment(AssignmentExpression),
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Parenthesized(ParenthesizedExpression),
    Call(CallExpression),
    Ternary(TernaryExpression),
}

impl Expression {
    pub fn span(&self) -> TextSpan {
        match self {
            Expression::Literal(n) => n.span,
            Expression::Variable(n) => n.span,
            Expression::Assignment(n) => n.span,
            Expression::Binary(n) => n.span,
            Expression::Unary(n) => n.span,
            Expression::Parenthesized(n) => n.span,
            Expression::Call(n) => n.span,
            Expression::Ternary(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum LiteralValue {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Char(char),
}

/// `target = value`. The target is any expression; the binder decides
/// whether it names an assignable variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentExpression {
    pub target: Box<Expression>,
    pub value: Box<Expression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: BinaryOperator,
    pub operator_span: TextSpan,
    pub right: Box<Expression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub operator_span: TextSpan,
    pub operand: Box<Expression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub target: Box<Expression>,
    pub arguments: Vec<Expression>,
    /// Span from the opening to the closing parenthesis.
    pub arguments_span: TextSpan,
    pub span: TextSpan,
}

/// `condition ? then : else`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TernaryExpression {
    pub condition: Box<Expression>,
    pub then_expression: Box<Expression>,
    pub else_expression: Box<Expression>,
    pub span: TextSpan,
}

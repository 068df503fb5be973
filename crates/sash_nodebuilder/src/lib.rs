//! sash_nodebuilder: Synthetic syntax tree construction.
//!
//! Builds `sash_ast` trees without a parser. Every leaf gets a fresh,
//! strictly increasing span and composite nodes span the union of their
//! children, so diagnostics produced for a built tree can be matched back
//! to the node that caused them.

use sash_ast::*;
use sash_core::text::TextSpan;
use std::cell::Cell;

#[derive(Debug, Default)]
pub struct NodeBuilder {
    cursor: Cell<u32>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next span of `length` bytes.
    fn next_span(&self, length: u32) -> TextSpan {
        let start = self.cursor.get();
        // Leave a one-byte gap so adjacent nodes never touch.
        self.cursor.set(start + length + 1);
        TextSpan::new(start, length)
    }

    fn text_span(&self, text: &str) -> TextSpan {
        self.next_span(text.len().max(1) as u32)
    }

    // ========================================================================
    // Identifiers and literals
    // ========================================================================

    /// An identifier. An empty name models a parser recovery node.
    pub fn ident(&self, name: &str) -> Identifier {
        let span = if name.is_empty() {
            TextSpan::empty(self.next_span(0).start)
        } else {
            self.text_span(name)
        };
        Identifier::new(name, span)
    }

    fn literal(&self, value: LiteralValue, width: u32) -> Expression {
        Expression::Literal(Literal {
            value,
            span: self.next_span(width),
        })
    }

    pub fn boolean(&self, value: bool) -> Expression {
        self.literal(LiteralValue::Boolean(value), if value { 4 } else { 5 })
    }

    pub fn int(&self, value: i32) -> Expression {
        self.literal(LiteralValue::Int(value), value.to_string().len() as u32)
    }

    pub fn long(&self, value: i64) -> Expression {
        self.literal(LiteralValue::Long(value), value.to_string().len() as u32 + 1)
    }

    pub fn float(&self, value: f32) -> Expression {
        self.literal(LiteralValue::Float(value), value.to_string().len() as u32 + 1)
    }

    pub fn double(&self, value: f64) -> Expression {
        self.literal(LiteralValue::Double(value), value.to_string().len() as u32)
    }

    pub fn string(&self, value: &str) -> Expression {
        self.literal(LiteralValue::String(value.to_string()), value.len() as u32 + 2)
    }

    pub fn char(&self, value: char) -> Expression {
        self.literal(LiteralValue::Char(value), 3)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn var(&self, name: &str) -> Expression {
        Expression::Variable(self.ident(name))
    }

    pub fn assign(&self, target: Expression, value: Expression) -> Expression {
        let span = target.span().union(&value.span());
        Expression::Assignment(AssignmentExpression {
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    /// A binary expression. The operator token is placed after both
    /// operands in span order.
    pub fn binary(&self, left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
        let operator_span = self.text_span(operator.as_str());
        let span = left.span().union(&right.span()).union(&operator_span);
        Expression::Binary(BinaryExpression {
            left: Box::new(left),
            operator,
            operator_span,
            right: Box::new(right),
            span,
        })
    }

    pub fn and(&self, left: Expression, right: Expression) -> Expression {
        self.binary(left, BinaryOperator::AmpersandAmpersand, right)
    }

    pub fn or(&self, left: Expression, right: Expression) -> Expression {
        self.binary(left, BinaryOperator::BarBar, right)
    }

    pub fn add(&self, left: Expression, right: Expression) -> Expression {
        self.binary(left, BinaryOperator::Plus, right)
    }

    pub fn unary(&self, operator: UnaryOperator, operand: Expression) -> Expression {
        let operator_span = self.text_span(operator.as_str());
        let span = operator_span.union(&operand.span());
        Expression::Unary(UnaryExpression {
            operator,
            operator_span,
            operand: Box::new(operand),
            span,
        })
    }

    pub fn paren(&self, expression: Expression) -> Expression {
        let close = self.next_span(1);
        let span = expression.span().union(&close);
        Expression::Parenthesized(ParenthesizedExpression {
            expression: Box::new(expression),
            span,
        })
    }

    pub fn call(&self, target: Expression, arguments: Vec<Expression>) -> Expression {
        let close = self.next_span(1);
        let arguments_span = arguments
            .iter()
            .fold(close, |span, argument| span.union(&argument.span()));
        let span = target.span().union(&arguments_span);
        Expression::Call(CallExpression {
            target: Box::new(target),
            arguments,
            arguments_span,
            span,
        })
    }

    pub fn ternary(&self, condition: Expression, then_expression: Expression, else_expression: Expression) -> Expression {
        let span = condition
            .span()
            .union(&then_expression.span())
            .union(&else_expression.span());
        Expression::Ternary(TernaryExpression {
            condition: Box::new(condition),
            then_expression: Box::new(then_expression),
            else_expression: Box::new(else_expression),
            span,
        })
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn variable(&self, name: &str, type_name: Option<&str>, read_only: bool, initializer: Expression) -> Statement {
        let keyword = self.next_span(3);
        let name = self.ident(name);
        let type_annotation = type_name.map(|t| self.ident(t));
        let span = keyword.union(&initializer.span());
        Statement::Variable(VariableDeclaration {
            name,
            type_annotation,
            read_only,
            initializer,
            span,
        })
    }

    /// `let name[: type] = initializer`
    pub fn let_var(&self, name: &str, type_name: Option<&str>, initializer: Expression) -> Statement {
        self.variable(name, type_name, true, initializer)
    }

    /// `def name[: type] = initializer`
    pub fn def_var(&self, name: &str, type_name: Option<&str>, initializer: Expression) -> Statement {
        self.variable(name, type_name, false, initializer)
    }

    /// A braced block. The block span ends at its own closing brace, which
    /// is the location used for missing-return diagnostics.
    pub fn block(&self, statements: Vec<Statement>) -> Block {
        let open = statements
            .iter()
            .map(|s| s.span().start)
            .min();
        let close = self.next_span(1);
        let span = TextSpan::from_bounds(open.unwrap_or(close.start), close.end());
        Block { statements, span }
    }

    pub fn block_stmt(&self, statements: Vec<Statement>) -> Statement {
        Statement::Block(self.block(statements))
    }

    /// `fun name(params): return_type body`. Parameters are `(name, type)`
    /// pairs.
    pub fn function(&self, name: &str, params: &[(&str, &str)], return_type: Option<&str>, body: Block) -> Statement {
        let keyword = self.next_span(3);
        let name = self.ident(name);
        let parameters = params
            .iter()
            .map(|(param, type_name)| {
                let name = self.ident(param);
                let type_annotation = self.ident(type_name);
                let span = name.span.union(&type_annotation.span);
                Parameter {
                    name,
                    type_annotation,
                    span,
                }
            })
            .collect();
        let return_type = return_type.map(|t| self.ident(t));
        let span = keyword.union(&body.span);
        Statement::Function(FunctionDeclaration {
            name,
            parameters,
            return_type,
            body,
            span,
        })
    }

    pub fn if_stmt(&self, condition: Expression, then_branch: Statement, else_branch: Option<Statement>) -> Statement {
        let mut span = condition.span().union(&then_branch.span());
        if let Some(else_branch) = &else_branch {
            span = span.union(&else_branch.span());
        }
        Statement::If(IfStatement {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            span,
        })
    }

    pub fn while_stmt(&self, condition: Expression, body: Statement) -> Statement {
        let span = condition.span().union(&body.span());
        Statement::While(WhileStatement {
            condition,
            body: Box::new(body),
            span,
        })
    }

    pub fn do_while(&self, body: Statement, condition: Expression) -> Statement {
        let span = body.span().union(&condition.span());
        Statement::DoWhile(DoWhileStatement {
            body: Box::new(body),
            condition,
            span,
        })
    }

    pub fn return_stmt(&self, value: Option<Expression>) -> Statement {
        let keyword = self.next_span(6);
        let span = match &value {
            Some(value) => keyword.union(&value.span()),
            None => keyword,
        };
        Statement::Return(ReturnStatement { value, span })
    }

    pub fn break_stmt(&self) -> Statement {
        Statement::Break(self.next_span(5))
    }

    pub fn continue_stmt(&self) -> Statement {
        Statement::Continue(self.next_span(8))
    }

    pub fn print(&self, expression: Expression) -> Statement {
        let span = self.next_span(5).union(&expression.span());
        Statement::Print(PrintStatement { expression, span })
    }

    pub fn expr_stmt(&self, expression: Expression) -> Statement {
        let span = expression.span();
        Statement::Expression(ExpressionStatement { expression, span })
    }

    /// Wrap statements into a source file spanning everything built so far.
    pub fn source_file(&self, file_name: &str, statements: Vec<Statement>) -> SourceFile {
        SourceFile {
            file_name: file_name.to_string(),
            text: None,
            statements,
            span: TextSpan::from_bounds(0, self.cursor.get()),
        }
    }
}

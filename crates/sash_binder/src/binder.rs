//! The binder implementation.
//!
//! Walks the syntax tree once and produces the bound tree. Along the way it:
//! - creates symbols and checks same-scope redeclaration
//! - resolves names and type annotations through the scope chain
//! - resolves operators and checks assignments, calls and conditions
//! - validates `break`/`continue` placement
//! - checks that every path through a function returns
//!
//! Problems are recorded as diagnostics and binding continues with an
//! Error-typed node in place of the offending expression.

use crate::bound::*;
use crate::operators::{bind_binary_operator, bind_unary_operator};
use crate::return_paths::ReturnStatus;
use crate::scope::ScopeChain;
use crate::symbol::{SymbolId, SymbolKind, SymbolTable};
use crate::types::Type;
use sash_ast::*;
use sash_core::text::TextSpan;
use sash_core::FxHashSet;
use sash_diagnostics::{messages, DiagnosticCollection, DiagnosticMessage};
use tracing::{debug, trace};

/// What a `break` or `continue` would have to cross to reach its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JumpContext {
    Function,
    Loop,
}

/// The binder resolves names and types and builds the bound tree.
pub struct Binder {
    scopes: ScopeChain,
    symbols: SymbolTable,
    jump_contexts: Vec<JumpContext>,
    diagnostics: DiagnosticCollection,
}

impl Binder {
    pub fn new() -> Self {
        Self {
            scopes: ScopeChain::new(),
            symbols: SymbolTable::new(),
            jump_contexts: Vec::new(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Take diagnostics from the binder.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get all symbols created so far.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub(crate) fn report(&mut self, span: TextSpan, message: &DiagnosticMessage, args: &[&str]) {
        trace!(code = message.code, start = span.start, "diagnostic");
        self.diagnostics.report(span, message, args);
    }

    // ========================================================================
    // Source file binding
    // ========================================================================

    /// Bind a whole program. Symbols move into the returned program; the
    /// diagnostics stay in the binder until taken.
    pub fn bind_source_file(&mut self, source_file: &SourceFile) -> BoundProgram {
        debug!(
            file = %source_file.file_name,
            statements = source_file.statements.len(),
            "binding"
        );

        let statements: Vec<BoundStatement> = source_file
            .statements
            .iter()
            .map(|statement| self.bind_statement(statement))
            .collect();

        // Top-level code is checked like the body of a Unit function so that
        // statements after a top-level jump are reported.
        self.check_return_paths(&statements, &Type::Unit);

        debug!(
            symbols = self.symbols.len(),
            diagnostics = self.diagnostics.len(),
            "binding finished"
        );

        BoundProgram {
            statements,
            symbols: std::mem::take(&mut self.symbols),
        }
    }

    // ========================================================================
    // Statement binding
    // ========================================================================

    fn bind_statement(&mut self, stmt: &Statement) -> BoundStatement {
        match stmt {
            Statement::Function(n) => self.bind_function_declaration(n),
            Statement::Variable(n) => self.bind_variable_declaration(n),
            Statement::If(n) => self.bind_if_statement(n),
            Statement::While(n) => self.bind_while_statement(n),
            Statement::DoWhile(n) => self.bind_do_while_statement(n),
            Statement::Block(n) => BoundStatement::Block(self.bind_block(n)),
            Statement::Return(n) => BoundStatement::Return(BoundReturn {
                value: n.value.as_ref().map(|value| self.bind_expression(value)),
                span: n.span,
            }),
            Statement::Break(span) => {
                self.check_jump(*span, "break");
                BoundStatement::Break(*span)
            }
            Statement::Continue(span) => {
                self.check_jump(*span, "continue");
                BoundStatement::Continue(*span)
            }
            Statement::Print(n) => BoundStatement::Print(BoundPrint {
                expression: self.bind_expression(&n.expression),
                span: n.span,
            }),
            Statement::Expression(n) => BoundStatement::Expression(BoundExpressionStatement {
                expression: self.bind_expression(&n.expression),
                span: n.span,
            }),
        }
    }

    fn bind_function_declaration(&mut self, node: &FunctionDeclaration) -> BoundStatement {
        let name = node.name.name.as_str();
        let redeclared = self.scopes.has_symbol(name);
        if redeclared {
            self.report(node.name.span, &messages::NAME_0_IS_ALREADY_DECLARED_IN_THIS_SCOPE, &[name]);
        }

        let parameters = self.bind_parameters(&node.parameters);
        let return_type = match &node.return_type {
            Some(annotation) => self.bind_type_annotation(annotation),
            None => Type::Unit,
        };
        let ty = Type::function(
            parameters.iter().map(|&p| self.symbols[p].ty.clone()).collect(),
            return_type.clone(),
        );
        let symbol = self.symbols.alloc(
            name,
            ty,
            SymbolKind::Function {
                parameters: parameters.clone(),
            },
        );

        // Declared before the body so the body can call the function.
        if !redeclared && !node.name.is_missing() {
            self.scopes.put_symbol(name, symbol);
        }

        self.jump_contexts.push(JumpContext::Function);
        self.scopes.push_scope();
        for &parameter in &parameters {
            // A duplicate parameter was reported; the first one keeps the name.
            let name = self.symbols[parameter].name.clone();
            if !self.scopes.has_symbol(&name) {
                self.scopes.put_symbol(&name, parameter);
            }
        }
        let body = self.bind_block(&node.body);
        self.scopes.pop_scope();
        self.jump_contexts.pop();

        let status = self.check_return_paths(&body.statements, &return_type);
        if !status.is_ok() {
            let return_type = return_type.to_string();
            self.report(
                node.body.span.last_char(),
                &messages::FUNCTION_MUST_RETURN_A_VALUE_OF_TYPE_0,
                &[return_type.as_str()],
            );
        }

        trace!(function = %name, status = ?status, "bound function");

        BoundStatement::Function(BoundFunction {
            symbol,
            parameters,
            body,
            insert_return: status == ReturnStatus::MustBeInserted,
            span: node.span,
        })
    }

    fn bind_parameters(&mut self, parameters: &[Parameter]) -> Vec<SymbolId> {
        let mut seen = FxHashSet::default();
        let mut bound = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            if parameter.name.is_missing() {
                continue;
            }
            let name = parameter.name.name.as_str();
            let ty = self.bind_type_annotation(&parameter.type_annotation);
            if !seen.insert(name) {
                self.report(parameter.span, &messages::DUPLICATE_PARAMETER_0, &[name]);
            }
            bound.push(self.symbols.alloc(name, ty, SymbolKind::Parameter));
        }
        bound
    }

    fn bind_type_annotation(&mut self, annotation: &Identifier) -> Type {
        if annotation.is_missing() {
            return Type::Error;
        }
        match self.scopes.get_type(&annotation.name) {
            Some(ty) => ty,
            None => {
                self.report(annotation.span, &messages::CANNOT_FIND_TYPE_0, &[annotation.name.as_str()]);
                Type::Error
            }
        }
    }

    fn bind_variable_declaration(&mut self, node: &VariableDeclaration) -> BoundStatement {
        let name = node.name.name.as_str();
        let redeclared = self.scopes.has_symbol(name);
        if redeclared {
            self.report(node.name.span, &messages::NAME_0_IS_ALREADY_DECLARED_IN_THIS_SCOPE, &[name]);
        }

        let explicit_type = node
            .type_annotation
            .as_ref()
            .map(|annotation| self.bind_type_annotation(annotation));

        // The initializer cannot see the variable it initializes.
        let value = self.bind_expression(&node.initializer);
        let ty = explicit_type.unwrap_or_else(|| value.ty());

        let symbol = self.symbols.alloc(
            name,
            ty.clone(),
            SymbolKind::Variable {
                read_only: node.read_only,
            },
        );
        if !redeclared && !node.name.is_missing() {
            self.scopes.put_symbol(name, symbol);
        }

        self.check_assignable(&value, &ty);

        BoundStatement::Variable(BoundVariable {
            symbol,
            value,
            span: node.span,
        })
    }

    fn bind_if_statement(&mut self, node: &IfStatement) -> BoundStatement {
        let condition = self.bind_expression(&node.condition);
        let then_branch = self.bind_statement(&node.then_branch);
        let else_branch = node
            .else_branch
            .as_ref()
            .map(|branch| Box::new(self.bind_statement(branch)));
        self.check_condition(&condition);

        BoundStatement::If(BoundIf {
            condition,
            then_branch: Box::new(then_branch),
            else_branch,
            span: node.span,
        })
    }

    fn bind_while_statement(&mut self, node: &WhileStatement) -> BoundStatement {
        let condition = self.bind_expression(&node.condition);
        let body = self.bind_loop_body(&node.body);
        self.check_condition(&condition);

        BoundStatement::While(BoundWhile {
            condition,
            body: Box::new(body),
            span: node.span,
        })
    }

    fn bind_do_while_statement(&mut self, node: &DoWhileStatement) -> BoundStatement {
        let body = self.bind_loop_body(&node.body);
        let condition = self.bind_expression(&node.condition);
        self.check_condition(&condition);

        BoundStatement::DoWhile(BoundDoWhile {
            body: Box::new(body),
            condition,
            span: node.span,
        })
    }

    fn bind_loop_body(&mut self, body: &Statement) -> BoundStatement {
        self.jump_contexts.push(JumpContext::Loop);
        let body = self.bind_statement(body);
        self.jump_contexts.pop();
        body
    }

    fn bind_block(&mut self, block: &Block) -> BoundBlock {
        self.scopes.push_scope();
        let statements = block
            .statements
            .iter()
            .map(|statement| self.bind_statement(statement))
            .collect();
        self.scopes.pop_scope();
        BoundBlock {
            statements,
            span: block.span,
        }
    }

    /// A jump is legal only when the innermost enclosing context is a loop.
    fn check_jump(&mut self, span: TextSpan, keyword: &str) {
        if !self.jump_contexts.contains(&JumpContext::Loop) {
            self.report(span, &messages::JUMP_MUST_BE_INSIDE_A_LOOP, &[keyword]);
        } else if self.jump_contexts.last() == Some(&JumpContext::Function) {
            self.report(span, &messages::JUMP_CANNOT_CROSS_A_FUNCTION_BOUNDARY, &[keyword]);
        }
    }

    fn check_condition(&mut self, condition: &BoundExpression) {
        let ty = condition.ty();
        if !ty.is_error() && ty != Type::Boolean {
            let found = ty.to_string();
            self.report(condition.span(), &messages::CONDITION_MUST_BE_BOOLEAN_FOUND_0, &[found.as_str()]);
        }
    }

    fn check_assignable(&mut self, value: &BoundExpression, target: &Type) {
        let ty = value.ty();
        if !ty.assignable_to(target) {
            let (source, target) = (ty.to_string(), target.to_string());
            self.report(value.span(), &messages::TYPE_0_IS_NOT_ASSIGNABLE_TO_TYPE_1, &[source.as_str(), target.as_str()]);
        }
    }

    // ========================================================================
    // Expression binding
    // ========================================================================

    fn bind_expression(&mut self, expr: &Expression) -> BoundExpression {
        match expr {
            Expression::Literal(n) => BoundExpression::Literal(BoundLiteral {
                ty: literal_type(&n.value),
                value: n.value.clone(),
                span: n.span,
            }),
            Expression::Variable(n) => self.bind_variable_reference(n),
            Expression::Assignment(n) => self.bind_assignment(n),
            Expression::Binary(n) => self.bind_binary(n),
            Expression::Unary(n) => self.bind_unary(n),
            Expression::Parenthesized(n) => BoundExpression::Parenthesized(BoundParenthesized {
                expression: Box::new(self.bind_expression(&n.expression)),
                span: n.span,
            }),
            Expression::Call(n) => self.bind_call(n),
            Expression::Ternary(n) => self.bind_ternary(n),
        }
    }

    fn bind_variable_reference(&mut self, identifier: &Identifier) -> BoundExpression {
        if identifier.is_missing() {
            return BoundExpression::Error(identifier.span);
        }
        match self.scopes.get_symbol(&identifier.name) {
            Some(symbol) => BoundExpression::Variable(BoundVariableReference {
                symbol,
                ty: self.symbols[symbol].ty.clone(),
                span: identifier.span,
            }),
            None => {
                self.report(identifier.span, &messages::CANNOT_FIND_NAME_0, &[identifier.name.as_str()]);
                BoundExpression::Error(identifier.span)
            }
        }
    }

    fn bind_assignment(&mut self, node: &AssignmentExpression) -> BoundExpression {
        let target = self.bind_expression(&node.target);

        if let BoundExpression::Variable(reference) = &target {
            let symbol = &self.symbols[reference.symbol];
            if symbol.is_variable() {
                let (id, ty) = (symbol.id, symbol.ty.clone());
                if symbol.is_read_only() {
                    let name = symbol.name.clone();
                    self.report(reference.span, &messages::CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_READ_ONLY, &[name.as_str()]);
                }
                let value = self.bind_expression(&node.value);
                self.check_assignable(&value, &ty);
                return BoundExpression::Assignment(BoundAssignment {
                    symbol: id,
                    value: Box::new(value),
                    ty,
                    span: node.span,
                });
            }
        }

        self.bind_expression(&node.value);
        if !target.is_error() {
            self.report(target.span(), &messages::INVALID_ASSIGNMENT_TARGET, &[]);
        }
        BoundExpression::Error(node.span)
    }

    fn bind_binary(&mut self, node: &BinaryExpression) -> BoundExpression {
        let left = self.bind_expression(&node.left);
        let right = self.bind_expression(&node.right);
        if left.is_error() || right.is_error() {
            return BoundExpression::Error(node.span);
        }

        let (left_type, right_type) = (left.ty(), right.ty());
        match bind_binary_operator(&left_type, node.operator, &right_type) {
            Some((operation, ty)) => BoundExpression::Binary(BoundBinary {
                left: Box::new(left),
                operation,
                right: Box::new(right),
                ty,
                span: node.span,
            }),
            None => {
                let (l, r) = (left_type.to_string(), right_type.to_string());
                self.report(
                    node.operator_span,
                    &messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_TYPES_1_AND_2,
                    &[node.operator.as_str(), l.as_str(), r.as_str()],
                );
                BoundExpression::Error(node.span)
            }
        }
    }

    fn bind_unary(&mut self, node: &UnaryExpression) -> BoundExpression {
        let operand = self.bind_expression(&node.operand);
        if operand.is_error() {
            return BoundExpression::Error(node.span);
        }

        let operand_type = operand.ty();
        match bind_unary_operator(node.operator, &operand_type) {
            Some((operation, ty)) => BoundExpression::Unary(BoundUnary {
                operation,
                operand: Box::new(operand),
                ty,
                span: node.span,
            }),
            None => {
                let found = operand_type.to_string();
                self.report(
                    node.operator_span,
                    &messages::OPERATOR_0_CANNOT_BE_APPLIED_TO_TYPE_1,
                    &[node.operator.as_str(), found.as_str()],
                );
                BoundExpression::Error(node.span)
            }
        }
    }

    fn bind_call(&mut self, node: &CallExpression) -> BoundExpression {
        let target = self.bind_expression(&node.target);
        let target_type = target.ty();

        let Some(signature) = target_type.as_function() else {
            for argument in &node.arguments {
                self.bind_expression(argument);
            }
            if !target.is_error() {
                let found = target_type.to_string();
                self.report(target.span(), &messages::EXPRESSION_OF_TYPE_0_IS_NOT_CALLABLE, &[found.as_str()]);
            }
            return BoundExpression::Error(node.span);
        };

        let arguments: Vec<BoundExpression> = node
            .arguments
            .iter()
            .map(|argument| self.bind_expression(argument))
            .collect();

        if arguments.len() != signature.parameters.len() {
            let (expected, actual) = (signature.parameters.len().to_string(), arguments.len().to_string());
            self.report(node.arguments_span, &messages::EXPECTED_0_ARGUMENTS_BUT_GOT_1, &[expected.as_str(), actual.as_str()]);
        }

        for (argument, parameter) in arguments.iter().zip(&signature.parameters) {
            let ty = argument.ty();
            if !ty.assignable_to(parameter) {
                let (found, expected) = (ty.to_string(), parameter.to_string());
                self.report(
                    argument.span(),
                    &messages::ARGUMENT_OF_TYPE_0_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE_1,
                    &[found.as_str(), expected.as_str()],
                );
            }
        }

        BoundExpression::Call(BoundCall {
            target: Box::new(target),
            arguments,
            ty: signature.return_type.clone(),
            span: node.span,
        })
    }

    fn bind_ternary(&mut self, node: &TernaryExpression) -> BoundExpression {
        let condition = self.bind_expression(&node.condition);
        let then_expression = self.bind_expression(&node.then_expression);
        let else_expression = self.bind_expression(&node.else_expression);
        self.check_condition(&condition);

        let (then_type, else_type) = (then_expression.ty(), else_expression.ty());
        let ty = if then_type == else_type { then_type } else { Type::Any };

        BoundExpression::Ternary(BoundTernary {
            condition: Box::new(condition),
            then_expression: Box::new(then_expression),
            else_expression: Box::new(else_expression),
            ty,
            span: node.span,
        })
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_type(value: &LiteralValue) -> Type {
    match value {
        LiteralValue::Boolean(_) => Type::Boolean,
        LiteralValue::Int(_) => Type::Int,
        LiteralValue::Long(_) => Type::Long,
        LiteralValue::Float(_) => Type::Float,
        LiteralValue::Double(_) => Type::Double,
        LiteralValue::String(_) => Type::String,
        LiteralValue::Char(_) => Type::Char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sash_nodebuilder::NodeBuilder;

    fn bind(b: &NodeBuilder, statements: Vec<Statement>) -> (BoundProgram, DiagnosticCollection) {
        let file = b.source_file("test.sash", statements);
        let mut binder = Binder::new();
        let program = binder.bind_source_file(&file);
        (program, binder.take_diagnostics())
    }

    #[test]
    fn test_binder_creation() {
        let binder = Binder::new();
        assert!(binder.symbols().is_empty());
        assert!(binder.jump_contexts.is_empty());
    }

    #[test]
    fn test_inferred_variable_type() {
        let b = NodeBuilder::new();
        let (program, diagnostics) = bind(&b, vec![b.let_var("s", None, b.string("hi"))]);
        assert!(diagnostics.is_empty());
        let symbol = program.symbols.find("s").unwrap();
        assert_eq!(symbol.ty, Type::String);
        assert!(symbol.is_read_only());
    }

    #[test]
    fn test_initializer_cannot_see_its_own_variable() {
        let b = NodeBuilder::new();
        let (_, diagnostics) = bind(&b, vec![b.let_var("x", None, b.var("x"))]);
        assert_eq!(diagnostics.count_code(messages::CANNOT_FIND_NAME_0.code), 1);
    }

    #[test]
    fn test_missing_names_are_silent() {
        let b = NodeBuilder::new();
        let (program, diagnostics) = bind(
            &b,
            vec![
                b.let_var("", None, b.int(1)),
                b.print(b.var("")),
            ],
        );
        assert!(diagnostics.is_empty());
        match &program.statements[1] {
            BoundStatement::Print(print) => assert!(print.expression.is_error()),
            other => panic!("expected print, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_type_annotation_is_error_type() {
        let b = NodeBuilder::new();
        let (program, diagnostics) = bind(&b, vec![b.let_var("x", Some(""), b.int(1))]);
        assert!(diagnostics.is_empty());
        assert_eq!(program.symbols.find("x").unwrap().ty, Type::Error);
    }

    #[test]
    fn test_jump_context_is_restored() {
        let b = NodeBuilder::new();
        let mut binder = Binder::new();
        let file = b.source_file(
            "test.sash",
            vec![b.while_stmt(b.boolean(true), b.block_stmt(vec![b.break_stmt()]))],
        );
        binder.bind_source_file(&file);
        assert!(binder.jump_contexts.is_empty());
        assert!(binder.take_diagnostics().is_empty());
    }
}

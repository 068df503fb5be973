//! Return-path completeness.
//!
//! Decides whether every path through a statement list ends in a jump
//! (`return`, `break` or `continue`), and checks each `return` against the
//! expected return type on the way.

use crate::binder::Binder;
use crate::bound::BoundStatement;
use crate::types::Type;
use sash_diagnostics::messages;

/// Outcome of a return-path check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    /// Some path falls off the end and a value is required.
    MustBeSpecified,
    /// Some path falls off the end, and the emitter should append an
    /// implicit return because the function returns Unit.
    MustBeInserted,
    /// Every path ends in a jump.
    Valid,
}

impl ReturnStatus {
    pub fn is_valid(self) -> bool {
        self == ReturnStatus::Valid
    }

    /// Whether the function needs no diagnostic.
    pub fn is_ok(self) -> bool {
        matches!(self, ReturnStatus::Valid | ReturnStatus::MustBeInserted)
    }
}

impl Binder {
    /// Check a function body (or the program) against `expected`.
    pub(crate) fn check_return_paths(&mut self, statements: &[BoundStatement], expected: &Type) -> ReturnStatus {
        match self.check_statement_list(statements, expected) {
            ReturnStatus::MustBeSpecified if matches!(expected, Type::Unit | Type::Error) => {
                ReturnStatus::MustBeInserted
            }
            status => status,
        }
    }

    /// Valid as soon as one statement is valid. Every statement after that
    /// one is still checked and then reported as unreachable.
    fn check_statement_list(&mut self, statements: &[BoundStatement], expected: &Type) -> ReturnStatus {
        let first_valid = statements
            .iter()
            .position(|statement| self.check_statement(statement, expected).is_valid());

        let Some(index) = first_valid else {
            return ReturnStatus::MustBeSpecified;
        };

        for statement in &statements[index + 1..] {
            self.check_statement(statement, expected);
            self.report(statement.span(), &messages::UNREACHABLE_STATEMENT, &[]);
        }
        ReturnStatus::Valid
    }

    fn check_statement(&mut self, statement: &BoundStatement, expected: &Type) -> ReturnStatus {
        match statement {
            BoundStatement::Block(block) => self.check_statement_list(&block.statements, expected),
            BoundStatement::Return(node) => {
                match &node.value {
                    None => {
                        if !matches!(expected, Type::Unit | Type::Error) {
                            let expected = expected.to_string();
                            self.report(node.span, &messages::RETURN_VALUE_OF_TYPE_0_EXPECTED, &[expected.as_str()]);
                        }
                    }
                    Some(value) => {
                        let found = value.ty();
                        if !found.assignable_to(expected) {
                            let (found, expected) = (found.to_string(), expected.to_string());
                            self.report(
                                node.span,
                                &messages::CANNOT_RETURN_0_FROM_FUNCTION_RETURNING_1,
                                &[found.as_str(), expected.as_str()],
                            );
                        }
                    }
                }
                ReturnStatus::Valid
            }
            BoundStatement::Break(_) | BoundStatement::Continue(_) => ReturnStatus::Valid,
            BoundStatement::If(node) => {
                let then_status = self.check_statement(&node.then_branch, expected);
                let else_status = match &node.else_branch {
                    Some(branch) => self.check_statement(branch, expected),
                    None => ReturnStatus::MustBeSpecified,
                };
                if then_status.is_valid() && else_status.is_valid() {
                    ReturnStatus::Valid
                } else {
                    ReturnStatus::MustBeSpecified
                }
            }
            // A loop body may never run, so a loop never completes a path.
            BoundStatement::While(node) => {
                self.check_statement(&node.body, expected);
                ReturnStatus::MustBeSpecified
            }
            BoundStatement::DoWhile(node) => {
                self.check_statement(&node.body, expected);
                ReturnStatus::MustBeSpecified
            }
            BoundStatement::Function(_)
            | BoundStatement::Variable(_)
            | BoundStatement::Print(_)
            | BoundStatement::Expression(_) => ReturnStatus::MustBeSpecified,
        }
    }
}

//! Operator resolution.
//!
//! Operators are resolved from the operand types and the source token.
//! Binary operands must have identical types; there are no implicit
//! conversions.

use crate::types::Type;
use sash_ast::{BinaryOperator, UnaryOperator};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Concat,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    LogicalAnd,
    LogicalOr,
}

impl fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOperation::Addition | BinaryOperation::Concat => "+",
            BinaryOperation::Subtraction => "-",
            BinaryOperation::Multiplication => "*",
            BinaryOperation::Division => "/",
            BinaryOperation::Equals => "==",
            BinaryOperation::NotEquals => "!=",
            BinaryOperation::GreaterThan => ">",
            BinaryOperation::GreaterThanEqual => ">=",
            BinaryOperation::LessThan => "<",
            BinaryOperation::LessThanEqual => "<=",
            BinaryOperation::LogicalAnd => "&&",
            BinaryOperation::LogicalOr => "||",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperation {
    Identity,
    Negation,
    LogicalNegation,
}

fn is_numeric(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::Long | Type::Float | Type::Double)
}

fn is_equatable(ty: &Type) -> bool {
    is_numeric(ty) || matches!(ty, Type::Boolean | Type::String | Type::Char)
}

/// Resolve `left operator right` to an operation and its result type.
/// Returns `None` when the combination is not defined.
pub fn bind_binary_operator(left: &Type, operator: BinaryOperator, right: &Type) -> Option<(BinaryOperation, Type)> {
    if left != right {
        return None;
    }
    let ty = left;
    let resolved = match operator {
        BinaryOperator::Plus if *ty == Type::String => (BinaryOperation::Concat, Type::String),
        BinaryOperator::Plus if is_numeric(ty) => (BinaryOperation::Addition, ty.clone()),
        BinaryOperator::Minus if is_numeric(ty) => (BinaryOperation::Subtraction, ty.clone()),
        BinaryOperator::Star if is_numeric(ty) => (BinaryOperation::Multiplication, ty.clone()),
        BinaryOperator::Slash if is_numeric(ty) => (BinaryOperation::Division, ty.clone()),
        BinaryOperator::Greater if is_numeric(ty) => (BinaryOperation::GreaterThan, Type::Boolean),
        BinaryOperator::GreaterEquals if is_numeric(ty) => (BinaryOperation::GreaterThanEqual, Type::Boolean),
        BinaryOperator::Less if is_numeric(ty) => (BinaryOperation::LessThan, Type::Boolean),
        BinaryOperator::LessEquals if is_numeric(ty) => (BinaryOperation::LessThanEqual, Type::Boolean),
        BinaryOperator::EqualsEquals if is_equatable(ty) => (BinaryOperation::Equals, Type::Boolean),
        BinaryOperator::ExclamationEquals if is_equatable(ty) => (BinaryOperation::NotEquals, Type::Boolean),
        BinaryOperator::AmpersandAmpersand if *ty == Type::Boolean => (BinaryOperation::LogicalAnd, Type::Boolean),
        BinaryOperator::BarBar if *ty == Type::Boolean => (BinaryOperation::LogicalOr, Type::Boolean),
        _ => return None,
    };
    Some(resolved)
}

/// Resolve `operator operand` to an operation and its result type.
pub fn bind_unary_operator(operator: UnaryOperator, operand: &Type) -> Option<(UnaryOperation, Type)> {
    match operator {
        UnaryOperator::Plus if is_numeric(operand) => Some((UnaryOperation::Identity, operand.clone())),
        UnaryOperator::Minus if is_numeric(operand) => Some((UnaryOperation::Negation, operand.clone())),
        UnaryOperator::Exclamation if *operand == Type::Boolean => Some((UnaryOperation::LogicalNegation, Type::Boolean)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_keeps_operand_type() {
        assert_eq!(
            bind_binary_operator(&Type::Long, BinaryOperator::Star, &Type::Long),
            Some((BinaryOperation::Multiplication, Type::Long))
        );
        assert_eq!(
            bind_binary_operator(&Type::Double, BinaryOperator::Slash, &Type::Double),
            Some((BinaryOperation::Division, Type::Double))
        );
    }

    #[test]
    fn test_string_plus_is_concat() {
        assert_eq!(
            bind_binary_operator(&Type::String, BinaryOperator::Plus, &Type::String),
            Some((BinaryOperation::Concat, Type::String))
        );
        assert_eq!(bind_binary_operator(&Type::String, BinaryOperator::Minus, &Type::String), None);
    }

    #[test]
    fn test_mixed_operands_are_rejected() {
        assert_eq!(bind_binary_operator(&Type::Int, BinaryOperator::Plus, &Type::Long), None);
        assert_eq!(bind_binary_operator(&Type::String, BinaryOperator::Plus, &Type::Int), None);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            bind_binary_operator(&Type::Float, BinaryOperator::LessEquals, &Type::Float),
            Some((BinaryOperation::LessThanEqual, Type::Boolean))
        );
        assert_eq!(bind_binary_operator(&Type::Char, BinaryOperator::Less, &Type::Char), None);
        assert_eq!(
            bind_binary_operator(&Type::Char, BinaryOperator::ExclamationEquals, &Type::Char),
            Some((BinaryOperation::NotEquals, Type::Boolean))
        );
        assert_eq!(bind_binary_operator(&Type::Unit, BinaryOperator::EqualsEquals, &Type::Unit), None);
    }

    #[test]
    fn test_logical_operators_need_booleans() {
        assert_eq!(
            bind_binary_operator(&Type::Boolean, BinaryOperator::BarBar, &Type::Boolean),
            Some((BinaryOperation::LogicalOr, Type::Boolean))
        );
        assert_eq!(bind_binary_operator(&Type::Int, BinaryOperator::AmpersandAmpersand, &Type::Int), None);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(
            bind_unary_operator(UnaryOperator::Minus, &Type::Int),
            Some((UnaryOperation::Negation, Type::Int))
        );
        assert_eq!(
            bind_unary_operator(UnaryOperator::Plus, &Type::Double),
            Some((UnaryOperation::Identity, Type::Double))
        );
        assert_eq!(
            bind_unary_operator(UnaryOperator::Exclamation, &Type::Boolean),
            Some((UnaryOperation::LogicalNegation, Type::Boolean))
        );
        assert_eq!(bind_unary_operator(UnaryOperator::Exclamation, &Type::Int), None);
        assert_eq!(bind_unary_operator(UnaryOperator::Minus, &Type::String), None);
    }
}

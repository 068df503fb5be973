//! The closed set of sash types.

use std::fmt;
use std::rc::Rc;

/// A resolved type.
///
/// `Error` marks a value whose problem has already been diagnosed. It is
/// assignable to and from everything so that one mistake produces one
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Char,
    Unit,
    Any,
    Error,
    Function(Rc<FunctionType>),
}

/// The signature of a function. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    pub parameters: Vec<Type>,
    pub return_type: Type,
}

impl FunctionType {
    pub fn new(parameters: Vec<Type>, return_type: Type) -> Self {
        Self {
            parameters,
            return_type,
        }
    }
}

impl Type {
    /// The types that can be named in a type annotation, with their names.
    pub const NAMED: [(&'static str, Type); 9] = [
        ("Boolean", Type::Boolean),
        ("Double", Type::Double),
        ("String", Type::String),
        ("Float", Type::Float),
        ("Long", Type::Long),
        ("Any", Type::Any),
        ("Char", Type::Char),
        ("Unit", Type::Unit),
        ("Int", Type::Int),
    ];

    pub fn function(parameters: Vec<Type>, return_type: Type) -> Type {
        Type::Function(Rc::new(FunctionType::new(parameters, return_type)))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error)
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Whether a value of this type may be stored where `target` is expected.
    ///
    /// Function parameters are compared in the same direction as the return
    /// type, not contravariantly. The language has no user subtyping, so the
    /// two only differ through `Any` and `Error`.
    pub fn assignable_to(&self, target: &Type) -> bool {
        if self.is_error() || matches!(target, Type::Error | Type::Any) {
            return true;
        }
        match (self, target) {
            (Type::Function(source), Type::Function(target)) => {
                source.parameters.len() == target.parameters.len()
                    && source
                        .parameters
                        .iter()
                        .zip(&target.parameters)
                        .all(|(s, t)| s.assignable_to(t))
                    && source.return_type.assignable_to(&target.return_type)
            }
            (Type::Function(_), _) | (_, Type::Function(_)) => false,
            (source, target) => source == target,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => f.write_str("Boolean"),
            Type::Int => f.write_str("Int"),
            Type::Long => f.write_str("Long"),
            Type::Float => f.write_str("Float"),
            Type::Double => f.write_str("Double"),
            Type::String => f.write_str("String"),
            Type::Char => f.write_str("Char"),
            Type::Unit => f.write_str("Unit"),
            Type::Any => f.write_str("Any"),
            Type::Error => f.write_str("???"),
            Type::Function(function) => write!(f, "{}", function),
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", parameter)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PRIMITIVES: [Type; 10] = [
        Type::Boolean,
        Type::Int,
        Type::Long,
        Type::Float,
        Type::Double,
        Type::String,
        Type::Char,
        Type::Unit,
        Type::Any,
        Type::Error,
    ];

    #[test]
    fn test_primitives_are_reflexive() {
        for ty in ALL_PRIMITIVES.iter() {
            assert!(ty.assignable_to(ty), "{} should accept itself", ty);
        }
    }

    #[test]
    fn test_error_absorbs_everything() {
        let function = Type::function(vec![Type::Int], Type::Unit);
        for ty in ALL_PRIMITIVES.iter().chain(std::iter::once(&function)) {
            assert!(Type::Error.assignable_to(ty));
            assert!(ty.assignable_to(&Type::Error));
        }
    }

    #[test]
    fn test_everything_flows_into_any() {
        assert!(Type::Int.assignable_to(&Type::Any));
        assert!(Type::function(vec![], Type::Int).assignable_to(&Type::Any));
        assert!(!Type::Any.assignable_to(&Type::Int));
    }

    #[test]
    fn test_distinct_primitives_never_mix() {
        let concrete = [
            Type::Boolean,
            Type::Int,
            Type::Long,
            Type::Float,
            Type::Double,
            Type::String,
            Type::Char,
            Type::Unit,
        ];
        for (i, a) in concrete.iter().enumerate() {
            for (j, b) in concrete.iter().enumerate() {
                if i != j {
                    assert!(!a.assignable_to(b), "{} should not flow into {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_function_parameters_use_same_direction() {
        let takes_int = Type::function(vec![Type::Int], Type::Int);
        let takes_any = Type::function(vec![Type::Any], Type::Int);
        assert!(takes_int.assignable_to(&takes_any));
        assert!(!takes_any.assignable_to(&takes_int));
    }

    #[test]
    fn test_function_arity_must_match() {
        let unary = Type::function(vec![Type::Int], Type::Unit);
        let binary = Type::function(vec![Type::Int, Type::Int], Type::Unit);
        assert!(!unary.assignable_to(&binary));
        assert!(!binary.assignable_to(&unary));
    }

    #[test]
    fn test_function_equality_is_structural() {
        assert_eq!(
            Type::function(vec![Type::Int, Type::String], Type::Boolean),
            Type::function(vec![Type::Int, Type::String], Type::Boolean)
        );
        assert_ne!(Type::function(vec![], Type::Int), Type::function(vec![], Type::Long));
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::Error.to_string(), "???");
        assert_eq!(
            Type::function(vec![Type::Int, Type::Char], Type::Unit).to_string(),
            "(Int, Char) -> Unit"
        );
    }
}

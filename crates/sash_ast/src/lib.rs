//! sash_ast: Syntax tree definitions for the sash language.
//!
//! The tree is produced by an external parser and handed to the binder.
//! Every node owns its children and carries the source span it was parsed
//! from. The whole tree is serde-serializable so that it can cross a process
//! boundary as JSON.

pub mod node;
pub mod operator;

pub use node::*;
pub use operator::{BinaryOperator, UnaryOperator};

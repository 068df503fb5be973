//! sash_binder: Name resolution, type checking and control-flow validation.
//!
//! The binder walks a `sash_ast` syntax tree and produces the bound tree
//! consumed by the emitter. It owns the type and symbol model and the scope
//! chain used during binding.

mod binder;
pub mod bound;
pub mod operators;
mod return_paths;
mod scope;
mod symbol;
pub mod types;

pub use binder::Binder;
pub use bound::BoundProgram;
pub use return_paths::ReturnStatus;
pub use scope::{Scope, ScopeChain};
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};
pub use types::{FunctionType, Type};

use sash_ast::SourceFile;
use sash_diagnostics::DiagnosticCollection;

/// Bind a source file with a fresh binder.
pub fn bind_source_file(source_file: &SourceFile) -> (BoundProgram, DiagnosticCollection) {
    let mut binder = Binder::new();
    let program = binder.bind_source_file(source_file);
    (program, binder.take_diagnostics())
}

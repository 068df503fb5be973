//! Scope management for the binder.

use crate::symbol::SymbolId;
use crate::types::Type;
use sash_core::FxMap;

/// One frame of the scope chain.
#[derive(Debug, Default)]
pub struct Scope {
    /// Symbols declared in this scope, by name.
    pub symbols: FxMap<String, SymbolId>,
    /// Types nameable in this scope.
    pub types: FxMap<String, Type>,
    /// The enclosing scope (None for the outermost type scope).
    pub parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new(parent: Option<Box<Scope>>) -> Self {
        Self {
            symbols: FxMap::default(),
            types: FxMap::default(),
            parent,
        }
    }
}

/// Nested name and type lookup tables, innermost first.
///
/// The outermost frame holds the primitive type names; the program's
/// top-level scope sits directly inside it.
#[derive(Debug)]
pub struct ScopeChain {
    current: Box<Scope>,
    depth: u32,
}

impl ScopeChain {
    pub fn new() -> Self {
        let mut types = Scope::new(None);
        for (name, ty) in Type::NAMED {
            types.types.insert(name.to_string(), ty);
        }
        Self {
            current: Box::new(Scope::new(Some(Box::new(types)))),
            depth: 0,
        }
    }

    pub fn push_scope(&mut self) {
        let parent = std::mem::take(&mut self.current);
        self.current = Box::new(Scope::new(Some(parent)));
        self.depth += 1;
    }

    /// Discard the innermost scope. The program scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.depth == 0 {
            return;
        }
        if let Some(parent) = self.current.parent.take() {
            self.current = parent;
            self.depth -= 1;
        }
    }

    /// Declare `name` in the innermost scope. Callers check
    /// [`ScopeChain::has_symbol`] first; an existing entry is overwritten.
    pub fn put_symbol(&mut self, name: &str, symbol: SymbolId) {
        self.current.symbols.insert(name.to_string(), symbol);
    }

    /// Whether `name` is declared in the innermost scope.
    pub fn has_symbol(&self, name: &str) -> bool {
        self.current.symbols.contains_key(name)
    }

    pub fn get_symbol(&self, name: &str) -> Option<SymbolId> {
        let mut scope = Some(&*self.current);
        while let Some(s) = scope {
            if let Some(&id) = s.symbols.get(name) {
                return Some(id);
            }
            scope = s.parent.as_deref();
        }
        None
    }

    pub fn get_type(&self, name: &str) -> Option<Type> {
        let mut scope = Some(&*self.current);
        while let Some(s) = scope {
            if let Some(ty) = s.types.get(name) {
                return Some(ty.clone());
            }
            scope = s.parent.as_deref();
        }
        None
    }
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_types_are_seeded() {
        let chain = ScopeChain::new();
        assert_eq!(chain.get_type("Int"), Some(Type::Int));
        assert_eq!(chain.get_type("Unit"), Some(Type::Unit));
        assert_eq!(chain.get_type("???"), None);
        assert_eq!(chain.get_type("Foo"), None);
    }

    #[test]
    fn test_lookup_walks_outward() {
        let mut chain = ScopeChain::new();
        chain.put_symbol("x", SymbolId(0));
        chain.push_scope();
        assert!(!chain.has_symbol("x"));
        assert_eq!(chain.get_symbol("x"), Some(SymbolId(0)));
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut chain = ScopeChain::new();
        chain.put_symbol("x", SymbolId(0));
        chain.push_scope();
        chain.put_symbol("x", SymbolId(1));
        assert_eq!(chain.get_symbol("x"), Some(SymbolId(1)));
        chain.pop_scope();
        assert_eq!(chain.get_symbol("x"), Some(SymbolId(0)));
    }

    #[test]
    fn test_pop_discards_frame() {
        let mut chain = ScopeChain::new();
        chain.push_scope();
        chain.put_symbol("y", SymbolId(3));
        chain.pop_scope();
        chain.push_scope();
        assert_eq!(chain.get_symbol("y"), None);
    }

    #[test]
    fn test_program_scope_is_never_popped() {
        let mut chain = ScopeChain::new();
        chain.put_symbol("g", SymbolId(0));
        chain.pop_scope();
        assert_eq!(chain.get_symbol("g"), Some(SymbolId(0)));
        assert_eq!(chain.get_type("Int"), Some(Type::Int));
    }
}

//! sash_core: Shared primitives for the sash compiler back end.
//!
//! Provides source spans and the hashing collections used by
//! the binder and the emitter.

pub mod collections;
pub mod text;

pub use collections::{FxHashSet, FxIndexMap, FxIndexSet, FxMap};
pub use text::{TextPos, TextSpan};

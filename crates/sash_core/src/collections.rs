//! Hash collection aliases used throughout the compiler.
//!
//! Compiler tables are keyed by small integers and short identifiers, so
//! FxHash is used everywhere; DoS resistance is not a concern here.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

/// A hash map using FxHash.
pub type FxMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A hash set using FxHash.
pub type FxHashSet<T> = rustc_hash::FxHashSet<T>;

/// An insertion-ordered map using FxHash. Entry positions are stable
/// as long as nothing is removed, which the slot and pool tables rely on.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// An insertion-ordered set using FxHash.
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_set_positions_are_insertion_order() {
        let mut set = FxIndexSet::default();
        assert_eq!(set.insert_full("b"), (0, true));
        assert_eq!(set.insert_full("a"), (1, true));
        assert_eq!(set.insert_full("b"), (0, false));
        assert_eq!(set.get_index_of("a"), Some(1));
    }

    #[test]
    fn test_index_map_iterates_in_insertion_order() {
        let mut map = FxIndexMap::default();
        map.insert(3u32, "c");
        map.insert(1u32, "a");
        map.insert(2u32, "b");
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec![3, 1, 2]);
    }
}

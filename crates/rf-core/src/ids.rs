//! Strongly typed arena indices.
//!
//! Nodes, edges, streets, and agents all live in flat `Vec` arenas; the ids
//! below are plain indices into them.  Keeping adjacency as index lists (not
//! object references) means the graph has no ownership cycles and serializes
//! without special handling.

use std::fmt;

/// Generate a typed index wrapper around `u32`.
macro_rules! arena_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub u32);

        impl $name {
            /// Sentinel for "not assigned yet".
            pub const INVALID: $name = $name(u32::MAX);

            /// Position in the owning arena.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Build an id from an arena position.
            #[inline]
            pub fn from_index(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize, "arena index overflow");
                $name(index as u32)
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

arena_id! {
    /// Position of an agent in the roster arrays.
    pub struct AgentId;
}

arena_id! {
    /// A road-network vertex.
    pub struct NodeId;
}

arena_id! {
    /// A directed road-network edge.
    pub struct EdgeId;
}

arena_id! {
    /// A source line feature (one street may span many edges).
    pub struct StreetId;
}

arena_id! {
    /// A heat zone within one generated set.
    pub struct ZoneId;
}

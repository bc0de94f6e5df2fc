//! Stable typed identifiers for arena-allocated entities.
//!
//! Every entity of a Schemata workspace lives in an arena and is addressed by
//! one of the ids defined here. Ids are plain `Copy` handles; references
//! between entities (a figure's bound object, a figure's layer, an object's
//! model) are stored as ids rather than owning pointers.
//!
//! Ids are allocated from a single monotonically increasing counter and are
//! never reused, so an id captured before an undo still names the same
//! entity after a redo.
//!
//! # Examples
//!
//! ```
//! use schemata_core::identifier::{FigureId, ObjectId};
//!
//! let table = ObjectId::from_raw(7);
//! let figure = FigureId::from_raw(8);
//! assert_eq!(table.raw(), 7);
//! assert_eq!(figure.to_string(), "figure#8");
//! ```

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw counter value.
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw counter value.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifies a model (one catalog plus its diagrams).
    ModelId,
    "model"
);

entity_id!(
    /// Identifies a catalog object: schema, table, view, routine group,
    /// routine or foreign key.
    ObjectId,
    "object"
);

entity_id!(
    /// Identifies a diagram.
    DiagramId,
    "diagram"
);

entity_id!(
    /// Identifies a layer within a diagram.
    LayerId,
    "layer"
);

entity_id!(
    /// Identifies a figure within a diagram.
    FigureId,
    "figure"
);

entity_id!(
    /// Identifies a connection within a diagram.
    ConnectionId,
    "connection"
);

/// Source of fresh ids.
///
/// A single allocator is shared by all id kinds, so raw values are unique
/// across kinds as well.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator whose first id is `1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    fn bump(&mut self) -> u64 {
        if self.next == 0 {
            self.next = 1;
        }
        let raw = self.next;
        self.next += 1;
        raw
    }

    pub fn model(&mut self) -> ModelId {
        ModelId(self.bump())
    }

    pub fn object(&mut self) -> ObjectId {
        ObjectId(self.bump())
    }

    pub fn diagram(&mut self) -> DiagramId {
        DiagramId(self.bump())
    }

    pub fn layer(&mut self) -> LayerId {
        LayerId(self.bump())
    }

    pub fn figure(&mut self) -> FigureId {
        FigureId(self.bump())
    }

    pub fn connection(&mut self) -> ConnectionId {
        ConnectionId(self.bump())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_kind_prefix() {
        assert_eq!(ModelId::from_raw(1).to_string(), "model#1");
        assert_eq!(ObjectId::from_raw(2).to_string(), "object#2");
        assert_eq!(DiagramId::from_raw(3).to_string(), "diagram#3");
        assert_eq!(LayerId::from_raw(4).to_string(), "layer#4");
        assert_eq!(FigureId::from_raw(5).to_string(), "figure#5");
        assert_eq!(ConnectionId::from_raw(6).to_string(), "connection#6");
    }

    #[test]
    fn test_allocator_never_repeats() {
        let mut ids = IdAllocator::new();
        let a = ids.object();
        let b = ids.figure();
        let c = ids.object();

        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(c.raw(), 3);
        assert_ne!(a, c);
    }

    #[test]
    fn test_default_allocator_starts_at_one() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.layer().raw(), 1);
    }

    #[test]
    fn test_hash_and_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(FigureId::from_raw(1), "first");
        map.insert(FigureId::from_raw(2), "second");

        assert_eq!(map.get(&FigureId::from_raw(1)), Some(&"first"));
        assert_eq!(map.len(), 2);
    }
}

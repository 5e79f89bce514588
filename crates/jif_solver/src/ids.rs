//! Opaque ID newtypes for solver-tracked entities.
//!
//! [`VarId`] and [`NodeId`] are thin `u32` wrappers used as arena indices into
//! a backend's variable and intermediate-node registries.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for arena lookups.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a decision variable.
    VarId
);

define_id!(
    /// Opaque, copyable ID for a named intermediate quantity.
    NodeId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn var_id_roundtrip() {
        let id = VarId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn node_id_equality() {
        assert_eq!(NodeId::from_raw(7), NodeId::from_raw(7));
        assert_ne!(NodeId::from_raw(7), NodeId::from_raw(8));
    }

    #[test]
    fn var_id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(VarId::from_raw(1));
        set.insert(VarId::from_raw(2));
        set.insert(VarId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let id = VarId::from_raw(9);
        let json = serde_json::to_string(&id).unwrap();
        let restored: VarId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}

//! Strong, zero-cost identifier handles for deck entities.
//!
//! Every entity in a finite-element deck (grid point, element, property,
//! material) is addressed by a positive integer. Each kind gets its own
//! newtype around `NonZeroU64` so a node id can never be passed where an
//! element id is expected, and 0 stays reserved as an invalid sentinel.
//!
//! This module provides:
//! - [`PointId`], [`ElementId`], [`PropertyId`], [`MaterialId`], all
//!   `repr(transparent)` over `NonZeroU64`.
//! - The [`MeshId`] trait, which lets renumbering and merging code treat all
//!   four kinds generically.
//! - [`EntityKind`], used in diagnostics and errors.

use std::fmt;
use std::hash::Hash;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshEquivError;

/// Kind of deck entity an identifier belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Node,
    Element,
    Property,
    Material,
}

impl EntityKind {
    /// All kinds, in the order the renumberer processes them.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Node,
        EntityKind::Element,
        EntityKind::Property,
        EntityKind::Material,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Element => "element",
            EntityKind::Property => "property",
            EntityKind::Material => "material",
        };
        f.write_str(name)
    }
}

/// Common behaviour of every typed deck identifier.
pub trait MeshId: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display {
    /// The entity kind this id addresses.
    const KIND: EntityKind;

    /// Fallible constructor; rejects 0.
    fn try_from_raw(raw: u64) -> Result<Self, MeshEquivError>;

    /// The raw integer value.
    fn raw(self) -> u64;
}

macro_rules! mesh_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates a new id from a raw `u64` value.
            ///
            /// Returns [`MeshEquivError::InvalidId`] if `raw == 0`.
            #[inline]
            pub fn new(raw: u64) -> Result<Self, MeshEquivError> {
                NonZeroU64::new(raw)
                    .map($name)
                    .ok_or(MeshEquivError::InvalidId($kind))
            }

            /// Returns the inner `u64` value.
            #[inline]
            pub const fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl MeshId for $name {
            const KIND: EntityKind = $kind;

            #[inline]
            fn try_from_raw(raw: u64) -> Result<Self, MeshEquivError> {
                Self::new(raw)
            }

            #[inline]
            fn raw(self) -> u64 {
                self.get()
            }
        }

        impl TryFrom<u64> for $name {
            type Error = MeshEquivError;

            fn try_from(raw: u64) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.get()).finish()
            }
        }

        /// Prints only the raw integer, the way deck cards carry it.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.get())
            }
        }
    };
}

mesh_id!(
    /// Grid point (node) identifier.
    PointId,
    EntityKind::Node
);
mesh_id!(
    /// Element identifier.
    ElementId,
    EntityKind::Element
);
mesh_id!(
    /// Property identifier referenced by elements.
    PropertyId,
    EntityKind::Property
);
mesh_id!(
    /// Material identifier referenced by properties.
    MaterialId,
    EntityKind::Material
);


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert_eq!(
            PointId::new(0),
            Err(MeshEquivError::InvalidId(EntityKind::Node))
        );
        assert_eq!(
            ElementId::try_from(0),
            Err(MeshEquivError::InvalidId(EntityKind::Element))
        );
    }

    #[test]
    fn new_and_get() {
        let p = PointId::new(42).unwrap();
        assert_eq!(p.get(), 42);
        assert_eq!(p.raw(), 42);
        assert_eq!(<PropertyId as MeshId>::KIND, EntityKind::Property);
    }

    #[test]
    fn debug_and_display() {
        let p = PointId::new(7).unwrap();
        assert_eq!(format!("{:?}", p), "PointId(7)");
        assert_eq!(format!("{}", p), "7");
        let m = MaterialId::new(3).unwrap();
        assert_eq!(format!("{:?}", m), "MaterialId(3)");
    }

    #[test]
    fn ordering_follows_raw_value() {
        let a = PointId::new(1).unwrap();
        let b = PointId::new(u64::MAX).unwrap();
        assert!(a < b);
    }

    #[test]
    fn json_roundtrip() {
        let p = ElementId::new(123).unwrap();
        let s = serde_json::to_string(&p).unwrap();
        assert_eq!(s, "123");
        let back: ElementId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<ElementId>("0").is_err());
    }
}

//! Newtype IDs for the dataset collections.
//!
//! Using newtypes prevents mixing up the four ID kinds (e.g. passing an
//! image ID where an annotation ID is expected); the aggregate's counters
//! hand them out in order and nothing else may mint them from thin air
//! except deserialization.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

id_type! {
    /// A unique identifier for an image (one emitted tile).
    ImageId
}

id_type! {
    /// A unique identifier for an annotation.
    AnnotationId
}

id_type! {
    /// A unique identifier for a category.
    CategoryId
}

id_type! {
    /// A unique identifier for an ingested source raster.
    SourceId
}

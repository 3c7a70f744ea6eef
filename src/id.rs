//! Identifier types.
//!
//! Provides `TraitId` and `EffectKey`, interned string identifiers backed
//! by `Arc<str>` so they are cheap to clone into sets, slots and breakdowns.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new identifier from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok($name::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

interned_id! {
    /// Identifier of a trait definition (the key of the content map).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use trait_engine::TraitId;
    ///
    /// let a = TraitId::new("iron_skin");
    /// let b: TraitId = "iron_skin".into();
    /// assert_eq!(a, b);
    /// assert_eq!(a.as_str(), "iron_skin");
    /// ```
    TraitId
}

interned_id! {
    /// Name of an effect a trait applies, e.g. `attackBonus`.
    ///
    /// Known keys have dedicated constants in [`crate::modifiers::keys`];
    /// any other string is accepted and treated as an additive key.
    EffectKey
}

//! Typed identifiers.
//!
//! Two families are used across the autopilot core:
//!
//! - nanoid-backed ids (`define_id!`) for entities minted locally and read
//!   back only by this process (e.g. [`TaskId`] handed to the sandbox/task
//!   manager adapters).
//! - uuid-backed ids (`define_uuid_id!`) for causal-graph entities
//!   ([`SpanId`], [`ActionId`]) that double as filenames on disk
//!   (`spans/<id>.json`, `actions/<id>.json`) and must be globally unique
//!   across restarts without a shared counter.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Inline small-string buffer backing nanoid-based ids. Avoids a heap
/// allocation for the common case of a short, fixed-alphabet id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdBuf(SmolStr);

impl IdBuf {
    pub fn generate(prefix: &str) -> Self {
        let suffix = nanoid::nanoid!(12);
        Self(SmolStr::new(format!("{prefix}_{suffix}")))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn short(&self, len: usize) -> &str {
        let s = self.0.as_str();
        &s[..len.min(s.len())]
    }
}

impl fmt::Display for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for IdBuf {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.0.as_str())
    }
}

impl<'de> Deserialize<'de> for IdBuf {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Self(SmolStr::new(s)))
    }
}

/// Declares a nanoid-backed newtype id with a fixed string prefix.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(crate::id::IdBuf);

        impl $name {
            pub fn new() -> Self {
                Self(crate::id::IdBuf::generate($prefix))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            pub fn short(&self, len: usize) -> &str {
                self.0.short(len)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0.as_str().to_string()
            }
        }
    };
}

/// Declares a uuid-backed newtype id, stable across JSON round-trips and
/// usable directly as a filename stem.
macro_rules! define_uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> uuid::Uuid {
                self.0
            }

            /// A uuid is always 36 chars; `short` trims for log-line brevity.
            pub fn short(&self, len: usize) -> String {
                let s = self.0.to_string();
                s[..len.min(s.len())].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::parse_str(s)?))
            }
        }
    };
}

pub(crate) use define_id;
pub(crate) use define_uuid_id;

define_id!(TaskId, "task");
define_id!(EventId, "evt");

define_uuid_id!(SpanId);
define_uuid_id!(ActionId);

/// A trace is identified by the id of its root span.
pub type TraceId = SpanId;

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT

//! Stable identifiers for the data model, each prefixed so they read
//! unambiguously in logs (`TH-...`, `JOB-...`, `APR-...`, `TS-...`).

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! prefixed_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, random id.
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Wrap an existing id string verbatim (e.g. read back from storage).
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::from_raw(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from_raw(raw.to_owned())
            }
        }
    };
}

prefixed_id!(ThreadId, "TH-");
prefixed_id!(JobId, "JOB-");
prefixed_id!(ApprovalId, "APR-");
prefixed_id!(SessionId, "TS-");

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;

// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A process-unique identifier assigned to a render core when it is constructed.
///
/// The id never changes for the lifetime of the core. It is used for equality and
/// tracing only, never for ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderCoreId(Uuid);

impl RenderCoreId {
    /// Creates a new, random (version 4) `RenderCoreId`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RenderCoreId {
    /// Creates a new, random (version 4) `RenderCoreId`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RenderCoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = RenderCoreId::new();
        let b = RenderCoreId::new();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn display_matches_uuid() {
        let id = RenderCoreId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn serde_preserves_identity() {
        let id = RenderCoreId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: RenderCoreId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

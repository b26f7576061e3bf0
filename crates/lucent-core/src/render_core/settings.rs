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

//! Per-core configuration.

use serde::{Deserialize, Serialize};

/// Well-known shader variable names.
pub mod shader_variable_names {
    /// The object-to-world matrix.
    pub const WORLD_MATRIX: &str = "mWorld";
    /// The flag telling the vertex shader to read per-instance data.
    pub const HAS_INSTANCES: &str = "bHasInstances";
}

/// Settings that control how a render core binds to its technique.
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCoreSettings {
    /// The technique to resolve on the effect. `None` uses the technique provider's name.
    pub technique_name: Option<String>,
    /// The name of the matrix variable that receives `model * world`.
    pub world_matrix_variable: String,
    /// The name of the boolean variable toggled for instanced draws.
    pub has_instances_variable: String,
}

impl Default for RenderCoreSettings {
    fn default() -> Self {
        Self {
            technique_name: None,
            world_matrix_variable: shader_variable_names::WORLD_MATRIX.to_owned(),
            has_instances_variable: shader_variable_names::HAS_INSTANCES.to_owned(),
        }
    }
}

impl RenderCoreSettings {
    /// Parses settings from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns these settings with a fixed technique name.
    pub fn with_technique_name(mut self, name: impl Into<String>) -> Self {
        self.technique_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_standard_variable_names() {
        let settings = RenderCoreSettings::default();
        assert_eq!(settings.technique_name, None);
        assert_eq!(settings.world_matrix_variable, "mWorld");
        assert_eq!(settings.has_instances_variable, "bHasInstances");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = RenderCoreSettings::from_json(r#"{ "technique_name": "Shadow" }"#).unwrap();
        assert_eq!(settings.technique_name.as_deref(), Some("Shadow"));
        assert_eq!(settings.world_matrix_variable, "mWorld");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(RenderCoreSettings::from_json("{ technique_name: }").is_err());
    }
}

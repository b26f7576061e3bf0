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

use super::HeadlessEffect;
use lucent_core::renderer::{RenderTechnique, ShaderEffect};
use std::sync::Arc;

/// A [`RenderTechnique`] pairing a technique name with a headless effect.
#[derive(Debug, Clone)]
pub struct HeadlessTechnique {
    name: String,
    effect: Option<Arc<HeadlessEffect>>,
}

impl HeadlessTechnique {
    /// Selects `name` on `effect`.
    pub fn new(name: impl Into<String>, effect: Arc<HeadlessEffect>) -> Self {
        Self {
            name: name.into(),
            effect: Some(effect),
        }
    }

    /// A technique whose shader program failed to load.
    pub fn without_effect(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            effect: None,
        }
    }
}

impl RenderTechnique for HeadlessTechnique {
    fn name(&self) -> &str {
        &self.name
    }

    fn effect(&self) -> Option<Arc<dyn ShaderEffect>> {
        self.effect
            .as_ref()
            .map(|effect| Arc::clone(effect) as Arc<dyn ShaderEffect>)
    }
}

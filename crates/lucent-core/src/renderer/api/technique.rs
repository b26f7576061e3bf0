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

//! Types describing named techniques inside a compiled shader effect.

use crate::renderer::traits::ShaderEffect;
use std::fmt;
use std::sync::Arc;

/// An opaque handle identifying a technique inside its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TechniqueId(pub usize);

/// A named pipeline configuration resolved from a [`ShaderEffect`].
///
/// Equality compares the backend id, the name, and the pass count, so two
/// lookups of the same name on the same effect compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectTechnique {
    /// The backend handle of the technique.
    pub id: TechniqueId,
    /// The name the technique was resolved by.
    pub name: String,
    /// How many passes the technique contains. Each pass is applied before its draw.
    pub pass_count: u32,
}

/// The shader program and technique a render core recorded when it attached.
#[derive(Clone)]
pub struct AttachedTechnique {
    /// The compiled shader program the core is bound to.
    pub effect: Arc<dyn ShaderEffect>,
    /// The technique resolved by name, `None` when the lookup failed.
    pub technique: Option<EffectTechnique>,
}

impl fmt::Debug for AttachedTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedTechnique")
            .field("effect", &self.effect.label())
            .field("technique", &self.technique)
            .finish()
    }
}

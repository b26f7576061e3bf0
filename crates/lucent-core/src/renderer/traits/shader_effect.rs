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

use crate::math::Mat4;
use crate::renderer::api::EffectTechnique;
use crate::renderer::error::RenderError;
use crate::renderer::traits::GraphicsDevice;
use std::fmt::Debug;
use std::sync::Arc;

/// A backend resource that a render core can own and must release explicitly.
///
/// Releasing is idempotent on the backend side; render cores additionally guarantee
/// they call [`release`](GpuResource::release) at most once per acquisition.
pub trait GpuResource: Debug + Send + Sync {
    /// The debug name of the resource (e.g. the shader variable name).
    fn name(&self) -> &str;

    /// Returns the resource to the backend.
    fn release(&self);

    /// Whether [`release`](GpuResource::release) has already been called.
    fn is_released(&self) -> bool;
}

/// A handle to a `float4x4` shader variable.
pub trait MatrixVariable: GpuResource {
    /// Writes a matrix into the variable.
    /// ## Errors
    /// * `RenderError` - If the backend fails or the handle was already released.
    fn set_matrix(&self, value: &Mat4) -> Result<(), RenderError>;
}

/// A handle to a scalar shader variable.
pub trait ScalarVariable: GpuResource {
    /// Writes a boolean into the variable.
    fn set_bool(&self, value: bool) -> Result<(), RenderError>;

    /// Writes a float into the variable.
    fn set_f32(&self, value: f32) -> Result<(), RenderError>;
}

/// A compiled shader program: named techniques plus named variables.
///
/// Lookups by name distinguish "absent" from "broken": a name that does not exist
/// yields `None` (or `Ok(None)`), while a backend failure yields an error.
pub trait ShaderEffect: Debug + Send + Sync {
    /// A debug label for the effect.
    fn label(&self) -> &str;

    /// Looks up a technique by name. Returns `None` if the effect has no such technique.
    fn technique_by_name(&self, name: &str) -> Option<EffectTechnique>;

    /// Acquires a handle to the matrix variable called `name`.
    /// ## Returns
    /// `Ok(None)` if the effect does not declare it.
    /// ## Errors
    /// * `RenderError` - If the backend fails while creating the handle.
    fn matrix_variable(&self, name: &str) -> Result<Option<Arc<dyn MatrixVariable>>, RenderError>;

    /// Acquires a handle to the scalar variable called `name`.
    /// ## Returns
    /// `Ok(None)` if the effect does not declare it.
    /// ## Errors
    /// * `RenderError` - If the backend fails while creating the handle.
    fn scalar_variable(&self, name: &str) -> Result<Option<Arc<dyn ScalarVariable>>, RenderError>;

    /// The device the effect was compiled for, if it is bound to one.
    fn device(&self) -> Option<Arc<dyn GraphicsDevice>>;
}

/// Supplies a shader program and the name of the technique to use from it.
///
/// Render cores query this once, when they attach.
pub trait RenderTechnique {
    /// The technique name to resolve on the effect.
    fn name(&self) -> &str;

    /// The compiled shader program, or `None` if it failed to load.
    fn effect(&self) -> Option<Arc<dyn ShaderEffect>>;
}

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

//! Defines the backend traits render cores are written against.
//!
//! These contracts decouple the render core state machine from any specific
//! graphics backend.
//!
//! - [`ShaderEffect`] / [`RenderTechnique`]: the technique provider queried at attach time.
//! - [`MatrixVariable`], [`ScalarVariable`], [`GpuResource`]: handles a core owns while attached.
//! - [`GraphicsDevice`]: buffer allocation for cores that own geometry.
//! - [`DeviceContext`] / [`FrameContext`]: what a core receives on every render call.

mod device_context;
mod graphics_device;
mod shader_effect;

pub use self::device_context::{DeviceContext, FrameContext};
pub use self::graphics_device::GraphicsDevice;
pub use self::shader_effect::{
    GpuResource, MatrixVariable, RenderTechnique, ScalarVariable, ShaderEffect,
};

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

//! Per-frame data handed to every render core.

use crate::math::Mat4;
use crate::renderer::traits::{DeviceContext, FrameContext};
use std::fmt;

/// The transform matrices a renderer publishes once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameMatrices {
    /// The parent transform of the core being rendered.
    ///
    /// Cores write the literal product `model * world` to their world-matrix
    /// variable. With the column-vector `Mat4 * Vec4` product, that matrix
    /// transforms a vertex by `world` first and by the model matrix second.
    pub world: Mat4,
    /// The camera view matrix.
    pub view: Mat4,
    /// The camera projection matrix.
    pub projection: Mat4,
}

/// A ready-made [`FrameContext`] pairing frame matrices with a borrowed device context.
///
/// The device context is borrowed for the frame only, which ties its validity to a
/// single pass over the render cores.
pub struct RenderFrame<'a> {
    /// The matrices for this frame.
    pub matrices: FrameMatrices,
    device_context: &'a mut dyn DeviceContext,
}

impl<'a> RenderFrame<'a> {
    /// Creates a frame over the given device context.
    pub fn new(matrices: FrameMatrices, device_context: &'a mut dyn DeviceContext) -> Self {
        Self {
            matrices,
            device_context,
        }
    }

    /// Replaces the world matrix, e.g. while descending into a child node.
    pub fn set_world_matrix(&mut self, world: Mat4) {
        self.matrices.world = world;
    }
}

impl FrameContext for RenderFrame<'_> {
    fn world_matrix(&self) -> Mat4 {
        self.matrices.world
    }

    fn view_matrix(&self) -> Mat4 {
        self.matrices.view
    }

    fn projection_matrix(&self) -> Mat4 {
        self.matrices.projection
    }

    fn device_context(&mut self) -> &mut dyn DeviceContext {
        &mut *self.device_context
    }
}

impl fmt::Debug for RenderFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderFrame")
            .field("matrices", &self.matrices)
            .finish_non_exhaustive()
    }
}

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
use crate::renderer::api::{BufferId, EffectTechnique, IndexFormat, PrimitiveTopology, RasterState};
use crate::renderer::error::RenderError;
use std::ops::Range;

/// The command-submission handle render cores record their draws into.
///
/// Every method may fail with a backend error (for instance
/// [`RenderError::DeviceLost`]); render cores propagate such errors unmodified.
pub trait DeviceContext {
    /// Sets the rasterizer state for subsequent draw calls.
    fn set_raster_state(&mut self, state: &RasterState) -> Result<(), RenderError>;

    /// Sets how vertices are assembled into primitives.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<(), RenderError>;

    /// Binds a vertex buffer to a specific slot.
    fn set_vertex_buffer(
        &mut self,
        slot: u32,
        buffer: BufferId,
        stride: u32,
        offset: u64,
    ) -> Result<(), RenderError>;

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(
        &mut self,
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), RenderError>;

    /// Applies one pass of a technique: its shaders and any pending variable writes.
    fn apply_technique_pass(
        &mut self,
        technique: &EffectTechnique,
        pass: u32,
    ) -> Result<(), RenderError>;

    /// Records a non-indexed draw call.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) -> Result<(), RenderError>;

    /// Records an indexed draw call.
    fn draw_indexed(
        &mut self,
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    ) -> Result<(), RenderError>;
}

/// Per-frame data supplied by the renderer to every render core.
///
/// The command-submission handle returned by [`device_context`](FrameContext::device_context)
/// is valid for the duration of one render call.
pub trait FrameContext {
    /// The parent-to-world transform for the core being rendered.
    fn world_matrix(&self) -> Mat4;

    /// The camera view matrix.
    fn view_matrix(&self) -> Mat4;

    /// The camera projection matrix.
    fn projection_matrix(&self) -> Mat4;

    /// The command-submission handle for this frame.
    fn device_context(&mut self) -> &mut dyn DeviceContext;
}

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

use lucent_core::math::Mat4;
use lucent_core::renderer::api::{
    BufferId, EffectTechnique, FrameMatrices, IndexFormat, PrimitiveTopology, RasterState,
};
use lucent_core::renderer::{DeviceContext, FrameContext, RenderError};
use std::ops::Range;

/// A command recorded by [`RecordingDeviceContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// `set_raster_state`
    SetRasterState(RasterState),
    /// `set_primitive_topology`
    SetPrimitiveTopology(PrimitiveTopology),
    /// `set_vertex_buffer`
    SetVertexBuffer {
        /// The vertex buffer slot.
        slot: u32,
        /// The bound buffer.
        buffer: BufferId,
        /// The distance in bytes between two elements.
        stride: u32,
        /// The byte offset into the buffer.
        offset: u64,
    },
    /// `set_index_buffer`
    SetIndexBuffer {
        /// The bound buffer.
        buffer: BufferId,
        /// The index width.
        format: IndexFormat,
        /// The byte offset into the buffer.
        offset: u64,
    },
    /// `apply_technique_pass`
    ApplyTechniquePass {
        /// The name of the applied technique.
        technique: String,
        /// The pass index.
        pass: u32,
    },
    /// `draw`
    Draw {
        /// The vertex range.
        vertices: Range<u32>,
        /// The instance range.
        instances: Range<u32>,
    },
    /// `draw_indexed`
    DrawIndexed {
        /// The index range.
        indices: Range<u32>,
        /// The value added to each index.
        base_vertex: i32,
        /// The instance range.
        instances: Range<u32>,
    },
}

impl RecordedCommand {
    /// `true` for `Draw` and `DrawIndexed`.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            RecordedCommand::Draw { .. } | RecordedCommand::DrawIndexed { .. }
        )
    }
}

/// A [`DeviceContext`] that records every call instead of executing it.
#[derive(Debug, Default)]
pub struct RecordingDeviceContext {
    commands: Vec<RecordedCommand>,
    device_lost: bool,
}

impl RecordingDeviceContext {
    /// Creates an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded commands, oldest first.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Returns the recorded commands and starts a new recording.
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The number of draw calls recorded.
    pub fn draw_call_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// While set, every call fails with [`RenderError::DeviceLost`] and records nothing.
    pub fn set_device_lost(&mut self, lost: bool) {
        self.device_lost = lost;
    }

    fn record(&mut self, command: RecordedCommand) -> Result<(), RenderError> {
        if self.device_lost {
            return Err(RenderError::DeviceLost);
        }
        self.commands.push(command);
        Ok(())
    }
}

impl DeviceContext for RecordingDeviceContext {
    fn set_raster_state(&mut self, state: &RasterState) -> Result<(), RenderError> {
        self.record(RecordedCommand::SetRasterState(*state))
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) -> Result<(), RenderError> {
        self.record(RecordedCommand::SetPrimitiveTopology(topology))
    }

    fn set_vertex_buffer(
        &mut self,
        slot: u32,
        buffer: BufferId,
        stride: u32,
        offset: u64,
    ) -> Result<(), RenderError> {
        self.record(RecordedCommand::SetVertexBuffer {
            slot,
            buffer,
            stride,
            offset,
        })
    }

    fn set_index_buffer(
        &mut self,
        buffer: BufferId,
        format: IndexFormat,
        offset: u64,
    ) -> Result<(), RenderError> {
        self.record(RecordedCommand::SetIndexBuffer {
            buffer,
            format,
            offset,
        })
    }

    fn apply_technique_pass(
        &mut self,
        technique: &EffectTechnique,
        pass: u32,
    ) -> Result<(), RenderError> {
        if pass >= technique.pass_count {
            return Err(RenderError::InvalidDrawState(format!(
                "technique '{}' has {} pass(es), pass {pass} requested",
                technique.name, technique.pass_count
            )));
        }
        self.record(RecordedCommand::ApplyTechniquePass {
            technique: technique.name.clone(),
            pass,
        })
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) -> Result<(), RenderError> {
        self.record(RecordedCommand::Draw {
            vertices,
            instances,
        })
    }

    fn draw_indexed(
        &mut self,
        indices: Range<u32>,
        base_vertex: i32,
        instances: Range<u32>,
    ) -> Result<(), RenderError> {
        self.record(RecordedCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        })
    }
}

/// A [`FrameContext`] owning its matrices and a [`RecordingDeviceContext`].
#[derive(Debug, Default)]
pub struct HeadlessFrame {
    /// The matrices for this frame.
    pub matrices: FrameMatrices,
    context: RecordingDeviceContext,
}

impl HeadlessFrame {
    /// Creates a frame with the given matrices and an empty recording.
    pub fn new(matrices: FrameMatrices) -> Self {
        Self {
            matrices,
            context: RecordingDeviceContext::new(),
        }
    }

    /// Creates a frame whose world matrix is `world` and whose camera is the identity.
    pub fn with_world(world: Mat4) -> Self {
        Self::new(FrameMatrices {
            world,
            ..Default::default()
        })
    }

    /// The recording of this frame.
    pub fn recording(&self) -> &RecordingDeviceContext {
        &self.context
    }

    /// Mutable access to the recording, e.g. to simulate a device loss.
    pub fn recording_mut(&mut self) -> &mut RecordingDeviceContext {
        &mut self.context
    }

    /// Shorthand for `recording().commands()`.
    pub fn commands(&self) -> &[RecordedCommand] {
        self.context.commands()
    }
}

impl FrameContext for HeadlessFrame {
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
        &mut self.context
    }
}

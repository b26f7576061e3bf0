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

//! A render core drawing indexed or non-indexed meshes, optionally instanced.

mod error;
mod geometry;

pub use self::error::MeshError;
pub use self::geometry::{InstanceData, MeshGeometry, MeshVertex};

use lucent_core::render_core::{
    RenderCore, RenderCoreBase, RenderCoreExt, RenderCoreSettings, ResourceCollector,
    ResourceKey,
};
use lucent_core::renderer::api::{
    BufferDescriptor, BufferId, BufferUsage, IndexFormat, RasterState,
};
use lucent_core::renderer::{FrameContext, GraphicsDevice, RenderError, ScalarVariable};
use std::borrow::Cow;
use std::sync::Arc;

#[derive(Debug)]
struct GpuMesh {
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
    keys: Vec<ResourceKey>,
}

#[derive(Debug)]
struct GpuInstances {
    buffer: BufferId,
    key: ResourceKey,
}

/// Registers a device buffer with the collector so detach destroys it.
fn collect_buffer(
    resources: &mut ResourceCollector,
    device: &Arc<dyn GraphicsDevice>,
    buffer: BufferId,
    label: &'static str,
) -> ResourceKey {
    let device = Arc::clone(device);
    resources.collect_with(label, move || {
        if let Err(e) = device.destroy_buffer(buffer) {
            log::warn!("Failed to destroy {label} buffer {buffer:?}: {e}");
        }
    })
}

fn upload(
    resources: &mut ResourceCollector,
    device: &Arc<dyn GraphicsDevice>,
    label: &'static str,
    usage: BufferUsage,
    data: &[u8],
) -> Result<(BufferId, ResourceKey), RenderError> {
    let descriptor = BufferDescriptor {
        label: Some(Cow::Borrowed(label)),
        size: data.len() as u64,
        usage: usage | BufferUsage::COPY_DST,
    };
    let buffer = device.create_buffer_with_data(&descriptor, data)?;
    Ok((buffer, collect_buffer(resources, device, buffer, label)))
}

fn upload_geometry(
    resources: &mut ResourceCollector,
    device: &Arc<dyn GraphicsDevice>,
    geometry: &MeshGeometry,
) -> Result<GpuMesh, RenderError> {
    let (vertex_buffer, vertex_key) = upload(
        resources,
        device,
        "mesh_vertices",
        BufferUsage::VERTEX,
        geometry.vertex_bytes(),
    )?;
    let mut keys = vec![vertex_key];

    let index_buffer = match geometry.indices() {
        Some(indices) => {
            let uploaded = upload(
                resources,
                device,
                "mesh_indices",
                BufferUsage::INDEX,
                bytemuck::cast_slice(indices),
            );
            match uploaded {
                Ok((buffer, key)) => {
                    keys.push(key);
                    Some(buffer)
                }
                Err(e) => {
                    resources.release(vertex_key);
                    return Err(e);
                }
            }
        }
        None => None,
    };

    Ok(GpuMesh {
        vertex_buffer,
        index_buffer,
        keys,
    })
}

fn upload_instances(
    resources: &mut ResourceCollector,
    device: &Arc<dyn GraphicsDevice>,
    instances: &InstanceData,
) -> Result<GpuInstances, RenderError> {
    let (buffer, key) = upload(
        resources,
        device,
        "mesh_instances",
        BufferUsage::VERTEX,
        instances.bytes(),
    )?;
    Ok(GpuInstances { buffer, key })
}

/// Draws one mesh with the attached technique.
///
/// On attach it binds the world matrix, the optional instancing flag, and uploads
/// its geometry through the effect's device. Every pass of the technique issues
/// one draw. When instance data is set, the instancing flag is raised for the draw
/// and lowered again in `post_render`.
#[derive(Debug)]
pub struct MeshRenderCore {
    base: RenderCoreBase,
    geometry: MeshGeometry,
    instances: Option<InstanceData>,
    raster_state: RasterState,
    gpu_mesh: Option<GpuMesh>,
    gpu_instances: Option<GpuInstances>,
    has_instances_variable: Option<Arc<dyn ScalarVariable>>,
    instancing_flag_set: bool,
}

impl MeshRenderCore {
    /// Creates a detached core for `geometry` with default settings.
    pub fn new(geometry: MeshGeometry) -> Self {
        Self::with_settings(geometry, RenderCoreSettings::default())
    }

    /// Creates a detached core for `geometry` with the given settings.
    pub fn with_settings(geometry: MeshGeometry, settings: RenderCoreSettings) -> Self {
        Self {
            base: RenderCoreBase::with_settings(settings),
            geometry,
            instances: None,
            raster_state: RasterState::default(),
            gpu_mesh: None,
            gpu_instances: None,
            has_instances_variable: None,
            instancing_flag_set: false,
        }
    }

    /// Builder form of [`set_instances`](Self::set_instances) for a detached core.
    pub fn with_instances(mut self, instances: InstanceData) -> Self {
        self.instances = Some(instances);
        self
    }

    /// Builder form of [`set_raster_state`](Self::set_raster_state).
    pub fn with_raster_state(mut self, raster_state: RasterState) -> Self {
        self.raster_state = raster_state;
        self
    }

    /// The CPU-side geometry.
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// The per-instance data, if the mesh is instanced.
    pub fn instances(&self) -> Option<&InstanceData> {
        self.instances.as_ref()
    }

    /// The raster state applied before each draw.
    pub fn raster_state(&self) -> &RasterState {
        &self.raster_state
    }

    /// The uploaded vertex buffer, while attached.
    pub fn vertex_buffer(&self) -> Option<BufferId> {
        self.gpu_mesh.as_ref().map(|mesh| mesh.vertex_buffer)
    }

    /// The uploaded index buffer, while attached and indexed.
    pub fn index_buffer(&self) -> Option<BufferId> {
        self.gpu_mesh.as_ref().and_then(|mesh| mesh.index_buffer)
    }

    /// The uploaded instance buffer, while attached and instanced.
    pub fn instance_buffer(&self) -> Option<BufferId> {
        self.gpu_instances.as_ref().map(|instances| instances.buffer)
    }

    /// Replaces the geometry.
    ///
    /// While attached, the previous buffers are released at once and the new
    /// geometry is uploaded. Raises an invalidation requiring a rerender.
    ///
    /// ## Errors
    /// * `MeshError::Render` - If the upload failed. The core is detached and can be
    ///   attached again once the device recovers.
    pub fn set_geometry(&mut self, geometry: MeshGeometry) -> Result<(), MeshError> {
        let device = self.attached_device();
        if let Some(old) = self.gpu_mesh.take() {
            for key in old.keys {
                self.base.resources_mut().release(key);
            }
        }
        self.geometry = geometry;
        self.base.invalidate_renderer(true);

        if let Some(device) = device {
            match upload_geometry(self.base.resources_mut(), &device, &self.geometry) {
                Ok(mesh) => self.gpu_mesh = Some(mesh),
                Err(e) => return Err(self.detach_after_failed_upload(e)),
            }
        }
        Ok(())
    }

    /// Replaces or removes the per-instance data.
    ///
    /// Same upload and invalidation behavior as [`set_geometry`](Self::set_geometry).
    pub fn set_instances(&mut self, instances: Option<InstanceData>) -> Result<(), MeshError> {
        let device = self.attached_device();
        if let Some(old) = self.gpu_instances.take() {
            self.base.resources_mut().release(old.key);
        }
        self.instances = instances;
        self.base.invalidate_renderer(true);

        if let (Some(device), Some(instances)) = (device, self.instances.as_ref()) {
            match upload_instances(self.base.resources_mut(), &device, instances) {
                Ok(gpu) => self.gpu_instances = Some(gpu),
                Err(e) => return Err(self.detach_after_failed_upload(e)),
            }
        }
        Ok(())
    }

    /// Replaces the raster state and raises an invalidation requiring a rerender.
    pub fn set_raster_state(&mut self, raster_state: RasterState) {
        self.raster_state = raster_state;
        self.base.invalidate_renderer(true);
    }

    fn attached_device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        if self.base.is_attached() {
            self.base.device()
        } else {
            None
        }
    }

    fn detach_after_failed_upload(&mut self, error: RenderError) -> MeshError {
        log::warn!(
            "Mesh core {}: buffer upload failed while attached ({error}); detaching.",
            self.base.id()
        );
        self.detach();
        MeshError::Render(error)
    }

    fn clear_gpu_state(&mut self) {
        self.gpu_mesh = None;
        self.gpu_instances = None;
        self.has_instances_variable = None;
        self.instancing_flag_set = false;
    }

    fn acquire_gpu_resources(&mut self) -> Result<bool, RenderError> {
        if !self.base.acquire_default_resources()? {
            return Ok(false);
        }
        let Some(device) = self.base.device() else {
            log::warn!(
                "Mesh core {}: the effect is not bound to a device.",
                self.base.id()
            );
            return Ok(false);
        };
        let Some(effect) = self.base.effect().cloned() else {
            return Ok(false);
        };

        let name = self.base.settings().has_instances_variable.clone();
        if let Some(variable) = effect.scalar_variable(&name)? {
            self.base.resources_mut().collect(&variable);
            self.has_instances_variable = Some(variable);
        }

        self.gpu_mesh = Some(upload_geometry(
            self.base.resources_mut(),
            &device,
            &self.geometry,
        )?);
        if let Some(instances) = &self.instances {
            self.gpu_instances = Some(upload_instances(
                self.base.resources_mut(),
                &device,
                instances,
            )?);
        }
        Ok(true)
    }
}

impl RenderCore for MeshRenderCore {
    fn base(&self) -> &RenderCoreBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderCoreBase {
        &mut self.base
    }

    fn on_attach(&mut self) -> Result<bool, RenderError> {
        let result = self.acquire_gpu_resources();
        if !matches!(result, Ok(true)) {
            self.clear_gpu_state();
        }
        result
    }

    fn on_detach(&mut self) {
        self.clear_gpu_state();
        let released = self.base.release_resources();
        log::debug!(
            "Mesh core {} released {} resource(s).",
            self.base.id(),
            released
        );
    }

    fn can_render(&self) -> bool {
        self.base.is_attached() && self.gpu_mesh.is_some()
    }

    fn set_raster_states(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        frame.device_context().set_raster_state(&self.raster_state)
    }

    fn set_shader_variables(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.base.write_world_matrix(&frame.world_matrix())?;

        if self.gpu_instances.is_some() {
            if let Some(variable) = &self.has_instances_variable {
                variable.set_bool(true)?;
                self.instancing_flag_set = true;
            }
        }
        Ok(())
    }

    fn on_attach_buffers(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        let Some(mesh) = &self.gpu_mesh else {
            return Err(RenderError::NotInitialized);
        };
        let context = frame.device_context();

        context.set_primitive_topology(self.geometry.topology())?;
        context.set_vertex_buffer(0, mesh.vertex_buffer, self.geometry.vertex_stride(), 0)?;
        if let (Some(gpu), Some(instances)) = (&self.gpu_instances, &self.instances) {
            context.set_vertex_buffer(1, gpu.buffer, instances.stride(), 0)?;
        }
        if let Some(index_buffer) = mesh.index_buffer {
            context.set_index_buffer(index_buffer, IndexFormat::Uint32, 0)?;
        }
        Ok(())
    }

    fn on_render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        let Some(technique) = self.base.technique() else {
            return Ok(());
        };
        let instances = match (&self.gpu_instances, &self.instances) {
            (Some(_), Some(instances)) => 0..instances.count(),
            _ => 0..1,
        };
        let context = frame.device_context();

        for pass in 0..technique.pass_count {
            context.apply_technique_pass(technique, pass)?;
            match self.geometry.index_count() {
                Some(index_count) => context.draw_indexed(0..index_count, 0, instances.clone())?,
                None => context.draw(0..self.geometry.vertex_count(), instances.clone())?,
            }
        }
        Ok(())
    }

    fn post_render(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        if self.instancing_flag_set {
            self.instancing_flag_set = false;
            if let Some(variable) = &self.has_instances_variable {
                variable.set_bool(false)?;
            }
        }
        Ok(())
    }
}

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

use anyhow::Result;
use lucent_core::event::{EventBus, Invalidation};
use lucent_core::math::{Mat4, Vec3};
use lucent_core::render_core::{RenderCore, RenderCoreBase, RenderCoreExt};
use lucent_core::renderer::api::{PrimitiveTopology, RasterState};
use lucent_core::renderer::{DeviceContext, FrameContext, RenderError, ShaderEffect};
use lucent_infra::headless::{
    HeadlessDevice, HeadlessEffect, HeadlessFrame, HeadlessTechnique, RecordedCommand,
    VariableValue,
};
use lucent_lanes::{MeshGeometry, MeshRenderCore, MeshVertex};
use std::sync::Arc;

// --- Test Setup: headless backend and a triangle mesh ---

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn backend(label: &str) -> (Arc<HeadlessDevice>, Arc<HeadlessEffect>) {
    let device = Arc::new(HeadlessDevice::new());
    let effect = Arc::new(
        HeadlessEffect::new(label)
            .with_technique("Forward", 1)
            .with_matrix_variable("mWorld")
            .with_scalar_variable("bHasInstances")
            .with_device(Arc::clone(&device)),
    );
    (device, effect)
}

fn triangle() -> MeshGeometry {
    let vertices = [
        MeshVertex::at([0.0, 0.0, 0.0]),
        MeshVertex::at([1.0, 0.0, 0.0]),
        MeshVertex::at([0.0, 1.0, 0.0]),
    ];
    MeshGeometry::from_vertices(&vertices, PrimitiveTopology::TriangleList)
        .expect("triangle geometry is valid")
}

/// A core that records the order in which the driver calls its steps.
struct TracingCore {
    base: RenderCoreBase,
    steps: Vec<&'static str>,
}

impl TracingCore {
    fn new() -> Self {
        Self {
            base: RenderCoreBase::new(),
            steps: Vec::new(),
        }
    }
}

impl RenderCore for TracingCore {
    fn base(&self) -> &RenderCoreBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderCoreBase {
        &mut self.base
    }

    fn set_raster_states(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.steps.push("set_raster_states");
        frame
            .device_context()
            .set_raster_state(&RasterState::default())
    }

    fn set_shader_variables(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.steps.push("set_shader_variables");
        self.base.write_world_matrix(&frame.world_matrix())
    }

    fn on_attach_buffers(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.steps.push("on_attach_buffers");
        frame
            .device_context()
            .set_primitive_topology(PrimitiveTopology::TriangleList)
    }

    fn on_render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.steps.push("on_render");
        frame.device_context().draw(0..3, 0..1)
    }

    fn post_render(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.steps.push("post_render");
        Ok(())
    }
}
// ---

#[test]
fn render_is_a_noop_while_detached() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let mut core = MeshRenderCore::new(triangle());
    let mut frame = HeadlessFrame::default();

    core.render(&mut frame)?;

    assert!(frame.commands().is_empty());
    assert!(effect.writes().is_empty());
    Ok(())
}

#[test]
fn attach_twice_acquires_resources_once() -> Result<()> {
    init_logger();
    let (device, effect) = backend("basic");
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let mut core = MeshRenderCore::new(triangle());

    assert!(core.attach(&technique)?);
    assert!(core.attach(&technique)?);

    assert_eq!(effect.acquired_handle_count(), 2);
    assert_eq!(device.live_buffer_count(), 1);
    assert_eq!(core.base().resources().len(), 3);
    Ok(())
}

#[test]
fn detach_twice_never_double_releases() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let mut core = MeshRenderCore::new(triangle());
    core.attach(&technique)?;

    core.detach();
    core.detach();

    assert!(!core.base().is_attached());
    assert!(core.base().attached_technique().is_none());
    assert_eq!(effect.double_release_count(), 0);
    Ok(())
}

#[test]
fn attach_detach_cycles_leave_no_backend_resources() -> Result<()> {
    init_logger();
    let (device, effect) = backend("basic");
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let geometry = triangle().with_indices(vec![0, 1, 2])?;
    let mut core = MeshRenderCore::new(geometry);

    for _ in 0..3 {
        assert!(core.attach(&technique)?);
        assert_eq!(device.live_buffer_count(), 2);
        core.detach();
    }

    assert_eq!(effect.live_handle_count(), 0);
    assert_eq!(device.live_buffer_count(), 0);
    assert_eq!(device.allocated_bytes(), 0);
    assert!(core.base().resources().is_empty());
    Ok(())
}

#[test]
fn render_steps_run_in_fixed_order() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let mut core = TracingCore::new();
    core.attach(&technique)?;
    let mut frame = HeadlessFrame::default();

    core.render(&mut frame)?;

    assert_eq!(
        core.steps,
        vec![
            "set_raster_states",
            "set_shader_variables",
            "on_attach_buffers",
            "on_render",
            "post_render"
        ]
    );
    assert_eq!(
        frame.commands(),
        &[
            RecordedCommand::SetRasterState(RasterState::default()),
            RecordedCommand::SetPrimitiveTopology(PrimitiveTopology::TriangleList),
            RecordedCommand::Draw {
                vertices: 0..3,
                instances: 0..1
            },
        ]
    );
    Ok(())
}

#[test]
fn world_variable_receives_model_times_frame_world() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let mut core = MeshRenderCore::new(triangle());
    core.attach(&technique)?;

    let model = Mat4::from_translation(Vec3::new(1.0, -2.0, 0.5)) * Mat4::from_rotation_y(0.3);
    let world = Mat4::from_scale(Vec3::new(2.0, 3.0, 4.0));
    core.base_mut().set_model_matrix(model);
    let mut frame = HeadlessFrame::with_world(world);

    core.render(&mut frame)?;

    assert_eq!(
        effect.last_value("mWorld"),
        Some(VariableValue::Matrix(model * world))
    );
    assert_ne!(model * world, world * model);
    assert_eq!(core.base().model_matrix(), model);
    Ok(())
}

#[test]
fn reset_invalidate_handler_removes_all_listeners() -> Result<()> {
    init_logger();
    let mut core = MeshRenderCore::new(triangle());
    let first = core.base_mut().subscribe_invalidation();
    let second = core.base_mut().subscribe_invalidation();

    core.set_raster_state(RasterState::wireframe());
    assert!(first.try_recv()?.requires_rerender);
    assert!(second.try_recv()?.requires_rerender);

    core.base_mut().reset_invalidate_handler();
    core.set_raster_state(RasterState::default());

    assert_eq!(core.base().invalidation_listener_count(), 0);
    assert!(first.try_recv().is_err());
    assert!(second.try_recv().is_err());
    Ok(())
}

#[test]
fn attach_while_attached_keeps_first_technique() -> Result<()> {
    init_logger();
    let (_device_a, effect_a) = backend("effect_a");
    let (_device_b, effect_b) = backend("effect_b");
    let technique_a = HeadlessTechnique::new("Forward", Arc::clone(&effect_a));
    let technique_b = HeadlessTechnique::new("Forward", Arc::clone(&effect_b));
    let mut core = MeshRenderCore::new(triangle());

    assert!(core.attach(&technique_a)?);
    assert_eq!(
        core.base().technique().cloned(),
        effect_a.technique_by_name("Forward")
    );

    core.attach(&technique_b)?;
    assert_eq!(core.base().effect().map(|e| e.label()), Some("effect_a"));

    core.detach();
    assert!(!core.base().is_attached());

    assert!(core.attach(&technique_b)?);
    assert_eq!(core.base().effect().map(|e| e.label()), Some("effect_b"));
    assert_eq!(effect_a.live_handle_count(), 0);
    Ok(())
}

#[test]
fn reattach_to_unresolvable_technique_stays_detached() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let mut core = MeshRenderCore::new(triangle());
    core.attach(&HeadlessTechnique::new("Forward", Arc::clone(&effect)))?;
    core.detach();

    let attached = core.attach(&HeadlessTechnique::new("Deferred", Arc::clone(&effect)))?;

    assert!(!attached);
    assert!(!core.base().is_attached());
    assert!(core.base().attached_technique().is_none());
    assert_eq!(effect.live_handle_count(), 0);
    Ok(())
}

#[test]
fn technique_without_effect_never_renders() -> Result<()> {
    init_logger();
    let mut core = MeshRenderCore::new(triangle());

    let attached = core.attach(&HeadlessTechnique::without_effect("Forward"))?;

    assert!(!attached);
    assert!(!core.base().is_attached());
    let mut frame = HeadlessFrame::default();
    core.render(&mut frame)?;
    assert!(frame.commands().is_empty());
    Ok(())
}

#[test]
fn backend_failure_during_attach_propagates() {
    init_logger();
    let (device, effect) = backend("basic");
    effect.fail_variable_lookups(true);
    let mut core = MeshRenderCore::new(triangle());

    let result = core.attach(&HeadlessTechnique::new("Forward", Arc::clone(&effect)));

    assert!(matches!(result, Err(RenderError::DeviceLost)));
    assert!(!core.base().is_attached());
    assert_eq!(device.live_buffer_count(), 0);
}

#[test]
fn device_loss_during_render_propagates_unmodified() -> Result<()> {
    init_logger();
    let (_device, effect) = backend("basic");
    let mut core = MeshRenderCore::new(triangle());
    core.attach(&HeadlessTechnique::new("Forward", Arc::clone(&effect)))?;
    let mut frame = HeadlessFrame::default();
    frame.recording_mut().set_device_lost(true);

    let result = core.render(&mut frame);

    assert!(matches!(result, Err(RenderError::DeviceLost)));
    assert!(core.base().is_attached());
    Ok(())
}

#[test]
fn shared_bus_collects_invalidations_from_many_cores() {
    init_logger();
    let bus = EventBus::<Invalidation>::new();
    let mut first = MeshRenderCore::new(triangle());
    let mut second = MeshRenderCore::new(triangle());
    first.base_mut().add_invalidation_listener(bus.sender());
    second.base_mut().add_invalidation_listener(bus.sender());

    first.set_raster_state(RasterState::wireframe());
    second.base_mut().invalidate_renderer(false);

    let events = bus.drain();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].source, first.base().id());
    assert!(events[0].requires_rerender);
    assert_eq!(events[1].source, second.base().id());
    assert!(!events[1].requires_rerender);
}

#[test]
fn dropping_an_attached_core_releases_its_resources() -> Result<()> {
    init_logger();
    let (device, effect) = backend("basic");
    {
        let mut core = MeshRenderCore::new(triangle());
        core.attach(&HeadlessTechnique::new("Forward", Arc::clone(&effect)))?;
        assert_eq!(device.live_buffer_count(), 1);
    }
    assert_eq!(device.live_buffer_count(), 0);
    assert_eq!(effect.live_handle_count(), 0);
    Ok(())
}

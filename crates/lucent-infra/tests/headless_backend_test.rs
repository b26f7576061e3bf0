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

use lucent_core::math::{Mat4, Vec3};
use lucent_core::renderer::api::{BufferDescriptor, BufferUsage, FrameMatrices};
use lucent_core::renderer::{
    DeviceContext, FrameContext, GpuResource, GraphicsDevice, MatrixVariable, RenderTechnique,
    ShaderEffect,
};
use lucent_infra::headless::{
    HeadlessDevice, HeadlessEffect, HeadlessFrame, HeadlessTechnique, RecordedCommand,
    VariableValue,
};
use std::sync::Arc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn technique_exposes_effect_and_its_device() {
    init_logger();
    let device = Arc::new(HeadlessDevice::new());
    let effect = Arc::new(
        HeadlessEffect::new("basic")
            .with_technique("Forward", 1)
            .with_matrix_variable("mWorld")
            .with_device(Arc::clone(&device)),
    );
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));

    let shader = technique.effect().expect("effect is present");
    let forward = shader.technique_by_name(technique.name());
    let gpu = shader.device().expect("effect is bound to a device");
    let buffer = gpu
        .create_buffer(&BufferDescriptor {
            label: Some("probe".into()),
            size: 8,
            usage: BufferUsage::UNIFORM,
        })
        .expect("allocation succeeds");

    assert_eq!(forward.map(|t| t.pass_count), Some(1));
    assert_eq!(device.live_buffer_count(), 1);
    gpu.destroy_buffer(buffer).expect("buffer exists");
    assert_eq!(device.live_buffer_count(), 0);
}

#[test]
fn technique_without_effect_has_no_program() {
    let technique = HeadlessTechnique::without_effect("Forward");
    assert_eq!(technique.name(), "Forward");
    assert!(technique.effect().is_none());
}

#[test]
fn variables_write_through_trait_objects() {
    init_logger();
    let effect = Arc::new(HeadlessEffect::new("basic").with_matrix_variable("mWorld"));
    let technique = HeadlessTechnique::new("Forward", Arc::clone(&effect));
    let shader = technique.effect().expect("effect is present");

    let world = shader
        .matrix_variable("mWorld")
        .expect("lookup succeeds")
        .expect("variable is declared");
    let value = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
    world.set_matrix(&value).expect("handle is live");
    world.release();

    assert_eq!(effect.last_value("mWorld"), Some(VariableValue::Matrix(value)));
    assert_eq!(effect.acquired_handle_count(), 1);
    assert_eq!(effect.live_handle_count(), 0);
}

#[test]
fn frame_records_through_its_device_context() {
    let world = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
    let mut frame = HeadlessFrame::new(FrameMatrices {
        world,
        ..Default::default()
    });

    frame.device_context().draw(0..4, 0..2).expect("context is live");

    assert_eq!(frame.world_matrix(), world);
    assert_eq!(frame.view_matrix(), Mat4::IDENTITY);
    assert_eq!(
        frame.commands(),
        &[RecordedCommand::Draw {
            vertices: 0..4,
            instances: 0..2
        }]
    );
}

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

//! # Render Core Lifecycle
//!
//! A **render core** is the per-object unit that binds transform, shader variables,
//! and raster state, then issues the draw calls for one scene-graph node.
//!
//! ## Architecture
//!
//! The lifecycle is split in two traits:
//!
//! 1. **[`RenderCore`]**: implemented by every concrete core. It exposes the
//!    shared [`RenderCoreBase`] and the customizable steps. Only
//!    [`on_render`](RenderCore::on_render) is required.
//!
//! 2. **[`RenderCoreExt`]**: the driver. It is implemented for every `RenderCore`
//!    and cannot be overridden, so the attach/detach bookkeeping and the order of
//!    the render steps are the same for all cores.
//!
//! ```text
//! Detached --attach(technique)--> Attached --detach()--> Detached
//!                                   |  ^
//!                                   +--+ render(frame)
//! ```
//!
//! Every render call runs, in order: `set_raster_states`, `set_shader_variables`,
//! `on_attach_buffers`, `on_render`, `post_render`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! struct Marker { base: RenderCoreBase }
//!
//! impl RenderCore for Marker {
//!     fn base(&self) -> &RenderCoreBase { &self.base }
//!     fn base_mut(&mut self) -> &mut RenderCoreBase { &mut self.base }
//!
//!     fn on_render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
//!         frame.device_context().draw(0..3, 0..1)
//!     }
//! }
//!
//! marker.attach(&technique)?;
//! marker.render(&mut frame)?;
//! marker.detach();
//! ```

mod base;
mod collector;
mod id;
mod settings;

pub use self::base::RenderCoreBase;
pub use self::collector::{ResourceCollector, ResourceKey};
pub use self::id::RenderCoreId;
pub use self::settings::{shader_variable_names, RenderCoreSettings};

use crate::renderer::api::AttachedTechnique;
use crate::renderer::error::RenderError;
use crate::renderer::traits::{FrameContext, RenderTechnique, ShaderEffect};

/// The customizable steps of a render core.
///
/// Every method except [`base`](RenderCore::base), [`base_mut`](RenderCore::base_mut)
/// and [`on_render`](RenderCore::on_render) has a default. An override that wants to
/// extend a default rather than replace it calls the matching [`RenderCoreBase`]
/// helper.
pub trait RenderCore {
    /// The shared state of this core.
    fn base(&self) -> &RenderCoreBase;

    /// Mutable access to the shared state.
    fn base_mut(&mut self) -> &mut RenderCoreBase;

    /// Acquires backend handles after the technique was recorded.
    ///
    /// Anything the core acquires must be registered with
    /// [`RenderCoreBase::resources_mut`] so detach can release it.
    ///
    /// The default calls [`RenderCoreBase::acquire_default_resources`].
    ///
    /// ## Returns
    /// `Ok(false)` when a required resource is missing. The core then stays detached.
    /// ## Errors
    /// * `RenderError` - On unexpected backend failures. They reach the caller of `attach`.
    fn on_attach(&mut self) -> Result<bool, RenderError> {
        self.base_mut().acquire_default_resources()
    }

    /// Releases what was acquired in [`on_attach`](RenderCore::on_attach).
    ///
    /// The default calls [`RenderCoreBase::release_resources`].
    fn on_detach(&mut self) {
        let released = self.base_mut().release_resources();
        log::debug!(
            "Render core {} released {} resource(s).",
            self.base().id(),
            released
        );
    }

    /// Whether [`render`](RenderCoreExt::render) should do anything. Defaults to `is_attached`.
    fn can_render(&self) -> bool {
        self.base().is_attached()
    }

    /// Applies raster and pipeline state. Default: nothing.
    fn set_raster_states(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        Ok(())
    }

    /// Pushes shader variables.
    ///
    /// The default writes `model_matrix * frame.world_matrix()` into the world-matrix
    /// variable, see [`RenderCoreBase::write_world_matrix`].
    fn set_shader_variables(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        self.base().write_world_matrix(&frame.world_matrix())
    }

    /// Binds vertex and index buffers. Default: nothing.
    fn on_attach_buffers(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        Ok(())
    }

    /// Issues the draw calls using the state bound by the previous steps.
    fn on_render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError>;

    /// Restores transient state changed for this draw. Default: nothing.
    fn post_render(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        Ok(())
    }
}

/// The lifecycle driver, implemented for every [`RenderCore`].
pub trait RenderCoreExt: RenderCore {
    /// Binds the core to a technique.
    ///
    /// Does nothing when already attached. Otherwise records the technique's effect,
    /// resolves the technique by name, and runs [`on_attach`](RenderCore::on_attach).
    /// A technique that does not resolve is recorded as `None`, not reported as an error.
    ///
    /// ## Returns
    /// Whether the core is attached after the call.
    /// ## Errors
    /// * `RenderError` - If `on_attach` hit a backend failure. The core is left
    ///   detached with no resources.
    fn attach(&mut self, technique: &dyn RenderTechnique) -> Result<bool, RenderError>;

    /// Releases all resources and returns to the detached state. Safe to repeat.
    fn detach(&mut self);

    /// Runs one frame of the core.
    ///
    /// Returns immediately when [`can_render`](RenderCore::can_render) is false.
    ///
    /// ## Errors
    /// * `RenderError` - The first backend error of any step. Later steps are skipped.
    fn render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError>;
}

impl<T: RenderCore + ?Sized> RenderCoreExt for T {
    fn attach(&mut self, technique: &dyn RenderTechnique) -> Result<bool, RenderError> {
        if self.base().is_attached() {
            log::trace!(
                "Render core {} is already attached; ignoring attach.",
                self.base().id()
            );
            return Ok(true);
        }

        let name = self
            .base()
            .settings()
            .technique_name
            .clone()
            .unwrap_or_else(|| technique.name().to_owned());

        let attached = technique.effect().map(|effect| {
            let resolved = effect.technique_by_name(&name);
            if resolved.is_none() {
                log::warn!(
                    "Effect '{}' has no technique named '{}'.",
                    effect.label(),
                    name
                );
            }
            AttachedTechnique {
                effect,
                technique: resolved,
            }
        });

        self.base_mut().begin_attach(attached);

        match self.on_attach() {
            Ok(true) => {
                self.base_mut().complete_attach();
                log::debug!(
                    "Render core {} attached to technique '{}'.",
                    self.base().id(),
                    name
                );
                Ok(true)
            }
            Ok(false) => {
                let released = self.base_mut().clear_attachment();
                log::debug!(
                    "Render core {} failed to attach to technique '{}' ({} partial resource(s) released).",
                    self.base().id(),
                    name,
                    released
                );
                Ok(false)
            }
            Err(e) => {
                self.base_mut().clear_attachment();
                Err(e)
            }
        }
    }

    fn detach(&mut self) {
        self.base_mut().mark_detached();
        self.on_detach();

        let leftover = self.base_mut().clear_attachment();
        if leftover > 0 {
            log::warn!(
                "Render core {} still owned {} resource(s) after on_detach; released them.",
                self.base().id(),
                leftover
            );
        }
        log::debug!("Render core {} detached.", self.base().id());
    }

    fn render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
        if !self.can_render() {
            return Ok(());
        }

        log::trace!("Render core {}: set states and variables.", self.base().id());
        self.set_raster_states(frame)?;
        self.set_shader_variables(frame)?;

        log::trace!("Render core {}: attach buffers.", self.base().id());
        self.on_attach_buffers(frame)?;

        log::trace!("Render core {}: render.", self.base().id());
        self.on_render(frame)?;

        log::trace!("Render core {}: post render.", self.base().id());
        self.post_render(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec3, Vec4};
    use crate::renderer::api::*;
    use crate::renderer::traits::*;
    use std::ops::Range;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Mock backend ---

    #[derive(Debug, Default)]
    struct MockMatrix {
        released: AtomicBool,
        last: Mutex<Option<Mat4>>,
    }

    impl GpuResource for MockMatrix {
        fn name(&self) -> &str {
            "mWorld"
        }

        fn release(&self) {
            self.released.store(true, Ordering::SeqCst);
        }

        fn is_released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    impl MatrixVariable for MockMatrix {
        fn set_matrix(&self, value: &Mat4) -> Result<(), RenderError> {
            *self.last.lock().unwrap() = Some(*value);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct MockEffect {
        techniques: Vec<&'static str>,
        has_world: bool,
        fail_lookup: bool,
        acquired: AtomicUsize,
        variables: Mutex<Vec<Arc<MockMatrix>>>,
    }

    impl MockEffect {
        fn with(techniques: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                techniques: techniques.to_vec(),
                has_world: true,
                ..Default::default()
            })
        }

        fn live_variables(&self) -> usize {
            self.variables
                .lock()
                .unwrap()
                .iter()
                .filter(|v| !v.is_released())
                .count()
        }
    }

    impl ShaderEffect for MockEffect {
        fn label(&self) -> &str {
            "mock"
        }

        fn technique_by_name(&self, name: &str) -> Option<EffectTechnique> {
            self.techniques
                .iter()
                .position(|t| *t == name)
                .map(|index| EffectTechnique {
                    id: TechniqueId(index),
                    name: name.to_owned(),
                    pass_count: 1,
                })
        }

        fn matrix_variable(
            &self,
            _name: &str,
        ) -> Result<Option<Arc<dyn MatrixVariable>>, RenderError> {
            if self.fail_lookup {
                return Err(RenderError::DeviceLost);
            }
            if !self.has_world {
                return Ok(None);
            }
            self.acquired.fetch_add(1, Ordering::SeqCst);
            let variable = Arc::new(MockMatrix::default());
            self.variables.lock().unwrap().push(Arc::clone(&variable));
            Ok(Some(variable))
        }

        fn scalar_variable(
            &self,
            _name: &str,
        ) -> Result<Option<Arc<dyn ScalarVariable>>, RenderError> {
            Ok(None)
        }

        fn device(&self) -> Option<Arc<dyn GraphicsDevice>> {
            None
        }
    }

    struct MockTechnique {
        name: &'static str,
        effect: Option<Arc<MockEffect>>,
    }

    impl RenderTechnique for MockTechnique {
        fn name(&self) -> &str {
            self.name
        }

        fn effect(&self) -> Option<Arc<dyn ShaderEffect>> {
            self.effect
                .as_ref()
                .map(|effect| Arc::clone(effect) as Arc<dyn ShaderEffect>)
        }
    }

    #[derive(Default)]
    struct CountingContext {
        calls: usize,
    }

    impl DeviceContext for CountingContext {
        fn set_raster_state(&mut self, _state: &RasterState) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn set_primitive_topology(&mut self, _t: PrimitiveTopology) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn set_vertex_buffer(
            &mut self,
            _slot: u32,
            _buffer: BufferId,
            _stride: u32,
            _offset: u64,
        ) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn set_index_buffer(
            &mut self,
            _buffer: BufferId,
            _format: IndexFormat,
            _offset: u64,
        ) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn apply_technique_pass(
            &mut self,
            _technique: &EffectTechnique,
            _pass: u32,
        ) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn draw(&mut self, _v: Range<u32>, _i: Range<u32>) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }

        fn draw_indexed(
            &mut self,
            _indices: Range<u32>,
            _base_vertex: i32,
            _instances: Range<u32>,
        ) -> Result<(), RenderError> {
            self.calls += 1;
            Ok(())
        }
    }

    // --- Instrumented core ---

    #[derive(Default)]
    struct StepCore {
        base: RenderCoreBase,
        steps: Vec<&'static str>,
        fail_on_render: bool,
    }

    impl RenderCore for StepCore {
        fn base(&self) -> &RenderCoreBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut RenderCoreBase {
            &mut self.base
        }

        fn set_raster_states(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
            self.steps.push("raster");
            frame.device_context().set_raster_state(&RasterState::default())
        }

        fn set_shader_variables(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
            self.steps.push("variables");
            self.base.write_world_matrix(&frame.world_matrix())
        }

        fn on_attach_buffers(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
            self.steps.push("buffers");
            Ok(())
        }

        fn on_render(&mut self, frame: &mut dyn FrameContext) -> Result<(), RenderError> {
            self.steps.push("render");
            if self.fail_on_render {
                return Err(RenderError::DeviceLost);
            }
            frame.device_context().draw(0..3, 0..1)
        }

        fn post_render(&mut self, _frame: &mut dyn FrameContext) -> Result<(), RenderError> {
            self.steps.push("post");
            Ok(())
        }
    }

    fn technique(name: &'static str, effect: &Arc<MockEffect>) -> MockTechnique {
        MockTechnique {
            name,
            effect: Some(Arc::clone(effect)),
        }
    }

    #[test]
    fn new_core_is_detached_with_identity_model() {
        let core = StepCore::default();
        assert!(!core.base().is_attached());
        assert!(core.base().attached_technique().is_none());
        assert_eq!(core.base().model_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn attach_resolves_technique_and_world_variable() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();

        assert!(core.attach(&technique("Forward", &effect)).unwrap());

        assert!(core.base().is_attached());
        assert_eq!(core.base().technique().map(|t| t.name.as_str()), Some("Forward"));
        assert!(core.base().world_variable().is_some());
        assert_eq!(core.base().resources().len(), 1);
    }

    #[test]
    fn attach_twice_acquires_once() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();
        let forward = technique("Forward", &effect);

        core.attach(&forward).unwrap();
        core.attach(&forward).unwrap();

        assert_eq!(effect.acquired.load(Ordering::SeqCst), 1);
        assert_eq!(core.base().resources().len(), 1);
    }

    #[test]
    fn unknown_technique_name_leaves_core_detached() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();

        assert!(!core.attach(&technique("Deferred", &effect)).unwrap());

        assert!(!core.base().is_attached());
        assert!(core.base().attached_technique().is_none());
        assert_eq!(effect.acquired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn configured_technique_name_overrides_provider() {
        let effect = MockEffect::with(&["Shadow"]);
        let settings = RenderCoreSettings::default().with_technique_name("Shadow");
        let mut core = StepCore {
            base: RenderCoreBase::with_settings(settings),
            ..Default::default()
        };

        assert!(core.attach(&technique("Forward", &effect)).unwrap());
        assert_eq!(core.base().technique().map(|t| t.name.as_str()), Some("Shadow"));
    }

    #[test]
    fn backend_error_during_attach_propagates_and_leaves_detached() {
        let effect = Arc::new(MockEffect {
            techniques: vec!["Forward"],
            fail_lookup: true,
            ..Default::default()
        });
        let mut core = StepCore::default();

        let result = core.attach(&technique("Forward", &effect));

        assert!(matches!(result, Err(RenderError::DeviceLost)));
        assert!(!core.base().is_attached());
        assert!(core.base().resources().is_empty());
    }

    #[test]
    fn detach_releases_everything_and_is_repeatable() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();
        core.attach(&technique("Forward", &effect)).unwrap();

        core.detach();
        core.detach();

        assert!(!core.base().is_attached());
        assert!(core.base().attached_technique().is_none());
        assert!(core.base().world_variable().is_none());
        assert_eq!(effect.live_variables(), 0);
    }

    #[test]
    fn render_while_detached_touches_nothing() {
        let mut core = StepCore::default();
        let mut context = CountingContext::default();
        let mut frame = RenderFrame::new(FrameMatrices::default(), &mut context);

        core.render(&mut frame).unwrap();

        assert!(core.steps.is_empty());
        assert_eq!(context.calls, 0);
    }

    #[test]
    fn render_runs_steps_in_order() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();
        core.attach(&technique("Forward", &effect)).unwrap();
        let mut context = CountingContext::default();
        let mut frame = RenderFrame::new(FrameMatrices::default(), &mut context);

        core.render(&mut frame).unwrap();

        assert_eq!(core.steps, vec!["raster", "variables", "buffers", "render", "post"]);
        assert_eq!(context.calls, 2);
    }

    #[test]
    fn render_error_skips_remaining_steps() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore {
            fail_on_render: true,
            ..Default::default()
        };
        core.attach(&technique("Forward", &effect)).unwrap();
        let mut context = CountingContext::default();
        let mut frame = RenderFrame::new(FrameMatrices::default(), &mut context);

        let result = core.render(&mut frame);

        assert!(matches!(result, Err(RenderError::DeviceLost)));
        assert_eq!(core.steps, vec!["raster", "variables", "buffers", "render"]);
        assert!(core.base().is_attached());
    }

    #[test]
    fn world_variable_receives_model_times_world() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();
        core.attach(&technique("Forward", &effect)).unwrap();

        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let world = Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        core.base_mut().set_model_matrix(model);

        let mut context = CountingContext::default();
        let matrices = FrameMatrices {
            world,
            ..Default::default()
        };
        core.render(&mut RenderFrame::new(matrices, &mut context)).unwrap();

        let written = effect.variables.lock().unwrap()[0].last.lock().unwrap().unwrap();
        assert_eq!(written, model * world);
        assert_ne!(written, world * model);
    }

    #[test]
    fn written_world_matrix_applies_world_before_model() {
        let effect = MockEffect::with(&["Forward"]);
        let mut core = StepCore::default();
        core.attach(&technique("Forward", &effect)).unwrap();
        core.base_mut()
            .set_model_matrix(Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));

        let mut context = CountingContext::default();
        let matrices = FrameMatrices {
            world: Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0)),
            ..Default::default()
        };
        core.render(&mut RenderFrame::new(matrices, &mut context)).unwrap();

        let written = effect.variables.lock().unwrap()[0].last.lock().unwrap().unwrap();
        let point = written * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(point, Vec4::new(3.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn invalidation_reaches_subscribers_until_reset() {
        let mut core = StepCore::default();
        let receiver = core.base_mut().subscribe_invalidation();

        assert_eq!(core.base_mut().invalidate_renderer(true), 1);
        let event = receiver.try_recv().unwrap();
        assert_eq!(event.source, core.base().id());
        assert!(event.requires_rerender);

        core.base_mut().reset_invalidate_handler();
        assert_eq!(core.base_mut().invalidate_renderer(false), 0);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn dropping_attached_core_releases_resources() {
        let effect = MockEffect::with(&["Forward"]);
        {
            let mut core = StepCore::default();
            core.attach(&technique("Forward", &effect)).unwrap();
            assert_eq!(effect.live_variables(), 1);
        }
        assert_eq!(effect.live_variables(), 0);
    }

    #[test]
    fn missing_effect_yields_detached_core() {
        let mut core = StepCore::default();
        let empty = MockTechnique {
            name: "Forward",
            effect: None,
        };

        assert!(!core.attach(&empty).unwrap());
        assert!(core.base().attached_technique().is_none());
    }
}

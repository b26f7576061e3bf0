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

use super::{RenderCoreId, RenderCoreSettings, ResourceCollector};
use crate::event::{Invalidation, InvalidationEvent};
use crate::math::Mat4;
use crate::renderer::api::{AttachedTechnique, EffectTechnique};
use crate::renderer::error::RenderError;
use crate::renderer::traits::{GraphicsDevice, MatrixVariable, ShaderEffect};
use std::sync::Arc;

/// The state shared by every render core.
///
/// Concrete cores embed one of these and expose it through
/// [`RenderCore::base`](super::RenderCore::base). The attachment fields are only
/// changed by the lifecycle driver in [`RenderCoreExt`](super::RenderCoreExt).
#[derive(Debug)]
pub struct RenderCoreBase {
    id: RenderCoreId,
    settings: RenderCoreSettings,
    model_matrix: Mat4,
    attached: Option<AttachedTechnique>,
    is_attached: bool,
    resources: ResourceCollector,
    world_variable: Option<Arc<dyn MatrixVariable>>,
    invalidation: InvalidationEvent,
}

impl RenderCoreBase {
    /// Creates a detached base with default settings and an identity model matrix.
    pub fn new() -> Self {
        Self::with_settings(RenderCoreSettings::default())
    }

    /// Creates a detached base with the given settings.
    pub fn with_settings(settings: RenderCoreSettings) -> Self {
        Self {
            id: RenderCoreId::new(),
            settings,
            model_matrix: Mat4::IDENTITY,
            attached: None,
            is_attached: false,
            resources: ResourceCollector::new(),
            world_variable: None,
            invalidation: InvalidationEvent::new(),
        }
    }

    /// The identifier assigned at construction.
    pub fn id(&self) -> RenderCoreId {
        self.id
    }

    /// The binding settings of this core.
    pub fn settings(&self) -> &RenderCoreSettings {
        &self.settings
    }

    /// The local-to-parent transform.
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// Replaces the local-to-parent transform. Takes effect on the next render.
    pub fn set_model_matrix(&mut self, model_matrix: Mat4) {
        self.model_matrix = model_matrix;
    }

    /// Whether the last attach succeeded and no detach happened since.
    pub fn is_attached(&self) -> bool {
        self.is_attached
    }

    /// The effect and technique recorded at attach time. `None` while detached.
    pub fn attached_technique(&self) -> Option<&AttachedTechnique> {
        self.attached.as_ref()
    }

    /// The compiled shader program this core is bound to.
    pub fn effect(&self) -> Option<&Arc<dyn ShaderEffect>> {
        self.attached.as_ref().map(|attached| &attached.effect)
    }

    /// The technique resolved by name at attach time.
    pub fn technique(&self) -> Option<&EffectTechnique> {
        self.attached
            .as_ref()
            .and_then(|attached| attached.technique.as_ref())
    }

    /// The device owning the attached effect, if any.
    pub fn device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.effect().and_then(|effect| effect.device())
    }

    /// The resources owned by this core.
    pub fn resources(&self) -> &ResourceCollector {
        &self.resources
    }

    /// Mutable access to the owned resources, to collect handles acquired in `on_attach`.
    pub fn resources_mut(&mut self) -> &mut ResourceCollector {
        &mut self.resources
    }

    /// The bound world-matrix variable.
    pub fn world_variable(&self) -> Option<&Arc<dyn MatrixVariable>> {
        self.world_variable.as_ref()
    }

    /// Performs the default attach work.
    ///
    /// Fails when there is no effect, when the technique name did not resolve, or
    /// when the effect has no world-matrix variable. On success the variable is
    /// bound and registered with the collector.
    ///
    /// ## Errors
    /// * `RenderError` - If the backend fails while acquiring the variable.
    pub fn acquire_default_resources(&mut self) -> Result<bool, RenderError> {
        let Some(attached) = self.attached.as_ref() else {
            log::warn!("Render core {} has no effect to attach to.", self.id);
            return Ok(false);
        };
        if attached.technique.is_none() {
            return Ok(false);
        }

        let name = self.settings.world_matrix_variable.as_str();
        match attached.effect.matrix_variable(name)? {
            Some(variable) => {
                self.resources.collect(&variable);
                self.world_variable = Some(variable);
                Ok(true)
            }
            None => {
                log::warn!(
                    "Effect '{}' has no matrix variable '{}'; render core {} stays detached.",
                    attached.effect.label(),
                    name,
                    self.id
                );
                Ok(false)
            }
        }
    }

    /// Writes `model_matrix * world` into the bound world-matrix variable.
    ///
    /// Applied to a column vector `p`, the written matrix yields
    /// `model_matrix * (world * p)`.
    ///
    /// Does nothing when no variable is bound.
    pub fn write_world_matrix(&self, world: &Mat4) -> Result<(), RenderError> {
        match &self.world_variable {
            Some(variable) => variable.set_matrix(&(self.model_matrix * *world)),
            None => Ok(()),
        }
    }

    /// Releases every owned resource and unbinds the world variable.
    ///
    /// ## Returns
    /// How many resources were released.
    pub fn release_resources(&mut self) -> usize {
        self.world_variable = None;
        self.resources.release_all()
    }

    /// Notifies the invalidation listeners that this core changed.
    ///
    /// ## Returns
    /// How many listeners received the event.
    pub fn invalidate_renderer(&mut self, requires_rerender: bool) -> usize {
        let event = Invalidation {
            source: self.id,
            requires_rerender,
        };
        self.invalidation.raise(event)
    }

    /// Subscribes a new listener and returns its receiving end.
    pub fn subscribe_invalidation(&mut self) -> flume::Receiver<Invalidation> {
        self.invalidation.subscribe()
    }

    /// Registers an existing channel as a listener.
    pub fn add_invalidation_listener(&mut self, sender: flume::Sender<Invalidation>) {
        self.invalidation.add_listener(sender);
    }

    /// Removes every invalidation listener.
    pub fn reset_invalidate_handler(&mut self) {
        self.invalidation.reset();
    }

    /// The number of registered invalidation listeners.
    pub fn invalidation_listener_count(&self) -> usize {
        self.invalidation.listener_count()
    }

    pub(crate) fn begin_attach(&mut self, attached: Option<AttachedTechnique>) {
        self.attached = attached;
        self.is_attached = false;
    }

    pub(crate) fn complete_attach(&mut self) {
        self.is_attached = true;
    }

    pub(crate) fn mark_detached(&mut self) {
        self.is_attached = false;
    }

    /// Drops everything recorded by attach. Returns how many resources were still owned.
    pub(crate) fn clear_attachment(&mut self) -> usize {
        let leftover = self.release_resources();
        self.attached = None;
        self.is_attached = false;
        leftover
    }
}

impl Default for RenderCoreBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RenderCoreBase {
    fn drop(&mut self) {
        if self.is_attached || !self.resources.is_empty() {
            log::warn!(
                "Render core {} dropped while attached; releasing {} resource(s).",
                self.id,
                self.resources.len()
            );
            self.clear_attachment();
        }
    }
}

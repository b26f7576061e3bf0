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

use super::HeadlessDevice;
use lucent_core::math::Mat4;
use lucent_core::renderer::api::{EffectTechnique, TechniqueId};
use lucent_core::renderer::{
    GpuResource, GraphicsDevice, MatrixVariable, RenderError, ResourceError, ScalarVariable,
    ShaderEffect,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A value written into a headless shader variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableValue {
    /// A `float4x4`.
    Matrix(Mat4),
    /// A `bool`.
    Bool(bool),
    /// A `float`.
    Float(f32),
}

/// One entry of an effect's write log.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableWrite {
    /// The variable that was written.
    pub name: String,
    /// The value written.
    pub value: VariableValue,
}

type WriteLog = Arc<Mutex<Vec<VariableWrite>>>;

/// A variable handle handed out by [`HeadlessEffect`].
///
/// Every write is appended to the owning effect's log. Writing after release fails
/// with [`ResourceError::Released`].
#[derive(Debug)]
pub struct HeadlessVariable {
    name: String,
    releases: AtomicUsize,
    log: WriteLog,
}

impl HeadlessVariable {
    /// How many times [`release`](GpuResource::release) was called on this handle.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn write(&self, value: VariableValue) -> Result<(), RenderError> {
        if self.is_released() {
            return Err(ResourceError::Released {
                name: self.name.clone(),
            }
            .into());
        }
        let mut log = self
            .log
            .lock()
            .map_err(|e| RenderError::Internal(format!("Mutex poisoned (variable log): {e}")))?;
        log.push(VariableWrite {
            name: self.name.clone(),
            value,
        });
        Ok(())
    }
}

impl GpuResource for HeadlessVariable {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&self) {
        let previous = self.releases.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            log::warn!("HeadlessEffect: variable '{}' released twice.", self.name);
        }
    }

    fn is_released(&self) -> bool {
        self.release_count() > 0
    }
}

impl MatrixVariable for HeadlessVariable {
    fn set_matrix(&self, value: &Mat4) -> Result<(), RenderError> {
        self.write(VariableValue::Matrix(*value))
    }
}

impl ScalarVariable for HeadlessVariable {
    fn set_bool(&self, value: bool) -> Result<(), RenderError> {
        self.write(VariableValue::Bool(value))
    }

    fn set_f32(&self, value: f32) -> Result<(), RenderError> {
        self.write(VariableValue::Float(value))
    }
}

#[derive(Debug, Clone)]
struct TechniqueEntry {
    name: String,
    pass_count: u32,
}

/// A [`ShaderEffect`] described in code instead of compiled from source.
///
/// Build one with the `with_*` methods, then share it behind an `Arc`.
#[derive(Debug)]
pub struct HeadlessEffect {
    label: String,
    techniques: Vec<TechniqueEntry>,
    matrix_names: Vec<String>,
    scalar_names: Vec<String>,
    device: Option<Arc<HeadlessDevice>>,
    handles: Mutex<Vec<Arc<HeadlessVariable>>>,
    log: WriteLog,
    lookups_fail: AtomicBool,
}

impl HeadlessEffect {
    /// Creates an effect with no techniques and no variables.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            techniques: Vec::new(),
            matrix_names: Vec::new(),
            scalar_names: Vec::new(),
            device: None,
            handles: Mutex::new(Vec::new()),
            log: Arc::new(Mutex::new(Vec::new())),
            lookups_fail: AtomicBool::new(false),
        }
    }

    /// Adds a technique with the given number of passes.
    pub fn with_technique(mut self, name: impl Into<String>, pass_count: u32) -> Self {
        self.techniques.push(TechniqueEntry {
            name: name.into(),
            pass_count,
        });
        self
    }

    /// Declares a `float4x4` variable.
    pub fn with_matrix_variable(mut self, name: impl Into<String>) -> Self {
        self.matrix_names.push(name.into());
        self
    }

    /// Declares a scalar variable.
    pub fn with_scalar_variable(mut self, name: impl Into<String>) -> Self {
        self.scalar_names.push(name.into());
        self
    }

    /// Binds the effect to a device.
    pub fn with_device(mut self, device: Arc<HeadlessDevice>) -> Self {
        self.device = Some(device);
        self
    }

    /// Makes every variable lookup fail with [`RenderError::DeviceLost`].
    pub fn fail_variable_lookups(&self, fail: bool) {
        self.lookups_fail.store(fail, Ordering::SeqCst);
    }

    /// How many variable handles were handed out in total.
    pub fn acquired_handle_count(&self) -> usize {
        self.handles.lock().map(|handles| handles.len()).unwrap_or(0)
    }

    /// How many handed-out variable handles are not yet released.
    pub fn live_handle_count(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|h| !h.is_released()).count())
            .unwrap_or(0)
    }

    /// How many handles were released more than once.
    pub fn double_release_count(&self) -> usize {
        self.handles
            .lock()
            .map(|handles| handles.iter().filter(|h| h.release_count() > 1).count())
            .unwrap_or(0)
    }

    /// Every write made through this effect's variables, oldest first.
    pub fn writes(&self) -> Vec<VariableWrite> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// The most recent value written to the variable called `name`.
    pub fn last_value(&self, name: &str) -> Option<VariableValue> {
        let log = self.log.lock().ok()?;
        log.iter()
            .rev()
            .find(|write| write.name == name)
            .map(|write| write.value)
    }

    /// Clears the write log.
    pub fn clear_writes(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.clear();
        }
    }

    fn acquire(
        &self,
        declared: &[String],
        name: &str,
    ) -> Result<Option<Arc<HeadlessVariable>>, RenderError> {
        if self.lookups_fail.load(Ordering::SeqCst) {
            return Err(RenderError::DeviceLost);
        }
        if !declared.iter().any(|candidate| candidate == name) {
            return Ok(None);
        }

        let handle = Arc::new(HeadlessVariable {
            name: name.to_owned(),
            releases: AtomicUsize::new(0),
            log: Arc::clone(&self.log),
        });
        self.handles
            .lock()
            .map_err(|e| RenderError::Internal(format!("Mutex poisoned (handles): {e}")))?
            .push(Arc::clone(&handle));
        log::trace!("HeadlessEffect '{}': acquired variable '{name}'.", self.label);
        Ok(Some(handle))
    }
}

impl ShaderEffect for HeadlessEffect {
    fn label(&self) -> &str {
        &self.label
    }

    fn technique_by_name(&self, name: &str) -> Option<EffectTechnique> {
        self.techniques
            .iter()
            .position(|technique| technique.name == name)
            .map(|index| EffectTechnique {
                id: TechniqueId(index),
                name: self.techniques[index].name.clone(),
                pass_count: self.techniques[index].pass_count,
            })
    }

    fn matrix_variable(&self, name: &str) -> Result<Option<Arc<dyn MatrixVariable>>, RenderError> {
        Ok(self
            .acquire(&self.matrix_names, name)?
            .map(|handle| handle as Arc<dyn MatrixVariable>))
    }

    fn scalar_variable(&self, name: &str) -> Result<Option<Arc<dyn ScalarVariable>>, RenderError> {
        Ok(self
            .acquire(&self.scalar_names, name)?
            .map(|handle| handle as Arc<dyn ScalarVariable>))
    }

    fn device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.device
            .as_ref()
            .map(|device| Arc::clone(device) as Arc<dyn GraphicsDevice>)
    }
}

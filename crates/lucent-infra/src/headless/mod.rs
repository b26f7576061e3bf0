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

//! A backend that keeps every resource in system memory and records commands.
//!
//! It has no GPU behind it. Render cores run against it unchanged, and its probes
//! (live buffers, live variable handles, recorded commands, variable writes) make
//! their behavior observable.

mod context;
mod device;
mod effect;
mod technique;

pub use self::context::{HeadlessFrame, RecordedCommand, RecordingDeviceContext};
pub use self::device::HeadlessDevice;
pub use self::effect::{HeadlessEffect, HeadlessVariable, VariableValue, VariableWrite};
pub use self::technique::HeadlessTechnique;

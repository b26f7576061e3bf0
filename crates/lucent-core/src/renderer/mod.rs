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

//! Provides the public, backend-agnostic rendering contracts for Lucent.
//!
//! This module defines the "common language" between render cores and graphics
//! backends: the abstract `traits` (like [`ShaderEffect`] and [`DeviceContext`]),
//! plain data structures (like [`RasterState`] and [`BufferDescriptor`]), and the
//! error types.
//!
//! This module defines the 'what' of rendering, while the 'how' is handled by a
//! concrete backend in the `lucent-infra` crate which implements these traits.
//! Concrete render cores in `lucent-lanes` use these traits without knowing the
//! specifics of the underlying graphics API.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::{RenderError, ResourceError};
pub use self::traits::*;

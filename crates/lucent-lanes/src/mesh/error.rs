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

use lucent_core::renderer::RenderError;
use thiserror::Error;

/// Errors raised while building or updating mesh data.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Geometry needs at least one vertex.
    #[error("Mesh geometry has no vertices")]
    EmptyGeometry,

    /// Instance data needs at least one instance.
    #[error("Instance data is empty")]
    EmptyInstances,

    /// An index refers past the end of the vertex list.
    #[error("Index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// The number of vertices.
        vertex_count: u32,
    },

    /// A count does not fit in 32 bits.
    #[error("Too many elements for a single draw: {0}")]
    TooManyElements(usize),

    /// The backend failed while uploading the new data.
    #[error(transparent)]
    Render(#[from] RenderError),
}

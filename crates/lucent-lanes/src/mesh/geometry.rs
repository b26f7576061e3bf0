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

//! CPU-side mesh data uploaded by [`MeshRenderCore`](super::MeshRenderCore).

use super::MeshError;
use lucent_core::renderer::api::PrimitiveTopology;
use std::mem::size_of;

/// A basic interleaved vertex: position, normal, texture coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl MeshVertex {
    /// Creates a vertex with an up-facing normal and zero texture coordinates.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 0.0],
        }
    }
}

fn count_u32(len: usize) -> Result<u32, MeshError> {
    u32::try_from(len).map_err(|_| MeshError::TooManyElements(len))
}

/// Interleaved vertices, optional 32-bit indices, and a topology.
///
/// Always holds at least one vertex, and every index refers to an existing vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGeometry {
    vertices: Vec<u8>,
    vertex_stride: u32,
    vertex_count: u32,
    indices: Option<Vec<u32>>,
    index_count: Option<u32>,
    topology: PrimitiveTopology,
}

impl MeshGeometry {
    /// Creates non-indexed geometry from any plain-old-data vertex type.
    ///
    /// ## Errors
    /// * `MeshError::EmptyGeometry` - If `vertices` is empty.
    pub fn from_vertices<V: bytemuck::Pod>(
        vertices: &[V],
        topology: PrimitiveTopology,
    ) -> Result<Self, MeshError> {
        if vertices.is_empty() || size_of::<V>() == 0 {
            return Err(MeshError::EmptyGeometry);
        }
        Ok(Self {
            vertices: bytemuck::cast_slice(vertices).to_vec(),
            vertex_stride: count_u32(size_of::<V>())?,
            vertex_count: count_u32(vertices.len())?,
            indices: None,
            index_count: None,
            topology,
        })
    }

    /// Adds an index list.
    ///
    /// ## Errors
    /// * `MeshError::IndexOutOfRange` - If an index does not refer to a vertex.
    pub fn with_indices(mut self, indices: Vec<u32>) -> Result<Self, MeshError> {
        let index_count = count_u32(indices.len())?;
        if let Some(&index) = indices.iter().find(|&&index| index >= self.vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: self.vertex_count,
            });
        }
        self.indices = Some(indices);
        self.index_count = Some(index_count);
        Ok(self)
    }

    /// The raw vertex bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertices
    }

    /// The size of one vertex in bytes.
    pub fn vertex_stride(&self) -> u32 {
        self.vertex_stride
    }

    /// The number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// The index list, if the geometry is indexed.
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// The number of indices, if the geometry is indexed.
    pub fn index_count(&self) -> Option<u32> {
        self.index_count
    }

    /// How vertices are assembled into primitives.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }
}

/// Per-instance data bound to vertex slot 1.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceData {
    bytes: Vec<u8>,
    stride: u32,
    count: u32,
}

impl InstanceData {
    /// Creates instance data from any plain-old-data type, e.g. a list of `Mat4`.
    ///
    /// ## Errors
    /// * `MeshError::EmptyInstances` - If `instances` is empty.
    pub fn from_slice<I: bytemuck::Pod>(instances: &[I]) -> Result<Self, MeshError> {
        if instances.is_empty() || size_of::<I>() == 0 {
            return Err(MeshError::EmptyInstances);
        }
        Ok(Self {
            bytes: bytemuck::cast_slice(instances).to_vec(),
            stride: count_u32(size_of::<I>())?,
            count: count_u32(instances.len())?,
        })
    }

    /// The raw instance bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The size of one instance in bytes.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// The number of instances.
    pub fn count(&self) -> u32 {
        self.count
    }
}

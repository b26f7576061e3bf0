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

//! State descriptors applied by render cores before drawing.

/// Defines how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Vertices are rendered as a list of isolated points.
    PointList,
    /// Every two vertices form an isolated line.
    LineList,
    /// Vertices are rendered as a connected line strip.
    LineStrip,
    /// Every three vertices form an isolated triangle.
    #[default]
    TriangleList,
    /// Vertices are rendered as a connected triangle strip.
    TriangleStrip,
}

/// Defines which face of a triangle to cull (not render).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling is performed.
    None,
    /// Cull front-facing triangles.
    Front,
    /// Cull back-facing triangles.
    #[default]
    Back,
}

/// Defines which vertex winding order considers a triangle to be "front-facing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding order is the front face.
    #[default]
    Ccw,
    /// Clockwise winding order is the front face.
    Cw,
}

/// Defines how polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Polygons are filled. This is the normal rendering mode.
    #[default]
    Fill,
    /// Polygons are rendered as outlines (wireframe).
    Line,
}

/// Describes depth biasing, used to prevent z-fighting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthBiasState {
    /// A constant value added to the depth of each fragment.
    pub constant: i32,
    /// A factor that scales with the fragment's depth slope.
    pub slope_scale: f32,
    /// The maximum bias that can be applied.
    pub clamp: f32,
}

/// The rasterizer state a render core applies in its raster-state step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    /// The face culling mode.
    pub cull_mode: CullMode,
    /// The vertex winding order that determines the "front" face of a triangle.
    pub front_face: FrontFace,
    /// The rasterization mode for polygons.
    pub polygon_mode: PolygonMode,
    /// Depth bias applied to every fragment.
    pub depth_bias: DepthBiasState,
    /// If `false`, fragments outside the depth range are not clipped.
    pub depth_clip: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Ccw,
            polygon_mode: PolygonMode::Fill,
            depth_bias: DepthBiasState::default(),
            depth_clip: true,
        }
    }
}

impl RasterState {
    /// A two-sided wireframe state, handy for debug overlays.
    pub fn wireframe() -> Self {
        Self {
            cull_mode: CullMode::None,
            polygon_mode: PolygonMode::Line,
            ..Self::default()
        }
    }
}

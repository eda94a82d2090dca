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

//! Pipeline state descriptions.

use super::format::Format;
use super::handle::PipelineLayoutHandle;
use std::borrow::Cow;

/// Comparison function used by depth/stencil tests and comparison samplers.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

/// Blend factor applied to source or destination colour.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SourceColor,
    OneMinusSourceColor,
    DestColor,
    OneMinusDestColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestAlpha,
    OneMinusDestAlpha,
    ConstantColor,
    OneMinusConstantColor,
    Source1Color,
    OneMinusSource1Color,
}

impl BlendFactor {
    /// `true` for factors that read the second blend source.
    pub const fn is_dual_source(self) -> bool {
        matches!(
            self,
            BlendFactor::Source1Color | BlendFactor::OneMinusSource1Color
        )
    }
}

/// Blend equation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOp {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Polygon fill mode.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FillMode {
    #[default]
    Solid,
    Wireframe,
    Point,
}

/// Face culling mode.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

/// Stencil buffer operation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOp {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementSaturate,
    DecrementSaturate,
    Invert,
    Increment,
    Decrement,
}

/// How vertices are assembled into primitives.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
    PatchList(u8),
}

/// Which kind of pipeline an object or binding point refers to.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineType {
    Graphics,
    Compute,
}

/// Dynamic render state set through `CommandList::bind_pipeline_states`.
///
/// Values are passed as raw 32-bit integers, matching how each native API
/// encodes the state (enums as their index, colours packed as RGBA8).
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    BlendConstant,
    SampleMask,
    PrimitiveTopology,
    StencilReferenceValue,
    StencilReadMask,
    StencilWriteMask,
    DepthEnable,
    DepthWriteMask,
    CullMode,
    FillMode,
    FrontCounterClockwise,
    ScissorEnable,
}

/// Compiled shader bytecode and its entry point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderDesc<'a> {
    /// Bytecode in the backend's native format.
    pub code: Cow<'a, [u8]>,
    /// Entry point name; `None` means the backend default.
    pub entry_point: Option<Cow<'a, str>>,
}

impl ShaderDesc<'_> {
    /// `true` when no bytecode is attached, i.e. the stage is disabled.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// One vertex attribute of the input layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElement<'a> {
    /// Shader location or semantic index.
    pub location: u32,
    /// Semantic name for APIs that bind by name.
    pub semantic: Cow<'a, str>,
    /// Attribute format.
    pub format: Format,
    /// Vertex buffer slot.
    pub buffer_binding: u32,
    /// Byte offset inside the vertex.
    pub offset: u32,
    /// Vertex stride of the slot.
    pub stride: u32,
    /// Instance step rate; zero means per-vertex data.
    pub instance_step_rate: u32,
}

/// Blend state for one render target.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderTargetBlend {
    pub enable: bool,
    pub source_color: BlendFactor,
    pub dest_color: BlendFactor,
    pub color_op: BlendOp,
    pub source_alpha: BlendFactor,
    pub dest_alpha: BlendFactor,
    pub alpha_op: BlendOp,
    /// Channel mask, bit 0 is red.
    pub write_mask: u8,
}

/// Output merger blend state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlendDesc {
    /// Alpha-to-coverage multisampling.
    pub alpha_to_coverage: bool,
    /// Per-target blend state; only the first is used without independent blending.
    pub render_targets: Vec<RenderTargetBlend>,
    /// Constant colour for `ConstantColor` factors.
    pub blend_constant: [f32; 4],
}

/// Rasterizer state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RasterizerDesc {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: f32,
    pub depth_bias_clamp: f32,
    pub slope_scaled_depth_bias: f32,
    pub depth_clip: bool,
    pub scissor_enable: bool,
    pub multisample: bool,
    pub antialiased_line: bool,
}

/// Stencil operations for one face.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilFaceDesc {
    pub fail_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub compare_op: CompareOp,
}

/// Depth and stencil test state.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DepthStencilDesc {
    pub depth_enable: bool,
    pub depth_write: bool,
    pub depth_compare: CompareOp,
    pub stencil_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front: StencilFaceDesc,
    pub back: StencilFaceDesc,
}

/// Everything needed to build a graphics pipeline.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphicsPipelineDesc<'a> {
    pub layout: PipelineLayoutHandle,
    pub vertex_shader: ShaderDesc<'a>,
    pub hull_shader: ShaderDesc<'a>,
    pub domain_shader: ShaderDesc<'a>,
    pub geometry_shader: ShaderDesc<'a>,
    pub pixel_shader: ShaderDesc<'a>,
    pub input_layout: Vec<InputElement<'a>>,
    pub blend_state: BlendDesc,
    pub rasterizer_state: RasterizerDesc,
    pub depth_stencil_state: DepthStencilDesc,
    pub topology: PrimitiveTopology,
    pub sample_mask: u32,
    pub sample_count: u32,
    pub render_target_formats: Vec<Format>,
    pub depth_stencil_format: Format,
    /// States left dynamic, set later through `bind_pipeline_states`.
    pub dynamic_states: Vec<PipelineState>,
}

/// Everything needed to build a compute pipeline.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComputePipelineDesc<'a> {
    pub layout: PipelineLayoutHandle,
    pub shader: ShaderDesc<'a>,
}

/// Description of a pipeline of either type.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineDesc<'a> {
    Graphics(GraphicsPipelineDesc<'a>),
    Compute(ComputePipelineDesc<'a>),
}

impl PipelineDesc<'_> {
    /// The pipeline type this description builds.
    pub fn pipeline_type(&self) -> PipelineType {
        match self {
            PipelineDesc::Graphics(_) => PipelineType::Graphics,
            PipelineDesc::Compute(_) => PipelineType::Compute,
        }
    }

    /// The layout the pipeline is built against.
    pub fn layout(&self) -> PipelineLayoutHandle {
        match self {
            PipelineDesc::Graphics(desc) => desc.layout,
            PipelineDesc::Compute(desc) => desc.layout,
        }
    }
}

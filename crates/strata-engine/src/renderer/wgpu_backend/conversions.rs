//! Engine enums to wgpu descriptors.

use crate::renderer::api::PrimitiveTopology;
use crate::renderer::buffer::{BufferLayout, ShaderDataType};

/// Source-alpha blending for color, `One` / `OneMinusSrcAlpha` for alpha.
pub(super) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// `None` when the topology cannot be drawn.
pub(super) fn primitive_state(topology: PrimitiveTopology) -> Option<wgpu::PrimitiveState> {
    let (topology, strip_index_format) = match topology {
        PrimitiveTopology::None => return None,
        PrimitiveTopology::PointList => (wgpu::PrimitiveTopology::PointList, None),
        PrimitiveTopology::LineList => (wgpu::PrimitiveTopology::LineList, None),
        PrimitiveTopology::LineStrip => {
            (wgpu::PrimitiveTopology::LineStrip, Some(wgpu::IndexFormat::Uint32))
        }
        PrimitiveTopology::TriangleList => (wgpu::PrimitiveTopology::TriangleList, None),
        PrimitiveTopology::TriangleStrip => {
            (wgpu::PrimitiveTopology::TriangleStrip, Some(wgpu::IndexFormat::Uint32))
        }
    };

    Some(wgpu::PrimitiveState {
        topology,
        strip_index_format,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    })
}

/// Expands a layout into vertex attributes, one shader location per column.
///
/// Matrices take one location per column. `Bool` has no vertex format and is
/// skipped with a warning; its bytes still count towards the stride.
pub(super) fn vertex_attributes(layout: &BufferLayout) -> Vec<wgpu::VertexAttribute> {
    let mut attributes = Vec::with_capacity(layout.elements().len());
    let mut location = 0;

    for element in layout {
        let (format, columns) = match element.ty {
            ShaderDataType::Float => (wgpu::VertexFormat::Float32, 1),
            ShaderDataType::Float2 => (wgpu::VertexFormat::Float32x2, 1),
            ShaderDataType::Float3 => (wgpu::VertexFormat::Float32x3, 1),
            ShaderDataType::Float4 => (wgpu::VertexFormat::Float32x4, 1),
            ShaderDataType::Mat3 => (wgpu::VertexFormat::Float32x3, 3),
            ShaderDataType::Mat4 => (wgpu::VertexFormat::Float32x4, 4),
            ShaderDataType::Int => (wgpu::VertexFormat::Sint32, 1),
            ShaderDataType::Int2 => (wgpu::VertexFormat::Sint32x2, 1),
            ShaderDataType::Int3 => (wgpu::VertexFormat::Sint32x3, 1),
            ShaderDataType::Int4 => (wgpu::VertexFormat::Sint32x4, 1),
            ShaderDataType::Bool | ShaderDataType::None => {
                log::warn!("vertex attribute '{}' has no wgpu format; skipped", element.name);
                continue;
            }
        };

        let column_size = format.size();
        for column in 0..columns {
            attributes.push(wgpu::VertexAttribute {
                format,
                offset: element.offset as u64 + column as u64 * column_size,
                shader_location: location,
            });
            location += 1;
        }
    }

    attributes
}

//! The shared sprite pipeline.
//!
//! Every sprite draws as the same unit quad through one pipeline and one
//! shader; per-frame and per-draw state travels in uniform buffers. The
//! per-draw uniforms live in a single buffer bound with a dynamic offset so
//! the whole frame needs one buffer write however many sprites it draws.

use std::mem;

/// One vertex of the sprite quad: 2D position and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// The unit quad spanning [0,1]x[0,1] as two triangles.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [0.0, 1.0], tex_coords: [0.0, 1.0] },
    QuadVertex { position: [1.0, 0.0], tex_coords: [1.0, 0.0] },
    QuadVertex { position: [0.0, 0.0], tex_coords: [0.0, 0.0] },
    QuadVertex { position: [0.0, 1.0], tex_coords: [0.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], tex_coords: [1.0, 1.0] },
    QuadVertex { position: [1.0, 0.0], tex_coords: [1.0, 0.0] },
];

/// Per-frame uniforms: the pixel-space orthographic projection.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub projection: [[f32; 4]; 4],
}

/// Per-draw uniforms: the sprite's model matrix and opacity.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub model: [[f32; 4]; 4],
    pub opacity: f32,
    pub _padding: [f32; 3],
}

/// Stride between per-draw uniform slots; the minimum dynamic-offset
/// alignment wgpu guarantees on default limits.
pub const DRAW_UNIFORM_STRIDE: wgpu::BufferAddress = 256;

pub fn sprite_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("sprite_texture_bind_group_layout"),
    })
}

pub fn frame_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("sprite_frame_bind_group_layout"),
    })
}

pub fn draw_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(mem::size_of::<DrawUniform>() as u64),
            },
            count: None,
        }],
        label: Some("sprite_draw_bind_group_layout"),
    })
}

pub fn mk_sprite_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    texture_layout: &wgpu::BindGroupLayout,
    frame_layout: &wgpu::BindGroupLayout,
    draw_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sprite Render Pipeline Layout"),
        bind_group_layouts: &[Some(texture_layout), Some(frame_layout), Some(draw_layout)],
        immediate_size: 0,
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Sprite Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("sprite.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Sprite Render Pipeline"),
        layout: Some(&render_pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[QuadVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: config.format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Quads flip winding under the y-down projection, so nothing is culled.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Draw order is insertion order; no depth buffer.
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_uniform_fits_its_dynamic_slot() {
        assert_eq!(mem::size_of::<DrawUniform>(), 80);
        assert!((mem::size_of::<DrawUniform>() as wgpu::BufferAddress) <= DRAW_UNIFORM_STRIDE);
    }

    #[test]
    fn quad_spans_the_unit_square() {
        for vertex in QUAD_VERTICES {
            assert_eq!(vertex.position, vertex.tex_coords);
            assert!(vertex.position.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }
}

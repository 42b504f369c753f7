//! The renderer subsystem.
//!
//! Each frame the renderer recomputes an orthographic projection from the
//! current drawable size, walks the sprite collection in insertion order
//! and issues one draw of the shared unit quad per visible sprite, with the
//! sprite's texture bound and its model matrix and opacity in a
//! dynamically-offset uniform slot.
//!
//! A sprite's logical `(x, y)` is an offset from the window centre. The
//! model transform composes translate → rotate → scale over the unit quad,
//! so rotation pivots the quad's own top-left-anchored unit frame rather
//! than its visual centre.

use std::cell::RefCell;
use std::collections::HashSet;
use std::iter;
use std::mem;
use std::rc::Rc;

use anyhow::{Context, Result};
use cgmath::{Deg, Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::context::GpuContext;
use crate::engine::{Flow, Subsystem};
use crate::graphics::pipeline::{
    self, DRAW_UNIFORM_STRIDE, DrawUniform, FrameUniform, QUAD_VERTICES,
};
use crate::graphics::registry::TextureRegistry;
use crate::sprite::set::SpriteSet;
use crate::sprite::sprite::Sprite;
use crate::window::WindowState;

/// wgpu clip space spans z in [0, 1] where the orthographic matrix assumes
/// the OpenGL [-1, 1] convention.
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Projection from window pixel space (origin top-left, y down) to clip
/// space. Recomputed every frame from the current drawable size.
fn pixel_projection(width: f32, height: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * cgmath::ortho(0.0, width, height, 0.0, -1.0, 1.0)
}

/// The per-sprite model transform.
///
/// The screen-space position places the scaled texture so that the sprite's
/// `(x, y)` offsets its centre from the window centre. Rotation applies
/// before scale in the composed matrix.
fn sprite_model(sprite: &Sprite, texture_size: (u32, u32), window: (f32, f32)) -> Matrix4<f32> {
    let scale = sprite.scale();
    let tex_width = texture_size.0 as f32;
    let tex_height = texture_size.1 as f32;
    let position = Vector3::new(
        window.0 / 2.0 + sprite.x() - tex_width * scale / 2.0,
        window.1 / 2.0 - sprite.y() - tex_height * scale / 2.0,
        0.0,
    );

    Matrix4::from_translation(position)
        * Matrix4::from_angle_z(Deg(sprite.rotation()))
        * Matrix4::from_nonuniform_scale(scale * tex_width, scale * tex_height, 1.0)
}

/// GPU resources created once in `init`.
struct RenderResources {
    ctx: GpuContext,
    pipeline: wgpu::RenderPipeline,
    quad_buffer: wgpu::Buffer,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    /// Sprite slots the draw buffer currently holds.
    draw_capacity: u32,
}

fn mk_draw_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Sprite Draw Uniforms"),
        size: capacity as wgpu::BufferAddress * DRAW_UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(mem::size_of::<DrawUniform>() as u64),
            }),
        }],
        label: Some("sprite_draw_bind_group"),
    });
    (buffer, bind_group)
}

/// The renderer subsystem. Reads the sprite collection and texture registry
/// each frame; must come after the window subsystem in the engine order.
pub struct Renderer {
    window_state: Rc<RefCell<WindowState>>,
    sprites: Rc<RefCell<SpriteSet>>,
    textures: Rc<RefCell<TextureRegistry>>,
    resources: Option<RenderResources>,
    /// Texture names already reported missing, so the warning fires once.
    missing_textures: HashSet<String>,
}

impl Renderer {
    pub fn new(
        window_state: Rc<RefCell<WindowState>>,
        sprites: Rc<RefCell<SpriteSet>>,
        textures: Rc<RefCell<TextureRegistry>>,
    ) -> Self {
        Self {
            window_state,
            sprites,
            textures,
            resources: None,
            missing_textures: HashSet::new(),
        }
    }
}

impl Subsystem for Renderer {
    fn name(&self) -> &'static str {
        "Renderer"
    }

    /// Create the GPU context, compile the sprite pipeline and load every
    /// registered texture. Runs after the window subsystem's `init`.
    fn init(&mut self) -> Result<()> {
        let window = self
            .window_state
            .borrow()
            .window()
            .cloned()
            .context("the window subsystem must be initialised before the renderer")?;
        let ctx = GpuContext::new(window)?;

        log::info!("Compiling shader...");
        let texture_layout = pipeline::sprite_texture_layout(&ctx.device);
        let frame_layout = pipeline::frame_uniform_layout(&ctx.device);
        let draw_layout = pipeline::draw_uniform_layout(&ctx.device);
        let render_pipeline = pipeline::mk_sprite_pipeline(
            &ctx.device,
            &ctx.config,
            &texture_layout,
            &frame_layout,
            &draw_layout,
        );

        let quad_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Quad Buffer"),
                contents: bytemuck::cast_slice(&QUAD_VERTICES),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let frame_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Sprite Frame Uniforms"),
                contents: bytemuck::bytes_of(&FrameUniform {
                    projection: Matrix4::from_scale(1.0f32).into(),
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let frame_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
            label: Some("sprite_frame_bind_group"),
        });

        let draw_capacity = 64;
        let (draw_buffer, draw_bind_group) =
            mk_draw_buffer(&ctx.device, &draw_layout, draw_capacity);

        log::info!("Creating textures...");
        self.textures
            .borrow_mut()
            .load_all(&ctx.device, &ctx.queue, &texture_layout)?;

        self.resources = Some(RenderResources {
            ctx,
            pipeline: render_pipeline,
            quad_buffer,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_capacity,
        });
        Ok(())
    }

    fn update(&mut self) -> Result<Flow> {
        let resources = self
            .resources
            .as_mut()
            .context("the renderer was updated before it was initialised")?;

        let (width, height) = self.window_state.borrow().size();
        if width == 0 || height == 0 {
            // Minimised; nothing to draw.
            return Ok(Flow::Continue);
        }
        if width != resources.ctx.config.width || height != resources.ctx.config.height {
            resources.ctx.resize(width, height);
        }
        let clear_color = self.window_state.borrow().clear_color();

        // Set once per frame, not per sprite.
        let projection = pixel_projection(width as f32, height as f32);
        resources.ctx.queue.write_buffer(
            &resources.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniform {
                projection: projection.into(),
            }),
        );

        // Gather per-draw uniforms and texture bindings in collection order.
        let registry = self.textures.borrow();
        let mut sprites = self.sprites.borrow_mut();
        let mut uniform_bytes: Vec<u8> = Vec::new();
        let mut batch: Vec<&wgpu::BindGroup> = Vec::new();
        for sprite in sprites.iter_mut() {
            if !sprite.is_visible() {
                continue;
            }
            let Some(entry) = registry.get(sprite.texture_name()) else {
                if self.missing_textures.insert(sprite.texture_name().to_owned()) {
                    log::warn!(
                        "Sprite '{}' references texture '{}' which is not loaded; skipping",
                        sprite.name(),
                        sprite.texture_name()
                    );
                }
                continue;
            };
            sprite.bind_texture(entry.width(), entry.height());

            let uniform = DrawUniform {
                model: sprite_model(
                    sprite,
                    (entry.width(), entry.height()),
                    (width as f32, height as f32),
                )
                .into(),
                opacity: sprite.opacity(),
                _padding: [0.0; 3],
            };
            let offset = uniform_bytes.len();
            uniform_bytes.resize(offset + DRAW_UNIFORM_STRIDE as usize, 0);
            uniform_bytes[offset..offset + mem::size_of::<DrawUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
            batch.push(&entry.bind_group);
        }

        let draw_count = batch.len() as u32;
        if draw_count > resources.draw_capacity {
            let capacity = draw_count.next_power_of_two();
            let (buffer, bind_group) =
                mk_draw_buffer(&resources.ctx.device, &resources.draw_layout, capacity);
            resources.draw_buffer = buffer;
            resources.draw_bind_group = bind_group;
            resources.draw_capacity = capacity;
        }
        if !uniform_bytes.is_empty() {
            resources
                .ctx
                .queue
                .write_buffer(&resources.draw_buffer, 0, &uniform_bytes);
        }

        let frame = match resources.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame)
            | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => frame,
            // Reconfigure the surface if it's lost or outdated.
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                resources.ctx.resize(width, height);
                return Ok(Flow::Continue);
            }
            other => {
                log::error!("Unable to render {:?}", other);
                return Ok(Flow::Continue);
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            resources
                .ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Sprite Render Encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sprite Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&resources.pipeline);
            render_pass.set_vertex_buffer(0, resources.quad_buffer.slice(..));
            render_pass.set_bind_group(1, &resources.frame_bind_group, &[]);
            for (index, texture_bind_group) in batch.iter().enumerate() {
                let offset = index as u32 * DRAW_UNIFORM_STRIDE as u32;
                render_pass.set_bind_group(0, *texture_bind_group, &[]);
                render_pass.set_bind_group(2, &resources.draw_bind_group, &[offset]);
                render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
            }
        }

        resources.ctx.queue.submit(iter::once(encoder.finish()));
        frame.present();

        Ok(Flow::Continue)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.resources = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn transform(matrix: Matrix4<f32>, x: f32, y: f32) -> (f32, f32) {
        let out = matrix * Vector4::new(x, y, 0.0, 1.0);
        (out.x, out.y)
    }

    #[test]
    fn projection_maps_pixel_corners_to_clip_corners() {
        let projection = pixel_projection(800.0, 600.0);
        let (x, y) = transform(projection, 0.0, 0.0);
        assert!((x + 1.0).abs() < 1e-5 && (y - 1.0).abs() < 1e-5);
        let (x, y) = transform(projection, 800.0, 600.0);
        assert!((x - 1.0).abs() < 1e-5 && (y + 1.0).abs() < 1e-5);
        let (x, y) = transform(projection, 400.0, 300.0);
        assert!(x.abs() < 1e-5 && y.abs() < 1e-5);
    }

    #[test]
    fn centred_sprite_quad_surrounds_the_window_centre() {
        // A 64x32 texture at (0, 0) with scale 1 in an 800x600 window.
        let sprite = Sprite::new("tex");
        let model = sprite_model(&sprite, (64, 32), (800.0, 600.0));

        let (left, top) = transform(model, 0.0, 0.0);
        assert!((left - (400.0 - 32.0)).abs() < 1e-4);
        assert!((top - (300.0 - 16.0)).abs() < 1e-4);

        let (right, bottom) = transform(model, 1.0, 1.0);
        assert!((right - (400.0 + 32.0)).abs() < 1e-4);
        assert!((bottom - (300.0 + 16.0)).abs() < 1e-4);
    }

    #[test]
    fn sprite_y_offset_moves_up_the_screen() {
        let mut sprite = Sprite::new("tex");
        sprite.set_y(100.0);
        let model = sprite_model(&sprite, (10, 10), (800.0, 600.0));
        let (_, top) = transform(model, 0.0, 0.0);
        // y is measured upwards from the window centre, screen y downwards.
        assert!((top - (300.0 - 100.0 - 5.0)).abs() < 1e-4);
    }

    #[test]
    fn scale_grows_the_quad_around_its_centre() {
        let mut sprite = Sprite::new("tex");
        sprite.set_scale(2.0);
        let model = sprite_model(&sprite, (10, 10), (200.0, 200.0));
        let (left, top) = transform(model, 0.0, 0.0);
        let (right, bottom) = transform(model, 1.0, 1.0);
        assert!((right - left - 20.0).abs() < 1e-4);
        assert!((bottom - top - 20.0).abs() < 1e-4);
        assert!((left - (100.0 - 10.0)).abs() < 1e-4);
    }

    #[test]
    fn rotation_pivots_the_translated_origin() {
        // Rotation composes before scale, so the quad origin stays fixed
        // while the opposite corner swings around it.
        let mut sprite = Sprite::new("tex");
        sprite.set_rotation(90.0);
        let model = sprite_model(&sprite, (10, 10), (200.0, 200.0));

        let (ox, oy) = transform(model, 0.0, 0.0);
        assert!((ox - 95.0).abs() < 1e-4 && (oy - 95.0).abs() < 1e-4);

        // (1, 0) rotates onto the +y axis of the quad frame.
        let (px, py) = transform(model, 1.0, 0.0);
        assert!((px - 95.0).abs() < 1e-3);
        assert!((py - 105.0).abs() < 1e-3);
    }
}

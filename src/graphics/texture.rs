//! GPU textures for sprites.

use image::imageops::{self, FilterType};

use crate::graphics::registry::DecodedImage;

/// A GPU sprite texture with its view and sampler.
#[derive(Debug)]
pub struct SpriteTexture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

/// Number of mip levels for a full chain down to 1x1.
fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl SpriteTexture {
    /// Upload a decoded image as a sprite texture.
    ///
    /// Sprites sample with nearest-neighbour filtering and clamp-to-edge
    /// wrapping. The full mip chain is computed on the CPU and uploaded
    /// level by level; this happens once per texture, during initialisation.
    pub(crate) fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &DecodedImage,
        label: &str,
    ) -> Self {
        let (width, height) = image.dimensions();
        let mip_level_count = mip_level_count(width, height);

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for level in 0..mip_level_count {
            let level_width = (width >> level).max(1);
            let level_height = (height >> level).max(1);
            let level_pixels;
            let data: &[u8] = if level == 0 {
                image.rgba().as_raw()
            } else {
                level_pixels =
                    imageops::resize(image.rgba(), level_width, level_height, FilterType::Triangle);
                level_pixels.as_raw()
            };

            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_reaches_one_by_one() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(640, 480), 10);
        assert_eq!(mip_level_count(1, 7), 3);
    }
}

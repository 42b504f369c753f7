//! Two-phase texture registry.
//!
//! Textures are registered by name and path at any time before the engine
//! runs; registering only enqueues the pair and touches neither disk nor
//! GPU. The pending queue is drained exactly once, during renderer
//! initialisation, when every entry is decoded, uploaded and stored under
//! its name together with a per-pixel transparency mask.
//!
//! A texture name is a unique key: the same name may be registered several
//! times only while every registration resolves to the same absolute source
//! path. A name collision with a different path is a fatal configuration
//! error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::graphics::texture::SpriteTexture;

/// Per-pixel boolean transparency map.
///
/// `is_transparent(x, y)` is `true` exactly when the source pixel's alpha is
/// zero. Partially transparent pixels are not marked. Images without an
/// alpha channel get an all-`false` mask without scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransparencyMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl TransparencyMask {
    /// An all-opaque mask, used for images without an alpha channel.
    fn opaque(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; (width as usize) * (height as usize)],
        }
    }

    fn from_rgba(rgba: &RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        let mut mask = Self::opaque(width, height);
        for (x, y, pixel) in rgba.enumerate_pixels() {
            if pixel[3] == 0 {
                mask.bits[(y * width + x) as usize] = true;
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` is fully transparent. Panics when the
    /// coordinates lie outside the image.
    pub fn is_transparent(&self, x: u32, y: u32) -> bool {
        assert!(x < self.width && y < self.height, "pixel outside the mask");
        self.bits[(y * self.width + x) as usize]
    }
}

/// A decoded image ready for upload: RGBA pixels plus the transparency mask
/// derived from the source channel count.
pub(crate) struct DecodedImage {
    rgba: RgbaImage,
    width: u32,
    height: u32,
    mask: TransparencyMask,
}

impl DecodedImage {
    fn open(path: &Path) -> Result<Self> {
        log::info!("Loading image resource '{}'", path.display());
        let image = image::open(path)
            .with_context(|| format!("failed to load/decode image at '{}'", path.display()))?;
        Self::from_dynamic(image)
    }

    fn from_dynamic(image: DynamicImage) -> Result<Self> {
        let channels = image.color().channel_count();
        let (width, height) = image.dimensions();
        let rgba = image.to_rgba8();
        // Only the alpha-capable 4-channel format gets a mask scan; plain
        // RGB is opaque by definition.
        let mask = match channels {
            3 => TransparencyMask::opaque(width, height),
            4 => TransparencyMask::from_rgba(&rgba),
            n => bail!("image has an unsupported number of colour channels: {n}"),
        };
        log::info!(
            "Texture decoded: x={}, y={}, format={}",
            width,
            height,
            if channels == 4 { "RGBA" } else { "RGB" }
        );
        Ok(Self {
            rgba,
            width,
            height,
            mask,
        })
    }

    pub(crate) fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A loaded texture: GPU resources plus the metadata sprites draw with.
pub struct TextureEntry {
    name: String,
    /// Resolved absolute source path, used to arbitrate name collisions.
    path: PathBuf,
    width: u32,
    height: u32,
    mask: TransparencyMask,
    pub(crate) texture: SpriteTexture,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl TextureEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mask(&self) -> &TransparencyMask {
        &self.mask
    }

    /// The underlying GPU texture.
    pub fn texture(&self) -> &SpriteTexture {
        &self.texture
    }
}

/// The texture registry: a pending queue of registrations and a map of
/// loaded entries, with a one-way pending → loaded transition.
#[derive(Default)]
pub struct TextureRegistry {
    pending: Vec<(String, PathBuf)>,
    entries: HashMap<String, TextureEntry>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a texture named after its file's base name. Returns the
    /// derived name. Nothing is loaded until the renderer initialises.
    pub fn register(&mut self, path: impl Into<PathBuf>) -> Result<String> {
        let path = path.into();
        let name = default_name(&path)?;
        self.register_as(name.clone(), path);
        Ok(name)
    }

    /// Register a texture under an explicit name. Nothing is loaded until
    /// the renderer initialises.
    pub fn register_as(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.pending.push((name.into(), path.into()));
    }

    /// Retrieve a loaded texture. Returns `None` for unknown names and for
    /// textures still sitting in the pending queue.
    pub fn get(&self, name: &str) -> Option<&TextureEntry> {
        self.entries.get(name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Drain the pending queue into a deduplicated load plan of
    /// `(name, absolute path)` pairs.
    ///
    /// Re-registrations of an already-loaded or already-planned name are
    /// dropped silently when they resolve to the same absolute path, and
    /// fatal when they do not. Paths are made absolute without touching the
    /// filesystem, so the plan is pure.
    fn plan_loads(&mut self) -> Result<Vec<(String, PathBuf)>> {
        let mut plan: Vec<(String, PathBuf)> = Vec::new();
        while let Some((name, path)) = self.pending.pop() {
            let absolute = std::path::absolute(&path)
                .with_context(|| format!("cannot resolve texture path '{}'", path.display()))?;
            let existing = self
                .entries
                .get(&name)
                .map(|entry| entry.path.clone())
                .or_else(|| {
                    plan.iter()
                        .find(|(planned, _)| *planned == name)
                        .map(|(_, p)| p.clone())
                });
            match existing {
                Some(p) if p == absolute => {
                    log::info!("Texture already loaded at '{}'", path.display());
                }
                Some(p) => bail!(
                    "texture name '{}' already exists for '{}', but '{}' is a different source",
                    name,
                    p.display(),
                    path.display()
                ),
                None => plan.push((name, absolute)),
            }
        }
        Ok(plan)
    }

    /// Drain the pending queue, decoding and uploading every planned
    /// texture. Performed once, during renderer initialisation; any decode
    /// failure or name collision aborts the whole load.
    pub(crate) fn load_all(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Result<()> {
        for (name, path) in self.plan_loads()? {
            let decoded = DecodedImage::open(&path)?;
            let texture = SpriteTexture::from_decoded(device, queue, &decoded, &name);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
                label: Some(&name),
            });
            log::info!("New texture registered as '{}'", name);
            let (width, height) = decoded.dimensions();
            self.entries.insert(
                name.clone(),
                TextureEntry {
                    name,
                    path,
                    width,
                    height,
                    mask: decoded.mask,
                    texture,
                    bind_group,
                },
            );
        }
        Ok(())
    }
}

/// Texture names default to the file's base name without its extension.
fn default_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow!("cannot derive a texture name from '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn names_default_to_the_file_stem() {
        let mut registry = TextureRegistry::new();
        let name = registry.register("assets/smile.png").unwrap();
        assert_eq!(name, "smile");
        assert!(registry.register("").is_err());
    }

    #[test]
    fn same_name_same_path_collapses_to_one_load() {
        let mut registry = TextureRegistry::new();
        registry.register("assets/smile.png").unwrap();
        registry.register("assets/smile.png").unwrap();
        let plan = registry.plan_loads().unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0, "smile");
        assert!(plan[0].1.is_absolute());
    }

    #[test]
    fn same_name_different_path_is_fatal() {
        let mut registry = TextureRegistry::new();
        registry.register_as("smile", "assets/smile.png");
        registry.register_as("smile", "other/smile.png");
        let err = registry.plan_loads().unwrap_err();
        assert!(err.to_string().contains("different source"));
    }

    #[test]
    fn plan_drains_the_pending_queue() {
        let mut registry = TextureRegistry::new();
        registry.register_as("a", "a.png");
        registry.register_as("b", "b.png");
        assert_eq!(registry.plan_loads().unwrap().len(), 2);
        assert!(registry.plan_loads().unwrap().is_empty());
    }

    #[test]
    fn alpha_zero_pixels_are_masked() {
        let mut rgba = RgbaImage::from_pixel(4, 3, Rgba([255, 255, 255, 255]));
        rgba.put_pixel(2, 1, Rgba([10, 20, 30, 0]));
        rgba.put_pixel(0, 2, Rgba([10, 20, 30, 128]));
        let decoded = DecodedImage::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();

        assert!(decoded.mask.is_transparent(2, 1));
        // Partially transparent pixels stay unmasked.
        assert!(!decoded.mask.is_transparent(0, 2));
        assert!(!decoded.mask.is_transparent(0, 0));
    }

    #[test]
    fn rgb_images_get_an_opaque_mask() {
        let rgb = image::RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let decoded = DecodedImage::from_dynamic(DynamicImage::ImageRgb8(rgb)).unwrap();
        for x in 0..2 {
            for y in 0..2 {
                assert!(!decoded.mask.is_transparent(x, y));
            }
        }
    }

    #[test]
    fn unsupported_channel_counts_are_fatal() {
        let grey = image::GrayImage::from_pixel(2, 2, image::Luma([7]));
        assert!(DecodedImage::from_dynamic(DynamicImage::ImageLuma8(grey)).is_err());
    }

    #[test]
    fn decode_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.png");
        let mut rgba = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        rgba.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        rgba.save(&path).unwrap();

        let decoded = DecodedImage::open(&path).unwrap();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert!(decoded.mask.is_transparent(1, 1));
        assert!(!decoded.mask.is_transparent(0, 0));
    }

    #[test]
    fn decode_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-an-image.png");
        std::fs::write(&path, b"junk").unwrap();
        assert!(DecodedImage::open(&path).is_err());
    }
}

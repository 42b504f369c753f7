//! The sprite entity mutated by game logic each tick.

use crate::sprite::aabb::Aabb;

/// Whether a sprite has resolved its texture yet.
///
/// Sprites are created before textures are loaded, so the texture's pixel
/// size is bound lazily, the first time the renderer draws the sprite. A
/// sprite whose texture never loads stays `Unresolved`, which the renderer
/// reports instead of drawing a degenerate quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBinding {
    Unresolved,
    Resolved { width: u32, height: u32 },
}

/// A named, textured 2D entity.
///
/// The sprite's `(x, y)` position is an offset from the window centre, not
/// an absolute pixel coordinate. Rotation is in degrees and wraps to 0 only
/// when an accumulation exceeds 360; it is never normalised on construction
/// and never wraps on negative values. Opacity is clamped into `[0, 1]` by
/// every setter.
pub struct Sprite {
    /// Name that represents this sprite in diagnostics.
    name: String,
    /// The texture name registered in the texture registry.
    texture: String,
    bounds: Aabb,
    rotation: f32,
    visible: bool,
    opacity: f32,
    binding: TextureBinding,
}

impl Sprite {
    /// Create a sprite over a registered texture name. The sprite is named
    /// after its texture.
    pub fn new(texture: impl Into<String>) -> Self {
        let texture = texture.into();
        Self::with_name(texture.clone(), texture)
    }

    /// Create a sprite with an explicit diagnostic name.
    pub fn with_name(name: impl Into<String>, texture: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture: texture.into(),
            bounds: Aabb::new(),
            rotation: 0.0,
            visible: true,
            opacity: 1.0,
            binding: TextureBinding::Unresolved,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture_name(&self) -> &str {
        &self.texture
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// A sprite is drawn only while visible and not fully transparent.
    pub fn is_visible(&self) -> bool {
        self.visible && self.opacity != 0.0
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn x(&self) -> f32 {
        self.bounds.centre_x()
    }

    pub fn set_x(&mut self, x: f32) {
        self.bounds.set_centre_x(x);
    }

    pub fn y(&self) -> f32 {
        self.bounds.centre_y()
    }

    pub fn set_y(&mut self, y: f32) {
        self.bounds.set_centre_y(y);
    }

    pub fn move_x(&mut self, value: f32) {
        self.bounds.move_x(value);
    }

    pub fn move_y(&mut self, value: f32) {
        self.bounds.move_y(value);
    }

    pub fn scale(&self) -> f32 {
        self.bounds.scale()
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.bounds.set_scale(scale);
    }

    pub fn scale_by(&mut self, delta: f32) {
        self.bounds.scale_by(delta);
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Accumulate rotation in degrees. Wraps to 0 once the accumulated value
    /// exceeds 360; negative accumulation is left as-is.
    pub fn rotate_by(&mut self, degrees: f32) {
        self.rotation += degrees;
        if self.rotation > 360.0 {
            self.rotation = 0.0;
        }
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Add a delta to the opacity, clamped into `[0, 1]`.
    pub fn change_opacity(&mut self, delta: f32) {
        self.opacity = (self.opacity + delta).clamp(0.0, 1.0);
    }

    /// The pixel size of the resolved texture, if bound already.
    pub fn texture_size(&self) -> Option<(u32, u32)> {
        match self.binding {
            TextureBinding::Unresolved => None,
            TextureBinding::Resolved { width, height } => Some((width, height)),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.binding != TextureBinding::Unresolved
    }

    /// Bind the texture's pixel dimensions into the bounding box. Performed
    /// by the renderer on first draw; later calls are no-ops so the size is
    /// written exactly once.
    pub(crate) fn bind_texture(&mut self, width: u32, height: u32) {
        if self.binding == TextureBinding::Unresolved {
            self.bounds.set_size(width as f32, height as f32);
            self.binding = TextureBinding::Resolved { width, height };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_setters_clamp_into_unit_range() {
        let mut sprite = Sprite::new("smile");
        sprite.set_opacity(4.0);
        assert_eq!(sprite.opacity(), 1.0);
        sprite.set_opacity(-0.5);
        assert_eq!(sprite.opacity(), 0.0);

        sprite.set_opacity(0.5);
        sprite.change_opacity(2.0);
        assert_eq!(sprite.opacity(), 1.0);
        sprite.change_opacity(-5.0);
        assert_eq!(sprite.opacity(), 0.0);
    }

    #[test]
    fn change_opacity_composes_additively() {
        let mut sprite = Sprite::new("smile");
        sprite.set_opacity(0.25);
        sprite.change_opacity(0.5);
        assert!((sprite.opacity() - 0.75).abs() < 1e-6);
        sprite.change_opacity(0.0);
        assert!((sprite.opacity() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn fully_transparent_sprites_are_not_visible() {
        let mut sprite = Sprite::new("smile");
        assert!(sprite.is_visible());
        sprite.set_opacity(0.0);
        assert!(!sprite.is_visible());
        sprite.set_opacity(0.1);
        sprite.hide();
        assert!(!sprite.is_visible());
        sprite.show();
        assert!(sprite.is_visible());
    }

    #[test]
    fn rotation_wraps_only_past_360() {
        let mut sprite = Sprite::new("smile");
        sprite.rotate_by(200.0);
        sprite.rotate_by(160.0);
        // Exactly 360 is not an overflow.
        assert_eq!(sprite.rotation(), 360.0);
        sprite.rotate_by(1.0);
        assert_eq!(sprite.rotation(), 0.0);
    }

    #[test]
    fn negative_rotation_never_wraps() {
        let mut sprite = Sprite::new("smile");
        sprite.rotate_by(-90.0);
        assert_eq!(sprite.rotation(), -90.0);
        sprite.rotate_by(-300.0);
        assert_eq!(sprite.rotation(), -390.0);
    }

    #[test]
    fn set_rotation_does_not_normalise() {
        let mut sprite = Sprite::new("smile");
        sprite.set_rotation(720.0);
        assert_eq!(sprite.rotation(), 720.0);
    }

    #[test]
    fn texture_binding_is_written_once() {
        let mut sprite = Sprite::new("smile");
        assert!(!sprite.is_resolved());
        sprite.bind_texture(64, 32);
        assert_eq!(sprite.texture_size(), Some((64, 32)));
        assert_eq!(sprite.bounds().width(), 64.0);

        sprite.bind_texture(128, 128);
        assert_eq!(sprite.texture_size(), Some((64, 32)));
    }

    #[test]
    fn sprite_defaults_name_to_texture() {
        let sprite = Sprite::new("smile");
        assert_eq!(sprite.name(), "smile");
        let named = Sprite::with_name("player", "smile");
        assert_eq!(named.name(), "player");
        assert_eq!(named.texture_name(), "smile");
    }
}

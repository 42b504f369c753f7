//! Axis-aligned bounding box around a sprite texture.

use cgmath::Vector2;

/// Represents a bounding box around a sprite texture. All values are
/// absolute.
///
/// The box stores its centre, the unscaled texture size and a scale factor;
/// edges and corners are derived on demand as `centre ± scale · half-extent`
/// and never stored. The unscaled size is written once, from the pixel
/// dimensions of the owning sprite's texture. The scale factor saturates at
/// zero: a negative request clamps to 0 instead of mirroring the box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    centre_x: f32,
    centre_y: f32,
    width: f32,
    height: f32,
    scale: f32,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            centre_x: 0.0,
            centre_y: 0.0,
            width: 0.0,
            height: 0.0,
            scale: 1.0,
        }
    }
}

impl Aabb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn centre_x(&self) -> f32 {
        self.centre_x
    }

    pub fn set_centre_x(&mut self, centre_x: f32) {
        self.centre_x = centre_x;
    }

    pub fn centre_y(&self) -> f32 {
        self.centre_y
    }

    pub fn set_centre_y(&mut self, centre_y: f32) {
        self.centre_y = centre_y;
    }

    /// Unscaled width, taken from the texture.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Unscaled height, taken from the texture.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub(crate) fn set_size(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
    }

    pub fn move_x(&mut self, value: f32) {
        self.centre_x += value;
    }

    pub fn move_y(&mut self, value: f32) {
        self.centre_y += value;
    }

    /// Add a delta to the scale factor, saturating at zero.
    pub fn scale_by(&mut self, delta: f32) {
        self.scale = (self.scale + delta).max(0.0);
    }

    /// The absolute left coordinate of the bounding box.
    pub fn left(&self) -> f32 {
        self.centre_x - self.scale * (self.width / 2.0)
    }

    /// The absolute right coordinate of the bounding box.
    pub fn right(&self) -> f32 {
        self.centre_x + self.scale * (self.width / 2.0)
    }

    /// The absolute bottom coordinate of the bounding box.
    pub fn bottom(&self) -> f32 {
        self.centre_y - self.scale * (self.height / 2.0)
    }

    /// The absolute top coordinate of the bounding box.
    pub fn top(&self) -> f32 {
        self.centre_y + self.scale * (self.height / 2.0)
    }

    pub fn absolute_width(&self) -> f32 {
        self.width * self.scale
    }

    pub fn absolute_height(&self) -> f32 {
        self.height * self.scale
    }

    pub fn top_left(&self) -> Vector2<f32> {
        Vector2::new(self.left(), self.top())
    }

    pub fn top_right(&self) -> Vector2<f32> {
        Vector2::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Vector2<f32> {
        Vector2::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Vector2<f32> {
        Vector2::new(self.right(), self.bottom())
    }
}

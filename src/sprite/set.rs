//! The ordered registry of live sprites.

use crate::sprite::sprite::Sprite;

/// An ordered, mutable collection of all live sprites.
///
/// Iteration order is insertion order, and that order is used both for
/// per-tick updates and for draw order — there is no depth sorting, a
/// sprite added later draws over an earlier one. Sprites leave the
/// collection only through an explicit [`remove`](Self::remove).
#[derive(Default)]
pub struct SpriteSet {
    sprites: Vec<Sprite>,
}

impl SpriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Remove the first sprite with the given name, releasing ownership to
    /// the caller. The relative order of the remaining sprites is kept.
    pub fn remove(&mut self, name: &str) -> Option<Sprite> {
        let index = self.sprites.iter().position(|s| s.name() == name)?;
        Some(self.sprites.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|s| s.name() == name)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.sprites.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_follows_insertion_order() {
        let mut set = SpriteSet::new();
        set.add(Sprite::with_name("a", "tex"));
        set.add(Sprite::with_name("b", "tex"));
        set.add(Sprite::with_name("c", "tex"));
        let names: Vec<_> = set.iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn removal_is_explicit_and_keeps_order() {
        let mut set = SpriteSet::new();
        set.add(Sprite::with_name("a", "tex"));
        set.add(Sprite::with_name("b", "tex"));
        set.add(Sprite::with_name("c", "tex"));

        let removed = set.remove("b").unwrap();
        assert_eq!(removed.name(), "b");
        assert!(set.remove("b").is_none());

        let names: Vec<_> = set.iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn lookup_by_name() {
        let mut set = SpriteSet::new();
        set.add(Sprite::with_name("player", "tex"));
        assert!(set.get("player").is_some());
        set.get_mut("player").unwrap().set_x(9.0);
        assert_eq!(set.get("player").unwrap().x(), 9.0);
        assert!(set.get("ghost").is_none());
    }
}

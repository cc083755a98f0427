//! Visualization options

use bitflags::bitflags;

bitflags! {
    /// Geom categories used to filter what gets drawn
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Category: u32 {
        /// Geoms on bodies welded to the world
        const STATIC = 1 << 0;
        /// Geoms on bodies that can move
        const DYNAMIC = 1 << 1;
        /// Decorative elements such as the world frame
        const DECOR = 1 << 2;
        const ALL = Self::STATIC.bits() | Self::DYNAMIC.bits() | Self::DECOR.bits();
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::ALL
    }
}

/// What the scene includes and how it is colored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisOptions {
    pub categories: Category,
    /// Draw the world coordinate axes
    pub world_frame: bool,
    /// Keep geom alpha instead of forcing opaque
    pub transparency: bool,
}

impl Default for VisOptions {
    fn default() -> Self {
        Self {
            categories: Category::ALL,
            world_frame: false,
            transparency: false,
        }
    }
}

impl VisOptions {
    pub fn toggle_world_frame(&mut self) -> bool {
        self.world_frame = !self.world_frame;
        self.world_frame
    }

    /// Builder: set enabled categories
    pub fn with_categories(mut self, categories: Category) -> Self {
        self.categories = categories;
        self
    }

    /// Builder: show or hide the world frame
    pub fn with_world_frame(mut self, enabled: bool) -> Self {
        self.world_frame = enabled;
        self
    }

    /// Builder: enable or disable transparency
    pub fn with_transparency(mut self, enabled: bool) -> Self {
        self.transparency = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shows_everything() {
        let opts = VisOptions::default();
        assert!(opts.categories.contains(Category::STATIC | Category::DYNAMIC | Category::DECOR));
        assert!(!opts.world_frame);
    }

    #[test]
    fn test_toggle_world_frame() {
        let mut opts = VisOptions::default();
        assert!(opts.toggle_world_frame());
        assert!(!opts.toggle_world_frame());
    }
}

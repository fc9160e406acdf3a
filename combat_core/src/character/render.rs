//! Dirty flags for embedding renderers
//!
//! The engine never draws anything; it just records which facets of a
//! character changed since the embedder last cleared the flags.

/// Which parts of a character need redrawing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderFlags {
    pub hitpoints: bool,
    pub barrier: bool,
    pub stats: bool,
    pub effects: bool,
    pub attack_bar: bool,
}

impl RenderFlags {
    pub fn all() -> Self {
        RenderFlags {
            hitpoints: true,
            barrier: true,
            stats: true,
            effects: true,
            attack_bar: true,
        }
    }

    pub fn any(&self) -> bool {
        self.hitpoints || self.barrier || self.stats || self.effects || self.attack_bar
    }

    pub fn clear(&mut self) {
        *self = RenderFlags::default();
    }
}

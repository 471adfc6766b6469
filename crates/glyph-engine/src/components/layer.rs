use serde::Serialize;

/// Render layer. Controls stacking order for entities.
///
/// Layers are drawn back-to-front: Background first, UI last. Hit-testing
/// walks them front-to-back, so a region on a higher layer wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[repr(u8)]
pub enum RenderLayer {
    Background = 0,
    Terrain = 1,
    #[default]
    Objects = 2,
    Foreground = 3,
    VFX = 4,
    UI = 5,
}

impl RenderLayer {
    /// Total number of render layers.
    pub const COUNT: usize = 6;

    /// Convert from a u8 value to a RenderLayer.
    /// Returns None if the value is out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Background),
            1 => Some(Self::Terrain),
            2 => Some(Self::Objects),
            3 => Some(Self::Foreground),
            4 => Some(Self::VFX),
            5 => Some(Self::UI),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_back_to_front() {
        assert!(RenderLayer::Background < RenderLayer::Terrain);
        assert!(RenderLayer::Terrain < RenderLayer::Objects);
        assert!(RenderLayer::Objects < RenderLayer::Foreground);
        assert!(RenderLayer::VFX < RenderLayer::UI);
    }

    #[test]
    fn from_u8_rejects_out_of_range() {
        assert_eq!(RenderLayer::from_u8(5), Some(RenderLayer::UI));
        assert!(RenderLayer::from_u8(RenderLayer::COUNT as u8).is_none());
    }
}

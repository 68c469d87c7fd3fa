/// Corner location on one pyramid level, before descriptors are attached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredKeypoint {
    pub x: usize,
    pub y: usize,
    pub angle: f32,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: usize,
    pub height: usize,
}

impl ScaleLevel {
    /// Map a coordinate on this level back to level 0
    pub fn to_base(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale, y * self.scale)
    }
}

/// Corner type classification for the segment test
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}

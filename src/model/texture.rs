/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// 1x1 opaque white, bound when a mesh has no texture.
    pub fn white() -> Self {
        Self {
            name: "white".to_string(),
            rgba: vec![255, 255, 255, 255],
            width: 1,
            height: 1,
        }
    }

    pub fn is_valid(&self) -> bool {
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        self.width > 0 && self.height > 0 && expected == Some(self.rgba.len())
    }
}

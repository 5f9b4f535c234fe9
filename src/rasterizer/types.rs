//! Pixel buffer shared by textures and render targets

use super::color::Color;
use super::math::{IVec2, Vec2, Vec3};

/// Only RGBA8 images are supported
pub const CHANNELS: usize = 4;

/// Flat RGBA8 image.
///
/// Bytes are stored top row first, but `get_pixel`/`set_pixel` address
/// pixels from the bottom-left corner: y = 0 is the last stored row. Out of
/// range coordinates panic.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl Image {
    /// Image filled with a single color
    pub fn solid(width: usize, height: usize, color: Color) -> Self {
        let data = color.to_bytes().repeat(width * height);
        Self { width, height, channels: CHANNELS, data }
    }

    pub fn new(width: usize, height: usize) -> Self {
        Self::solid(width, height, Color::with_alpha(0, 0, 0, 0))
    }

    /// Wrap raw RGBA8 bytes produced by an external decoder
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width * height * CHANNELS,
            "raw image data does not match {}x{} RGBA",
            width,
            height
        );
        Self { width, height, channels: CHANNELS, data }
    }

    /// Decode an image file into RGBA8
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, image::ImageError> {
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_raw(width as usize, height as usize, rgba.into_raw()))
    }

    /// Decode an in-memory encoded image (PNG, JPEG, ...)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_raw(width as usize, height as usize, rgba.into_raw()))
    }

    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, cell: usize, color1: Color, color2: Color) -> Self {
        let mut img = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                img.set_pixel(x as i32, y as i32, if checker { color1 } else { color2 });
            }
        }
        img
    }

    pub fn stride(&self) -> usize {
        self.width * self.channels
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Byte offset of the pixel at bottom-left based (x, y)
    fn offset(&self, x: i32, y: i32) -> usize {
        assert_eq!(self.channels, CHANNELS, "only RGBA images are supported");
        assert!(
            self.contains(x, y),
            "pixel ({}, {}) outside {}x{} image",
            x,
            y,
            self.width,
            self.height
        );
        let row = self.height - 1 - y as usize;
        row * self.stride() + x as usize * CHANNELS
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        let i = self.offset(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&color.to_bytes());
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        let i = self.offset(x, y);
        Color::from_bytes([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Decode a normal-map texel: each channel maps [0, 255] to [-1, 1]
    pub fn get_normal(&self, x: i32, y: i32) -> Vec3 {
        let p = self.get_pixel(x, y);
        let decode = |c: u8| c as f32 / 255.0 * 2.0 - 1.0;
        Vec3::new(decode(p.r), decode(p.g), decode(p.b))
    }

    /// Texel addressed by a uv coordinate (clamped to [0, 1])
    pub fn texel(&self, uv: Vec2) -> IVec2 {
        let u = uv.x.clamp(0.0, 1.0);
        let v = uv.y.clamp(0.0, 1.0);
        IVec2::new(
            (u * (self.width - 1) as f32) as i32,
            (v * (self.height - 1) as f32) as i32,
        )
    }

    /// Nearest-texel lookup (no filtering)
    pub fn sample(&self, uv: Vec2) -> Color {
        let t = self.texel(uv);
        self.get_pixel(t.x, t.y)
    }

    pub fn sample_normal(&self, uv: Vec2) -> Vec3 {
        let t = self.texel(uv);
        self.get_normal(t.x, t.y)
    }

    /// Overwrite every pixel with one color
    pub fn fill(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_left_origin() {
        let mut img = Image::new(3, 2);
        img.set_pixel(0, 0, Color::RED);
        // y = 0 is the last stored row
        assert_eq!(&img.data[img.stride()..img.stride() + 4], &[255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0), Color::RED);
        assert_eq!(img.get_pixel(0, 1), Color::with_alpha(0, 0, 0, 0));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_range_panics() {
        let img = Image::new(4, 4);
        img.get_pixel(4, 0);
    }

    #[test]
    #[should_panic(expected = "RGBA")]
    fn test_non_rgba_panics() {
        let mut img = Image::new(2, 2);
        img.channels = 3;
        img.get_pixel(0, 0);
    }

    #[test]
    fn test_get_normal_decodes_range() {
        let mut img = Image::new(1, 1);
        img.set_pixel(0, 0, Color::with_alpha(255, 0, 128, 255));
        let n = img.get_normal(0, 0);
        assert!((n.x - 1.0).abs() < 1e-6);
        assert!((n.y + 1.0).abs() < 1e-6);
        assert!(n.z.abs() < 0.01);
    }

    #[test]
    fn test_texel_mapping() {
        let img = Image::new(5, 9);
        assert_eq!(img.texel(Vec2::new(0.0, 0.0)), IVec2::new(0, 0));
        assert_eq!(img.texel(Vec2::new(1.0, 1.0)), IVec2::new(4, 8));
        assert_eq!(img.texel(Vec2::new(1.5, -0.2)), IVec2::new(4, 0));
    }

    #[test]
    fn test_fill_and_solid() {
        let mut img = Image::solid(2, 2, Color::BLUE);
        assert_eq!(img.get_pixel(1, 1), Color::BLUE);
        img.fill(Color::GREEN);
        assert!(img.data.chunks(4).all(|p| p == [0, 255, 0, 255]));
    }

    #[test]
    fn test_checkerboard() {
        let img = Image::checkerboard(8, 8, 4, Color::WHITE, Color::BLACK);
        assert_eq!(img.get_pixel(0, 0), Color::WHITE);
        assert_eq!(img.get_pixel(4, 0), Color::BLACK);
        assert_eq!(img.get_pixel(4, 4), Color::WHITE);
    }

    #[test]
    fn test_from_bytes_png() {
        let mut png = Vec::new();
        let buf = image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 4]));
        buf.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let img = Image::from_bytes(&png).unwrap();
        assert_eq!((img.width, img.height), (2, 3));
        assert_eq!(img.get_pixel(1, 2), Color::with_alpha(1, 2, 3, 4));
    }
}

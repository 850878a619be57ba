//! Image manipulation.

mod rect;

use std::{fmt, path::Path};

use image::{imageops, imageops::FilterType, ImageBuffer, Rgba, RgbaImage};

use crate::resolution::Resolution;

pub use rect::Rect;

/// An 8-bit sRGB image with alpha channel.
///
/// Samples are stored row-major with the origin in the top-left corner, 4
/// bytes per pixel.
#[derive(Clone)]
pub struct Image {
    pub(crate) buf: RgbaImage,
}

impl Image {
    /// Loads an image from the filesystem.
    pub fn load<A: AsRef<Path>>(path: A) -> crate::Result<Self> {
        let image = image::open(path)?;
        Ok(Self {
            buf: image.into_rgba8(),
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        Ok(self.buf.save(path)?)
    }

    /// Creates an empty image of a specified size.
    ///
    /// The image will start out black and fully transparent.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Returns the width of this image, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this image, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Returns the size of this image.
    #[inline]
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    /// Gets the image color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        let rgba = &self.buf[(x, y)];
        Color(rgba.0)
    }

    /// Sets the image color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf[(x, y)] = Rgba(color.0);
    }

    /// Samples the image at a fractional position by bilinearly blending the
    /// four neighboring texels.
    ///
    /// The caller must ensure `x ∈ [0, width-1)` and `y ∈ [0, height-1)` so
    /// that all four neighbors exist.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> [f32; 4] {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as u32, y0 as u32);

        let p00 = self.get(x0, y0).0;
        let p10 = self.get(x0 + 1, y0).0;
        let p01 = self.get(x0, y0 + 1).0;
        let p11 = self.get(x0 + 1, y0 + 1).0;

        let mut out = [0.0; 4];
        for ch in 0..4 {
            let top = p00[ch] as f32 * (1.0 - fx) + p10[ch] as f32 * fx;
            let bottom = p01[ch] as f32 * (1.0 - fx) + p11[ch] as f32 * fx;
            out[ch] = top * (1.0 - fy) + bottom * fy;
        }
        out
    }

    /// Resizes this image to a new size with bilinear resampling.
    pub fn resize_bilinear(&self, new_res: Resolution) -> Image {
        Image {
            buf: imageops::resize(
                &self.buf,
                new_res.width(),
                new_res.height(),
                FilterType::Triangle,
            ),
        }
    }

    /// Overwrites `self` with the contents of `src`.
    ///
    /// # Panics
    ///
    /// Both images must have the same dimensions.
    pub fn copy_from(&mut self, src: &Image) {
        assert_eq!(self.resolution(), src.resolution());
        self.data_mut().copy_from_slice(src.data());
    }

    /// Resets every sample to 0, making the image black and fully transparent.
    pub fn clear(&mut self) {
        self.data_mut().fill(0);
    }

    /// Raw sample data, `4 * width * height` bytes in RGBA order.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.buf.as_raw()
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Image", self.width(), self.height())
    }
}

/// An 8-bit RGBA color.
///
/// Colors are always in the sRGB color space and use non-premultiplied alpha.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);
    pub const MAGENTA: Self = Self([255, 0, 255, 255]);

    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_image_is_transparent_black() {
        let img = Image::new(4, 3);
        assert_eq!(img.data().len(), 4 * 4 * 3);
        assert!(img.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn get_set_roundtrip() {
        let mut img = Image::new(8, 8);
        img.set(3, 5, Color::MAGENTA);
        assert_eq!(img.get(3, 5), Color::MAGENTA);
        assert_eq!(img.get(0, 0), Color([0, 0, 0, 0]));
    }

    #[test]
    fn save_load_roundtrip() {
        let img = crate::test::gradient(8, 8);
        let path = std::env::temp_dir().join("omote-image-roundtrip.png");
        img.save(&path).unwrap();

        let loaded = Image::load(&path).unwrap();
        assert_eq!(loaded.resolution(), img.resolution());
        assert_eq!(loaded.data(), img.data());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn bilinear_sample_blends_neighbors() {
        let mut img = Image::new(2, 2);
        img.set(0, 0, Color::from_rgb8(0, 0, 0));
        img.set(1, 0, Color::from_rgb8(100, 0, 0));
        img.set(0, 1, Color::from_rgb8(0, 100, 0));
        img.set(1, 1, Color::from_rgb8(100, 100, 0));

        let s = img.sample_bilinear(0.5, 0.5);
        assert!((s[0] - 50.0).abs() < 1e-3);
        assert!((s[1] - 50.0).abs() < 1e-3);

        let exact = img.sample_bilinear(0.0, 0.0);
        assert_eq!(exact[0], 0.0);
    }
}

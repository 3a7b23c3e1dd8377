//! Image primitives and utilities.
//!
//! The project uses a lightweight owned RGBA image type (`OwnedImage`) that is
//! optimized for the many small crops a container scan produces (one per slot,
//! one per digit cell, one per candidate sprite).
//!
//! For many operations we borrow a view (`Image<'a>`) instead of copying pixels.
//! Cropping a sprite to its bounding box, for example, is just a narrower view.

use anyhow::{Context, Result};

use crate::Color;

/// Owned RGBA image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Image filled with a single color.
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            width,
            height,
            data: vec![fill; (width * height) as usize],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Build an `OwnedImage` from RGBA bytes.
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width.max(1) / 4;
        let data = bytes
            .chunks_exact(4)
            .take(width * height)
            .map(|v| Color::rgba(v[0], v[1], v[2], v[3]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Decode any format the `image` crate understands (PNG in practice).
    ///
    /// Sources without an alpha channel come out fully opaque.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .context("decode image")?
            .to_rgba8();
        Ok(Self::from_rgba_image(&img))
    }

    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("decode {}", path.display()))
    }

    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgba(width as usize, img.as_raw())
    }

    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut bytes = Vec::with_capacity(self.data.len() * 4);
        for c in &self.data {
            bytes.extend_from_slice(&[c.r, c.g, c.b, c.a]);
        }
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.to_rgba_image()
            .write_to(&mut out, image::ImageFormat::Png)
            .context("encode png")?;
        Ok(out.into_inner())
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(x + y * self.width) as usize]
    }

    #[inline(always)]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.data[(x + y * self.width) as usize] = color;
    }

    /// Fill a rectangle, clipped to the image bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Color) {
        let x2 = x.saturating_add(width).min(self.width);
        let y2 = y.saturating_add(height).min(self.height);
        for py in y.min(y2)..y2 {
            for px in x.min(x2)..x2 {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Copy `src` onto this image at `(x, y)`, replacing pixels including alpha.
    pub fn paste(&mut self, src: Image, x: u32, y: u32) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                let (dx, dy) = (x + sx, y + sy);
                if dx < self.width && dy < self.height {
                    self.set_pixel(dx, dy, src.pixel(sx, sy));
                }
            }
        }
    }

    /// Alpha-composite `src` over this image at `(x, y)`.
    pub fn composite(&mut self, src: Image, x: u32, y: u32) {
        for sy in 0..src.height() {
            for sx in 0..src.width() {
                let (dx, dy) = (x + sx, y + sy);
                if dx < self.width && dy < self.height {
                    let under = self.pixel(dx, dy);
                    self.set_pixel(dx, dy, src.pixel(sx, sy).over(under));
                }
            }
        }
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Pixel at view-relative coordinates.
    #[inline(always)]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(self.x1 + x + (self.y1 + y) * self.true_width) as usize]
    }

    /// Iterate the rows of the view, each as `(y, pixels)`.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &'a [Color])> + use<'a> {
        let data: &'a [Color] = self.data;
        let width = self.width() as usize;
        let (x1, y1, true_width) = (self.x1, self.y1, self.true_width);
        (0..self.height()).map(move |y| {
            let start = (x1 + (y1 + y) * true_width) as usize;
            (y, &data[start..start + width])
        })
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for (_, row) in self.rows() {
            data.extend_from_slice(row);
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_owned_image()
            .to_rgba_image()
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("save png {}", path.display()))?;
        Ok(())
    }

    /// Create an arbitrary subimage (relative coordinates), clipped to the view.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    /// Pixel-for-pixel equality of two views (position in the parent ignored).
    pub fn same_pixels(&self, other: Image) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.rows().zip(other.rows()).all(|((_, a), (_, b))| a == b)
    }
}

impl std::fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("x", &self.x1)
            .field("y", &self.y1)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

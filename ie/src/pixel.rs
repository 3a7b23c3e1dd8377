//! Pixel type and the primitive classifiers every scanning stage is built on.
//!
//! All comparisons use [`Color::diff`], the sum of absolute RGB channel
//! differences. Alpha never takes part in a distance, it only decides
//! transparency.

/// Quality used when sampling the color signature of a sprite.
pub const SIGNATURE_QUALITY: u32 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const TRANSPARENT: Self = Self::rgba(255, 255, 255, 0);
    /// Written over pixels consumed by the digit reader.
    pub const NUMBER_MARKER: Self = Self::rgba(255, 255, 0, 0);

    /// Opaque color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color channels with a different alpha.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Sum of absolute per-channel (R, G, B) differences.
    #[inline]
    pub fn diff(self, other: Color) -> u32 {
        self.r.abs_diff(other.r) as u32 + self.g.abs_diff(other.g) as u32 + self.b.abs_diff(other.b) as u32
    }

    #[inline]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    #[inline]
    pub fn is_number_marker(self) -> bool {
        self.is_transparent() && self.r == 255 && self.g == 255 && self.b == 0
    }

    #[inline]
    pub fn is_white(self) -> bool {
        self.r == 255 && self.g == 255 && self.b == 255
    }

    /// True when the pixel has no visual content to match against.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.is_white() || self.is_transparent() || self.is_number_marker()
    }

    /// Dark, nearly gray pixels like the inside of a slot frame.
    ///
    /// The accepted band `[max(0, 22 - 2q), min(80, 60 + q)]` and the allowed
    /// channel spread `min(15, 8 + q)` both widen as `quality` grows.
    pub fn is_background(self, quality: u32) -> bool {
        let low = 22u32.saturating_sub(quality.saturating_mul(2));
        let high = 60u32.saturating_add(quality).min(80);
        let spread = 8u32.saturating_add(quality).min(15);

        let (r, g, b) = (self.r as u32, self.g as u32, self.b as u32);
        let in_band = |c: u32| c >= low && c <= high;
        if !(in_band(r) && in_band(g) && in_band(b)) {
            return false;
        }

        let max_spread = r.abs_diff(g).max(r.abs_diff(b)).max(g.abs_diff(b));
        max_spread < spread
    }

    /// Alpha-composite `self` over `dst` ("over" operator).
    pub fn over(self, dst: Color) -> Color {
        if self.a == 255 || dst.a == 0 {
            return self;
        }
        if self.a == 0 {
            return dst;
        }

        let sa = self.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        let blend = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };

        Color {
            r: blend(self.r, dst.r),
            g: blend(self.g, dst.g),
            b: blend(self.b, dst.b),
            a: (out_a * 255.0).round() as u8,
        }
    }
}

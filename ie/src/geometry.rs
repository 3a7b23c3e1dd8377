//! Sprite geometry: bounding-box crop, footprint size and color signature.
//!
//! These three numbers (plus the cropped dimensions) are what the fingerprint
//! store indexes, so they must be computed identically for catalog frames and
//! for sprites cut out of screenshots.

use crate::{Color, Image, SIGNATURE_QUALITY};

/// Average hue bias of a sprite as channel differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct ColorSignature {
	/// `R̄ - Ḡ`
	pub red: i32,
	/// `R̄ - B̄`
	pub green: i32,
	/// `Ḡ - B̄`
	pub blue: i32,
}

impl ColorSignature {
	pub fn distance(&self, other: &ColorSignature) -> u32 {
		self.red.abs_diff(other.red) + self.green.abs_diff(other.green) + self.blue.abs_diff(other.blue)
	}
}

/// Minimal view enclosing every non-empty pixel, `None` when there is none.
///
/// Each edge is found by its own scan from the outside in.
pub fn crop(sprite: Image) -> Option<Image> {
	let (w, h) = (sprite.width(), sprite.height());
	let filled = |x: u32, y: u32| !sprite.pixel(x, y).is_empty();

	let top = (0..h).find(|&y| (0..w).any(|x| filled(x, y)))?;
	let bottom = (0..h).rev().find(|&y| (0..w).any(|x| filled(x, y)))?;
	let left = (0..w).find(|&x| (0..h).any(|y| filled(x, y)))?;
	let right = (0..w).rev().find(|&x| (0..h).any(|y| filled(x, y)))?;

	Some(sprite.sub_image(left, top, right - left + 1, bottom - top + 1))
}

/// Approximate visible area of a sprite.
///
/// Starts from the full `w * h` and subtracts, per row, the empty run before
/// the first filled pixel and the empty run after the last one. A row with no
/// filled pixel at all still counts as one pixel. A fully opaque sprite has a
/// footprint of exactly `w * h`.
pub fn footprint_size(sprite: Image) -> u32 {
	let w = sprite.width();
	let mut size = w * sprite.height();

	for (_, row) in sprite.rows() {
		match row.iter().position(|c| !c.is_empty()) {
			Some(lead) => {
				let trail = row.iter().rev().position(|c| !c.is_empty()).unwrap_or(0);
				size -= (lead + trail) as u32;
			}
			None => size -= w.saturating_sub(1),
		}
	}

	size
}

/// Average color of the visible, non-background pixels as channel differences.
///
/// Raw means drift with screenshot brightness; the differences keep the hue.
pub fn color_signature(sprite: Image) -> ColorSignature {
	let mut count = 0u32;
	let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);

	for (_, row) in sprite.rows() {
		for c in row.iter().copied().filter(|c| counts_for_signature(*c)) {
			r += c.r as u32;
			g += c.g as u32;
			b += c.b as u32;
			count += 1;
		}
	}

	if count == 0 {
		return ColorSignature::default();
	}

	let (r, g, b) = ((r / count) as i32, (g / count) as i32, (b / count) as i32);
	ColorSignature {
		red: r - g,
		green: r - b,
		blue: g - b,
	}
}

fn counts_for_signature(c: Color) -> bool {
	!(c.is_empty() || c.is_background(SIGNATURE_QUALITY))
}

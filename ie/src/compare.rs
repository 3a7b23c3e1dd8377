//! Tolerance based comparison of a cropped slot sprite with a catalog sprite.

use crate::Image;

/// Quality floor used for threshold math.
pub const MIN_COMPARE_QUALITY: u32 = 5;

/// Per-candidate cutoffs derived from the slot sprite's footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
	/// Effective quality after clamping to [`MIN_COMPARE_QUALITY`].
	pub quality: u32,
	/// Budget for accumulated color distance.
	pub mismatch: f64,
	/// Budget for shape disagreements.
	pub silhouette: f64,
}

impl Thresholds {
	pub fn new(footprint: u32, quality: u32) -> Self {
		let quality = quality.max(MIN_COMPARE_QUALITY);
		let base = footprint as f64 * quality as f64;
		Self {
			quality,
			mismatch: base * 2.0,
			silhouette: base * 0.006,
		}
	}
}

/// Compare two sprites in lockstep over their common area.
///
/// Both filled and far apart (more than `6 * quality`) adds the color distance
/// to the mismatch count. A shape disagreement adds one to the silhouette
/// count, except where the slot pixel is empty and the candidate pixel is
/// background colored or the slot pixel is a consumed digit pixel. Gives up as
/// soon as either count exceeds its threshold.
pub fn sprites_match(slot: Image, candidate: Image, thresholds: &Thresholds) -> bool {
	let q = thresholds.quality;
	let w = slot.width().min(candidate.width());
	let h = slot.height().min(candidate.height());

	let mut mismatch = 0u64;
	let mut silhouette = 0u64;

	for y in 0..h {
		for x in 0..w {
			let s = slot.pixel(x, y);
			let c = candidate.pixel(x, y);
			match (s.is_empty(), c.is_empty()) {
				(true, true) => {}
				(false, false) => {
					let diff = s.diff(c);
					if diff > q * 6 {
						mismatch += diff as u64;
					}
				}
				(true, false) => {
					if !(c.is_background(q) || s.is_number_marker()) {
						silhouette += 1;
					}
				}
				(false, true) => silhouette += 1,
			}

			if mismatch as f64 > thresholds.mismatch || silhouette as f64 > thresholds.silhouette {
				return false;
			}
		}
	}

	true
}

//! Quantity overlay printed in the lower right corner of a stacked slot.
//!
//! Three 8x10 cells (hundreds, tens, units) sit at a fixed offset inside the
//! 32x32 sprite. A cell holds a digit when every ink pixel of that digit's
//! glyph is present with the exact color.

use crate::{Color, GLYPH_HEIGHT, GLYPH_WIDTH, Image, OwnedImage};

/// Top-left corner of the hundreds cell inside a 32x32 sprite.
pub const DIGITS_ORIGIN: (u32, u32) = (8, 21);
const CELLS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitReading {
	/// Parsed quantity, 1 when no digit was found.
	pub quantity: u32,
	/// 24x10 image holding the recognized glyphs, transparent elsewhere.
	pub overlay: OwnedImage,
}

/// Read the quantity from `slot` and mark the consumed glyph pixels.
///
/// Every ink pixel of a recognized glyph is replaced by
/// [`Color::NUMBER_MARKER`] so later stages treat it as empty.
pub fn read_quantity(slot: &mut OwnedImage, glyphs: &[OwnedImage; 10]) -> DigitReading {
	let mut overlay = OwnedImage::new(GLYPH_WIDTH * CELLS, GLYPH_HEIGHT, Color::TRANSPARENT);
	let (ox, oy) = DIGITS_ORIGIN;
	if slot.width() < ox + GLYPH_WIDTH * CELLS || slot.height() < oy + GLYPH_HEIGHT {
		return DigitReading { quantity: 1, overlay };
	}

	let mut digits = String::new();
	for cell in 0..CELLS {
		let view = slot.as_image().sub_image(ox + cell * GLYPH_WIDTH, oy, GLYPH_WIDTH, GLYPH_HEIGHT);
		if let Some(digit) = glyphs.iter().position(|g| glyph_matches(view, g.as_image())) {
			digits.push(char::from(b'0' + digit as u8));
			overlay.paste(glyphs[digit].as_image(), cell * GLYPH_WIDTH, 0);
		}
	}

	for (y, row) in overlay.as_image().rows() {
		for (x, c) in row.iter().enumerate() {
			if !c.is_transparent() {
				slot.set_pixel(ox + x as u32, oy + y, Color::NUMBER_MARKER);
			}
		}
	}

	let quantity = if digits.is_empty() { 1 } else { digits.parse().unwrap_or(1) };
	DigitReading { quantity, overlay }
}

/// Draw `quantity` right-aligned into the digit cells, without leading zeros.
///
/// Values above 999 keep their last three digits.
pub fn render_quantity(slot: &mut OwnedImage, quantity: u32, glyphs: &[OwnedImage; 10]) {
	let (ox, oy) = DIGITS_ORIGIN;
	let text = (quantity % 1000).to_string();
	let skip = CELLS - text.len() as u32;
	for (i, b) in text.bytes().enumerate() {
		let glyph = &glyphs[(b - b'0') as usize];
		slot.composite(glyph.as_image(), ox + (skip + i as u32) * GLYPH_WIDTH, oy);
	}
}

fn glyph_matches(cell: Image, glyph: Image) -> bool {
	let w = cell.width().min(glyph.width());
	let h = cell.height().min(glyph.height());
	(0..h).all(|y| {
		(0..w).all(|x| {
			let ink = glyph.pixel(x, y);
			ink.is_transparent() || ink.diff(cell.pixel(x, y)) == 0
		})
	})
}

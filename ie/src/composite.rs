//! Annotated output: recognized sprites redrawn on a clean slot, plus an icon
//! telling which group each slot was resolved to.

use crate::{Image, OwnedImage, Templates, digits::DIGITS_ORIGIN};

/// Redraw a recognized item over the slot whose frame starts at `(x, y)`.
///
/// The slot is reset to the clean template, `frame` (the uncropped 32x32
/// catalog sprite) is blended onto its interior and, for stacks, the digit
/// overlay read from the screenshot is drawn back on top.
pub fn draw_match(canvas: &mut OwnedImage, templates: &Templates, x: u32, y: u32, frame: Image, quantity: Option<&OwnedImage>) {
	canvas.paste(templates.slot.as_image(), x, y);
	canvas.composite(frame, x + 1, y + 1);
	if let Some(overlay) = quantity {
		let (ox, oy) = DIGITS_ORIGIN;
		canvas.composite(overlay.as_image(), x + 1 + ox, y + 1 + oy);
	}
}

/// Blend the icon for `group` over the slot at `(x, y)`.
pub fn stamp_group(canvas: &mut OwnedImage, templates: &Templates, x: u32, y: u32, group: &str, value: u32) {
	canvas.composite(templates.icon(group, value), x, y);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Color, SLOT_SIZE, UNKNOWN_GROUP};

	#[test]
	fn draws_sprite_on_clean_slot() {
		let t = Templates::builtin();
		let mut canvas = OwnedImage::new(50, 50, Color::BLACK);
		let mut frame = OwnedImage::new(32, 32, Color::TRANSPARENT);
		frame.fill_rect(4, 4, 3, 3, Color::new(200, 10, 10));

		draw_match(&mut canvas, &t, 5, 5, frame.as_image(), None);
		assert_eq!(canvas.pixel(5, 5), t.slot.pixel(0, 0));
		assert_eq!(canvas.pixel(6, 6), t.slot.pixel(1, 1));
		assert_eq!(canvas.pixel(10, 10), Color::new(200, 10, 10));
		assert_eq!(canvas.pixel(4, 4), Color::BLACK);
	}

	#[test]
	fn redraws_quantity() {
		let t = Templates::builtin();
		let mut canvas = OwnedImage::new(SLOT_SIZE, SLOT_SIZE, Color::BLACK);
		let frame = OwnedImage::new(32, 32, Color::TRANSPARENT);
		let mut overlay = OwnedImage::new(24, 10, Color::TRANSPARENT);
		overlay.paste(t.digits[4].as_image(), 16, 0);

		draw_match(&mut canvas, &t, 0, 0, frame.as_image(), Some(&overlay));
		let (ox, oy) = DIGITS_ORIGIN;
		for gy in 0..10 {
			for gx in 0..8 {
				let g = t.digits[4].pixel(gx, gy);
				if !g.is_transparent() {
					assert_eq!(canvas.pixel(1 + ox + 16 + gx, 1 + oy + gy), g);
				}
			}
		}
	}

	#[test]
	fn stamps_icon() {
		let t = Templates::builtin();
		let mut canvas = OwnedImage::new(40, 40, Color::BLACK);
		stamp_group(&mut canvas, &t, 2, 2, UNKNOWN_GROUP, 0);
		assert_eq!(canvas.pixel(2 + 27, 2 + 3), t.icon(UNKNOWN_GROUP, 0).pixel(27, 3));
		assert_eq!(canvas.pixel(2, 2), Color::BLACK);
	}
}

use crate::{OwnedImage, SPRITE_SIZE};

/// Make every pixel of `sprite` that matches the blank slot transparent.
///
/// `slot` is the 34x34 clean slot template. Sprites smaller than 32x32 are
/// aligned to the bottom right of the slot interior. A pixel is cleared when
/// its distance to the template pixel under it is at most `quality`; only its
/// alpha changes.
pub fn clear_background(sprite: &mut OwnedImage, slot: &OwnedImage, quality: u32) {
	let dx = 1 + SPRITE_SIZE.saturating_sub(sprite.width());
	let dy = 1 + SPRITE_SIZE.saturating_sub(sprite.height());

	for y in 0..sprite.height() {
		for x in 0..sprite.width() {
			let (sx, sy) = (x + dx, y + dy);
			if sx >= slot.width() || sy >= slot.height() {
				continue;
			}
			let c = sprite.pixel(x, y);
			if c.diff(slot.pixel(sx, sy)) <= quality {
				sprite.set_pixel(x, y, c.with_alpha(0));
			}
		}
	}
}

/// Like [`clear_background`], leaving `sprite` untouched.
pub fn cleared_background(sprite: &OwnedImage, slot: &OwnedImage, quality: u32) -> OwnedImage {
	let mut out = sprite.clone();
	clear_background(&mut out, slot, quality);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Color, Templates, geometry::crop};

	#[test]
	fn blank_slot_clears_completely() {
		let t = Templates::builtin();
		let sprite = t.slot.as_image().sub_image(1, 1, SPRITE_SIZE, SPRITE_SIZE).to_owned_image();
		let cleared = cleared_background(&sprite, &t.slot, 0);
		assert!(crop(cleared.as_image()).is_none());
		// The copy variant leaves the input alone.
		assert!(!sprite.pixel(5, 5).is_transparent());
	}

	#[test]
	fn item_pixels_survive() {
		let t = Templates::builtin();
		let mut sprite = t.slot.as_image().sub_image(1, 1, SPRITE_SIZE, SPRITE_SIZE).to_owned_image();
		sprite.fill_rect(10, 10, 4, 4, Color::new(200, 180, 20));
		clear_background(&mut sprite, &t.slot, 0);

		let cropped = crop(sprite.as_image()).unwrap();
		assert_eq!((cropped.width(), cropped.height()), (4, 4));
		assert_eq!(sprite.pixel(0, 0).a, 0);
		assert_eq!(sprite.pixel(0, 0).with_alpha(255), t.slot.pixel(1, 1));
	}

	#[test]
	fn quality_tolerates_noise() {
		let t = Templates::builtin();
		let mut sprite = t.slot.as_image().sub_image(1, 1, SPRITE_SIZE, SPRITE_SIZE).to_owned_image();
		let noisy = t.slot.pixel(4, 4);
		sprite.set_pixel(3, 3, Color::new(noisy.r + 1, noisy.g + 1, noisy.b));

		let strict = cleared_background(&sprite, &t.slot, 0);
		assert!(!strict.pixel(3, 3).is_transparent());
		let relaxed = cleared_background(&sprite, &t.slot, 2);
		assert!(relaxed.pixel(3, 3).is_transparent());
	}

	#[test]
	fn small_sprites_align_bottom_right() {
		let t = Templates::builtin();
		let sprite = t.slot.as_image().sub_image(23, 23, 10, 10).to_owned_image();
		let cleared = cleared_background(&sprite, &t.slot, 0);
		assert!(crop(cleared.as_image()).is_none());
	}
}

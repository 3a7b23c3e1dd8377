//! Container screenshot: locate the framed inventory slots.
//!
//! The scan walks the screenshot in reading order looking at every other
//! pixel. A pixel close to the first border pixel triggers a trace of the full
//! 34x34 frame perimeter; enough matching border pixels confirm a slot.

use crate::{Color, Image, OwnedImage, SLOT_SIZE, Templates};

/// Max distance between a pixel and the frame's top-left pixel to start a trace.
const ANCHOR_TOLERANCE: u32 = 5;
/// Mismatched perimeter pixels tolerated per frame (30% of 132).
const TRACE_TOLERANCE: f32 = 132.0 * 0.3;

/// One slot found on a screenshot.
#[derive(Debug, Clone)]
pub struct SlotCandidate {
	/// The 32x32 slot interior, copied from the unmodified screenshot.
	pub image: OwnedImage,
	/// Top-left corner of the 34x34 frame.
	pub x: u32,
	pub y: u32,
}

/// Find every slot frame in `screenshot`, in scan order.
pub fn find_slots(screenshot: Image, templates: &Templates) -> Vec<SlotCandidate> {
	let (w, h) = (screenshot.width(), screenshot.height());
	let mut slots = Vec::new();
	if w < SLOT_SIZE || h < SLOT_SIZE {
		return slots;
	}

	let border = &templates.border;
	let anchor = border.pixel(0, 0);
	// Consumed frames and rejected anchors are painted over on this copy.
	let mut work = screenshot.to_owned_image();

	let (mut x, mut y) = (-1i64, 0i64);
	let mut skip = false;
	loop {
		x += 1;
		if x + SLOT_SIZE as i64 > w as i64 {
			y += 1;
			x = 0;
		}
		if y + SLOT_SIZE as i64 > h as i64 {
			break;
		}
		if skip {
			skip = false;
			continue;
		}
		// Only skip a column the next examined one can look back at.
		skip = x + 2 + SLOT_SIZE as i64 <= w as i64;

		let (mut px, py) = (x as u32, y as u32);
		if work.pixel(px, py).diff(anchor) > ANCHOR_TOLERANCE {
			continue;
		}

		let mut tolerance = TRACE_TOLERANCE;
		if px != 0 && work.pixel(px - 1, py).diff(anchor) <= ANCHOR_TOLERANCE {
			// The skip stepped over the real left edge.
			px -= 1;
			x -= 1;
			work.set_pixel(px + 1, py, Color::WHITE);
			tolerance += 1.0;
		}

		if trace_frame(&work, border, px, py, tolerance) {
			slots.push(SlotCandidate {
				image: screenshot.sub_image(px + 1, py + 1, SLOT_SIZE - 2, SLOT_SIZE - 2).to_owned_image(),
				x: px,
				y: py,
			});
			work.fill_rect(px, py, SLOT_SIZE, SLOT_SIZE, Color::WHITE);
			x += SLOT_SIZE as i64 - 1;
			// The column right after a frame may start the next one.
			skip = false;
		}
	}

	slots
}

fn trace_frame(work: &OwnedImage, border: &OwnedImage, x: u32, y: u32, tolerance: f32) -> bool {
	let last = SLOT_SIZE - 1;
	let mut misses = 0u32;
	for ys in 0..SLOT_SIZE {
		for xs in 0..SLOT_SIZE {
			if xs != 0 && xs != last && ys != 0 && ys != last {
				continue;
			}
			if work.pixel(x + xs, y + ys).diff(border.pixel(xs, ys)) != 0 {
				misses += 1;
				if misses as f32 > tolerance {
					return false;
				}
			}
		}
	}
	true
}

#[cfg(test)]
mod tests {
	use super::*;

	fn screenshot(w: u32, h: u32, slots: &[(u32, u32)], t: &Templates) -> OwnedImage {
		let mut img = OwnedImage::new(w, h, Color::new(0, 0, 0));
		for &(x, y) in slots {
			img.paste(t.slot.as_image(), x, y);
		}
		img
	}

	#[test]
	fn finds_two_slots_in_scan_order() {
		let t = Templates::builtin();
		let img = screenshot(100, 100, &[(10, 10), (50, 10)], &t);
		let slots = find_slots(img.as_image(), &t);
		let coords: Vec<_> = slots.iter().map(|s| (s.x, s.y)).collect();
		assert_eq!(coords, vec![(10, 10), (50, 10)]);
		for s in &slots {
			assert_eq!((s.image.width(), s.image.height()), (32, 32));
			assert!(s.image.as_image().same_pixels(t.slot.as_image().sub_image(1, 1, 32, 32)));
		}
	}

	#[test]
	fn odd_columns_are_found_too() {
		let t = Templates::builtin();
		let img = screenshot(120, 80, &[(3, 5), (41, 40)], &t);
		let coords: Vec<_> = find_slots(img.as_image(), &t).iter().map(|s| (s.x, s.y)).collect();
		assert_eq!(coords, vec![(3, 5), (41, 40)]);
	}

	#[test]
	fn grid_of_adjacent_slots() {
		let t = Templates::builtin();
		let positions: Vec<_> = (0..2).flat_map(|r| (0..3).map(move |c| (c * 34, r * 34))).collect();
		let img = screenshot(102, 68, &positions, &t);
		let coords: Vec<_> = find_slots(img.as_image(), &t).iter().map(|s| (s.x, s.y)).collect();
		assert_eq!(coords, positions);
	}

	#[test]
	fn slots_flush_with_the_right_edge() {
		let t = Templates::builtin();
		// Column 36 is examined; 37 is the last column a frame fits in.
		let img = screenshot(71, 40, &[(37, 3)], &t);
		let coords: Vec<_> = find_slots(img.as_image(), &t).iter().map(|s| (s.x, s.y)).collect();
		assert_eq!(coords, vec![(37, 3)]);

		let img = screenshot(72, 40, &[(0, 0), (38, 6)], &t);
		let coords: Vec<_> = find_slots(img.as_image(), &t).iter().map(|s| (s.x, s.y)).collect();
		assert_eq!(coords, vec![(0, 0), (38, 6)]);
	}

	#[test]
	fn noisy_frame_is_still_a_slot() {
		let t = Templates::builtin();
		let mut img = screenshot(60, 60, &[(8, 8)], &t);
		for i in 1..30 {
			img.set_pixel(8 + i, 8 + 33, Color::new(90, 90, 90));
		}
		assert_eq!(find_slots(img.as_image(), &t).len(), 1);
	}

	#[test]
	fn small_or_plain_images_have_no_slots() {
		let t = Templates::builtin();
		assert!(find_slots(OwnedImage::new(33, 200, Color::BLACK).as_image(), &t).is_empty());
		assert!(find_slots(OwnedImage::new(80, 80, Color::new(21, 21, 21)).as_image(), &t).is_empty());
	}

	#[test]
	fn slot_image_comes_from_the_original() {
		let t = Templates::builtin();
		let mut img = screenshot(40, 40, &[(2, 2)], &t);
		img.set_pixel(5, 5, Color::new(250, 10, 10));
		let slots = find_slots(img.as_image(), &t);
		assert_eq!(slots.len(), 1);
		assert_eq!(slots[0].image.pixel(2, 2), Color::new(250, 10, 10));
	}
}

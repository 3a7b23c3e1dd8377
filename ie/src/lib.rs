mod image;
pub use image::*;
mod pixel;
pub use pixel::*;
mod templates;
pub use templates::*;

pub mod background;
pub mod compare;
pub mod composite;
pub mod digits;
pub mod geometry;
pub mod screen;

/// Image engine entry point: the template set plus the operations that need it.
pub struct Ie {
	templates: Templates,
}

impl Ie {
	pub fn new(templates: Templates) -> Self {
		Self { templates }
	}

	pub fn templates(&self) -> &Templates {
		&self.templates
	}

	pub fn container_find_slots(&self, image: Image) -> Vec<screen::container::SlotCandidate> {
		screen::container::find_slots(image, &self.templates)
	}

	pub fn read_quantity(&self, slot: &mut OwnedImage) -> digits::DigitReading {
		digits::read_quantity(slot, &self.templates.digits)
	}

	pub fn clear_background(&self, sprite: &mut OwnedImage, quality: u32) {
		background::clear_background(sprite, &self.templates.slot, quality)
	}

	/// Background-cleared copy of `sprite`.
	pub fn cleared_background(&self, sprite: &OwnedImage, quality: u32) -> OwnedImage {
		background::cleared_background(sprite, &self.templates.slot, quality)
	}

	pub fn draw_match(&self, canvas: &mut OwnedImage, x: u32, y: u32, frame: Image, quantity: Option<&OwnedImage>) {
		composite::draw_match(canvas, &self.templates, x, y, frame, quantity)
	}

	pub fn stamp_group(&self, canvas: &mut OwnedImage, x: u32, y: u32, group: &str, value: u32) {
		composite::stamp_group(canvas, &self.templates, x, y, group, value)
	}
}

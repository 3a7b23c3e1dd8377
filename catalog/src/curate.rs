//! Manual catalog maintenance.

use anyhow::{Result, ensure};
use ie::{Color, OwnedImage, SPRITE_SIZE};

use crate::{FingerprintStore, ItemFingerprint};

/// Records of one item and their frames side by side.
#[derive(Debug, Clone)]
pub struct Shown {
	pub items: Vec<ItemFingerprint>,
	/// `33 * n - 1` by 32, white, one frame every 33 pixels.
	pub sheet: OwnedImage,
}

/// Add a brand new item. `None` when the name is already taken.
pub fn new_item(store: &dyn FingerprintStore, name: &str, group: &str, value: u32, frame: &OwnedImage) -> Result<Option<Shown>> {
	check_frame(frame)?;
	if !store.find(name)?.is_empty() {
		return Ok(None);
	}

	store.insert(ItemFingerprint::from_frame(name, group, value, 0, frame)?)?;
	log::info!("Added item {name} ({group}, {value})");
	show(store, name)
}

/// Add another frame to an existing item. `None` when there is no such item.
pub fn add_frame(store: &dyn FingerprintStore, name: &str, frame: &OwnedImage) -> Result<Option<Shown>> {
	check_frame(frame)?;
	let existing = store.find(name)?;
	let Some(first) = existing.first() else {
		return Ok(None);
	};

	let fp = ItemFingerprint::from_frame(first.name.clone(), first.group.clone(), first.value, first.priority, frame)?;
	store.insert(fp)?;
	log::info!("Added frame {} to {}", existing.len() + 1, first.name);
	show(store, name)
}

/// Delete every frame of the items matching `pattern`, returning the name removed.
pub fn remove(store: &dyn FingerprintStore, pattern: &str) -> Result<Option<String>> {
	let removed = store.delete(pattern)?;
	if let Some(name) = &removed {
		log::info!("Removed item {name}");
	}
	Ok(removed)
}

pub fn show(store: &dyn FingerprintStore, pattern: &str) -> Result<Option<Shown>> {
	let items = store.find(pattern)?;
	if items.is_empty() {
		return Ok(None);
	}
	let sheet = contact_sheet(&items)?;
	Ok(Some(Shown { items, sheet }))
}

/// Closest known item name, for "did you mean" hints.
pub fn closest_name(store: &dyn FingerprintStore, name: &str) -> Result<Option<String>> {
	let lower = name.to_lowercase();
	let best = store
		.names()?
		.into_iter()
		.map(|v| (levenshtein::levenshtein(&lower, &v.to_lowercase()), v))
		.min_by_key(|(d, _)| *d);

	Ok(best.filter(|(d, v)| *d <= (v.len().max(name.len()) / 2).max(3)).map(|(_, v)| v))
}

pub fn contact_sheet(items: &[ItemFingerprint]) -> Result<OwnedImage> {
	let n = items.len() as u32;
	let mut sheet = OwnedImage::new((SPRITE_SIZE + 1) * n.max(1) - 1, SPRITE_SIZE, Color::WHITE);
	for (i, item) in items.iter().enumerate() {
		let frame = item.decode_frame()?;
		sheet.paste(frame.as_image(), i as u32 * (SPRITE_SIZE + 1), 0);
	}
	Ok(sheet)
}

fn check_frame(frame: &OwnedImage) -> Result<()> {
	ensure!(
		frame.width() == SPRITE_SIZE && frame.height() == SPRITE_SIZE,
		"Frame must be {SPRITE_SIZE}x{SPRITE_SIZE}, got {}x{}",
		frame.width(),
		frame.height()
	);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::JsonStore;

	fn frame(color: Color) -> OwnedImage {
		let mut f = OwnedImage::new(32, 32, Color::TRANSPARENT);
		f.fill_rect(4, 4, 20, 20, color);
		f
	}

	#[test]
	fn new_refuses_duplicates() {
		let store = JsonStore::in_memory();
		let shown = new_item(&store, "Ruby", "Jewels", 250, &frame(Color::new(200, 0, 0))).unwrap().unwrap();
		assert_eq!(shown.items.len(), 1);
		assert_eq!(shown.items[0].priority, 0);
		assert_eq!((shown.sheet.width(), shown.sheet.height()), (32, 32));

		assert!(new_item(&store, "ruby", "Jewels", 1, &frame(Color::new(1, 0, 0))).unwrap().is_none());
	}

	#[test]
	fn frames_must_be_slot_sized() {
		let store = JsonStore::in_memory();
		let small = OwnedImage::new(16, 16, Color::new(200, 0, 0));
		assert!(new_item(&store, "Ruby", "Jewels", 250, &small).is_err());
	}

	#[test]
	fn add_copies_item_fields() {
		let store = JsonStore::in_memory();
		assert!(add_frame(&store, "Ruby", &frame(Color::new(200, 0, 0))).unwrap().is_none());

		new_item(&store, "Ruby", "Jewels", 250, &frame(Color::new(200, 0, 0))).unwrap();
		store.increment_priority("Ruby", 12).unwrap();
		let shown = add_frame(&store, "ruby", &frame(Color::new(180, 10, 0))).unwrap().unwrap();

		assert_eq!(shown.items.len(), 2);
		let added = &shown.items[1];
		assert_eq!((added.name.as_str(), added.group.as_str(), added.value, added.priority), ("Ruby", "Jewels", 250, 12));

		// Two frames, one white gap column.
		assert_eq!(shown.sheet.width(), 65);
		assert_eq!(shown.sheet.pixel(32, 10), Color::WHITE);
		assert_eq!(shown.sheet.pixel(33 + 5, 5), Color::new(180, 10, 0));
	}

	#[test]
	fn remove_and_suggest() {
		let store = JsonStore::in_memory();
		new_item(&store, "Ruby", "Jewels", 250, &frame(Color::new(200, 0, 0))).unwrap();
		new_item(&store, "Small Ruby", "Jewels", 250, &frame(Color::new(210, 0, 0))).unwrap();

		assert_eq!(closest_name(&store, "rubi").unwrap().as_deref(), Some("Ruby"));
		assert_eq!(closest_name(&store, "Platinum Coin").unwrap(), None);

		assert_eq!(remove(&store, "small%").unwrap().as_deref(), Some("Small Ruby"));
		assert!(show(&store, "Small Ruby").unwrap().is_none());
		assert_eq!(remove(&store, "Emerald").unwrap(), None);
	}
}

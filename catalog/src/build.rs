//! Offline catalog build from a game item database export.
//!
//! Every source item gets a value and a group (which NPC buys it) and one
//! fingerprint per animation frame.

use std::path::Path;

use anyhow::{Context, Result};
use ie::{Color, NO_VALUE_GROUP, OwnedImage};

use crate::{FingerprintStore, ItemFingerprint};

/// Channel value under which a pixel counts as a black frame line.
const BLACK_LIMIT: u8 = 55;

/// NPC buyers whose customers get their own group. The first known buyer wins.
const BUYER_GROUPS: &[(&str, &str)] = &[
	("Alesar", "Green Djinn"),
	("Yaman", "Green Djinn"),
	("Nah'Bob", "Blue Djinn"),
	("Haroun", "Blue Djinn"),
	("Rashid", "Rashid"),
	("Yasir", "Yasir"),
	("Gnomission", "Gnomission"),
	("Jessica", "Jewels"),
	("Tamoril", "Tamoril"),
	("Alaistar", "Oramond"),
	("Flint", "Oramond"),
];

/// Item types that keep their own group name.
const TYPE_GROUPS: &[&str] = &["Creature Products", "Containers"];

/// Coins are not sold to NPCs; the bank takes them at face value.
const COINS: &[(&str, u32)] = &[("Gold Coin", 1), ("Platinum Coin", 100), ("Crystal Coin", 10000)];

/// One item as exported by the item database.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SourceItem {
	pub title: String,
	#[serde(default)]
	pub item_type: String,
	#[serde(default)]
	pub value: Option<u32>,
	#[serde(default)]
	pub buyers: Vec<String>,
	/// PNG frame paths, relative to the manifest.
	#[serde(default)]
	pub frames: Vec<String>,
}

/// Value and group of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
	pub value: u32,
	pub group: String,
}

pub fn classify(item: &SourceItem) -> Classification {
	let (value, buyers) = match COINS.iter().find(|(name, _)| *name == item.title) {
		Some((_, value)) => (Some(*value), vec!["Bank".to_string()]),
		None => (item.value, item.buyers.clone()),
	};

	let (value, mut group) = match value {
		Some(value) if !buyers.is_empty() => {
			let group = if TYPE_GROUPS.contains(&item.item_type.as_str()) {
				item.item_type.clone()
			} else {
				"Valuables".to_string()
			};
			(value, group)
		}
		_ => (0, NO_VALUE_GROUP.to_string()),
	};

	if let Some((_, g)) = buyers.iter().find_map(|b| BUYER_GROUPS.iter().find(|(npc, _)| npc == b)) {
		group = g.to_string();
	}

	Classification { value, group }
}

/// Make rows and columns made only of near-black pixels transparent.
pub fn clear_black_lines(frame: &mut OwnedImage) {
	let (w, h) = (frame.width(), frame.height());
	let is_black = |c: Color| c.r < BLACK_LIMIT && c.g < BLACK_LIMIT && c.b < BLACK_LIMIT;
	let clear = Color::rgba(0, 0, 0, 0);

	for y in 0..h {
		if (0..w).all(|x| is_black(frame.pixel(x, y))) {
			frame.fill_rect(0, y, w, 1, clear);
		}
	}
	for x in 0..w {
		if (0..h).all(|y| is_black(frame.pixel(x, y))) {
			frame.fill_rect(x, 0, 1, h, clear);
		}
	}
}

/// Source item with its frames decoded.
#[derive(Debug, Clone)]
pub struct LoadedItem {
	pub item: SourceItem,
	pub frames: Vec<OwnedImage>,
}

/// Read an import manifest: a JSON list of [`SourceItem`].
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<LoadedItem>> {
	let path = path.as_ref();
	let text = std::fs::read_to_string(path).with_context(|| format!("Read manifest {}", path.display()))?;
	let items: Vec<SourceItem> = serde_json::from_str(&text).with_context(|| format!("Parse manifest {}", path.display()))?;
	let base = path.parent().unwrap_or_else(|| Path::new("."));

	items
		.into_iter()
		.map(|item| {
			let frames = item
				.frames
				.iter()
				.map(|f| OwnedImage::open(base.join(f)))
				.collect::<Result<Vec<_>>>()
				.with_context(|| format!("Load frames of {}", item.title))?;
			Ok(LoadedItem { item, frames })
		})
		.collect()
}

/// Fingerprint every item not yet in the store and not in `skip`.
///
/// Frames without visible pixels (after removing black lines) are dropped.
/// Returns the number of new items.
pub fn update_catalog(store: &dyn FingerprintStore, items: &[LoadedItem], skip: &[&str]) -> Result<usize> {
	let mut added = 0;
	for loaded in items {
		let title = loaded.item.title.as_str();
		if skip.contains(&title) || !store.find(title)?.is_empty() {
			continue;
		}

		let class = classify(&loaded.item);
		let mut frames = 0;
		for frame in &loaded.frames {
			let mut frame = frame.clone();
			clear_black_lines(&mut frame);
			if ie::geometry::crop(frame.as_image()).is_none() {
				continue;
			}
			store.insert(ItemFingerprint::from_frame(title, &class.group, class.value, 0, &frame)?)?;
			frames += 1;
		}

		log::info!("Created item {title} ({}, {}) with {frames} frames", class.group, class.value);
		added += 1;
	}
	Ok(added)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::JsonStore;

	fn item(title: &str, item_type: &str, value: Option<u32>, buyers: &[&str]) -> SourceItem {
		SourceItem {
			title: title.into(),
			item_type: item_type.into(),
			value,
			buyers: buyers.iter().map(|b| b.to_string()).collect(),
			frames: Vec::new(),
		}
	}

	fn class(value: u32, group: &str) -> Classification {
		Classification {
			value,
			group: group.into(),
		}
	}

	#[test]
	fn coins_go_to_the_bank() {
		assert_eq!(classify(&item("Platinum Coin", "Valuables", None, &[])), class(100, "Valuables"));
		assert_eq!(classify(&item("Gold Coin", "Other", Some(5), &[])), class(1, "Valuables"));
	}

	#[test]
	fn no_value_without_price_or_buyer() {
		assert_eq!(classify(&item("Rope", "Tools", None, &["Rashid"])), class(0, "Rashid"));
		assert_eq!(classify(&item("Stone", "Other", Some(10), &[])), class(0, NO_VALUE_GROUP));
	}

	#[test]
	fn type_and_buyer_groups() {
		assert_eq!(classify(&item("Wolf Paw", "Creature Products", Some(70), &["Someone"])), class(70, "Creature Products"));
		assert_eq!(classify(&item("Sword", "Weapons", Some(25), &["Someone"])), class(25, "Valuables"));
		assert_eq!(classify(&item("Fire Axe", "Weapons", Some(8000), &["Someone", "Haroun", "Alesar"])), class(8000, "Blue Djinn"));
		assert_eq!(classify(&item("Ruby", "Valuables", Some(250), &["Jessica"])), class(250, "Jewels"));
		assert_eq!(classify(&item("Glooth", "Valuables", Some(5), &["Flint"])), class(5, "Oramond"));
	}

	#[test]
	fn black_lines_are_cleared() {
		let mut frame = OwnedImage::new(6, 6, Color::new(10, 10, 10));
		frame.fill_rect(2, 2, 2, 2, Color::new(200, 100, 0));
		frame.set_pixel(4, 4, Color::new(200, 100, 0));
		clear_black_lines(&mut frame);
		assert!(frame.pixel(0, 0).is_transparent());
		assert!(frame.pixel(0, 2).is_transparent());
		assert!(frame.pixel(2, 0).is_transparent());
		// Dark pixels on a line with content stay.
		assert!(!frame.pixel(4, 2).is_transparent());
		assert!(!frame.pixel(2, 2).is_transparent());
	}

	#[test]
	fn update_adds_new_items_once() {
		let store = JsonStore::in_memory();
		let mut coin = OwnedImage::new(32, 32, Color::TRANSPARENT);
		coin.fill_rect(10, 10, 8, 8, Color::new(250, 220, 0));
		let blank = OwnedImage::new(32, 32, Color::BLACK);

		let items = vec![
			LoadedItem {
				item: item("Gold Coin", "Valuables", None, &[]),
				frames: vec![coin.clone(), blank],
			},
			LoadedItem {
				item: item("Bag (Ahmet)", "Quest Items", None, &[]),
				frames: vec![coin.clone()],
			},
		];

		assert_eq!(update_catalog(&store, &items, &["Bag (Ahmet)"]).unwrap(), 1);
		let coins = store.find("Gold Coin").unwrap();
		assert_eq!(coins.len(), 1);
		assert_eq!((coins[0].value, coins[0].size_x), (1, 8));
		assert_eq!(update_catalog(&store, &items, &[]).unwrap(), 1);
		assert_eq!(update_catalog(&store, &items, &[]).unwrap(), 0);
	}

	#[test]
	fn manifest_paths_are_relative() {
		let dir = tempfile::tempdir().unwrap();
		let mut frame = OwnedImage::new(32, 32, Color::TRANSPARENT);
		frame.fill_rect(3, 3, 5, 5, Color::new(0, 200, 0));
		frame.as_image().save_png(dir.path().join("emerald.png")).unwrap();
		let manifest = dir.path().join("items.json");
		std::fs::write(
			&manifest,
			r#"[{"title": "Emerald", "item_type": "Valuables", "value": 250, "buyers": ["Jessica"], "frames": ["emerald.png"]}]"#,
		)
		.unwrap();

		let loaded = load_manifest(&manifest).unwrap();
		assert_eq!(loaded.len(), 1);
		assert_eq!(loaded[0].frames[0], frame);
		assert_eq!(classify(&loaded[0].item), class(250, "Jewels"));
	}
}

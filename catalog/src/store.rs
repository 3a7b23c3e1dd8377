use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::{Path, PathBuf},
	sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result, anyhow};

use crate::{FingerprintStore, ItemFingerprint, NamePattern, Query};

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct CatalogFile {
	next_id: u64,
	items: Vec<ItemFingerprint>,
}

#[derive(Debug, Default)]
struct State {
	catalog: CatalogFile,
	/// Priority updates not yet written to disk.
	dirty: bool,
}

/// Fingerprint store kept in memory and persisted as one JSON file.
///
/// Inserts and deletes are written through right away. Priority increments
/// only touch memory until [`FingerprintStore::flush`].
#[derive(Debug)]
pub struct JsonStore {
	path: Option<PathBuf>,
	state: Mutex<State>,
}

impl JsonStore {
	/// Open the catalog at `path`; a missing file is an empty catalog.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		let path = path.into();
		let catalog = if path.exists() {
			let file = File::open(&path).with_context(|| format!("Open catalog {}", path.display()))?;
			serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Parse catalog {}", path.display()))?
		} else {
			log::info!("No catalog at {}, starting empty", path.display());
			CatalogFile::default()
		};

		Ok(Self {
			path: Some(path),
			state: Mutex::new(State { catalog, dirty: false }),
		})
	}

	/// Store that never touches the disk.
	pub fn in_memory() -> Self {
		Self {
			path: None,
			state: Mutex::new(State::default()),
		}
	}

	pub fn len(&self) -> usize {
		self.state().map(|s| s.catalog.items.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn state(&self) -> Result<MutexGuard<'_, State>> {
		self.state.lock().map_err(|_| anyhow!("Catalog lock poisoned"))
	}

	fn persist(&self, state: &mut State) -> Result<()> {
		if let Some(path) = &self.path {
			save(path, &state.catalog)?;
		}
		state.dirty = false;
		Ok(())
	}

	fn bump(&self, delta: i64, select: impl Fn(&ItemFingerprint) -> bool) -> Result<()> {
		let mut state = self.state()?;
		let mut touched = false;
		for item in state.catalog.items.iter_mut().filter(|v| select(v)) {
			item.priority = item.priority.saturating_add(delta);
			touched = true;
		}
		state.dirty |= touched;
		Ok(())
	}
}

impl FingerprintStore for JsonStore {
	fn query(&self, query: &Query) -> Result<Vec<ItemFingerprint>> {
		let state = self.state()?;
		Ok(state.catalog.items.iter().filter(|v| v.matches(query)).cloned().collect())
	}

	fn increment_priority(&self, name: &str, delta: i64) -> Result<()> {
		self.bump(delta, |v| v.name == name)
	}

	fn increment_group_priority(&self, group: &str, delta: i64) -> Result<()> {
		self.bump(delta, |v| v.group == group)
	}

	fn insert(&self, mut fingerprint: ItemFingerprint) -> Result<u64> {
		let mut state = self.state()?;
		state.catalog.next_id += 1;
		fingerprint.id = state.catalog.next_id;
		let id = fingerprint.id;
		state.catalog.items.push(fingerprint);
		self.persist(&mut state)?;
		Ok(id)
	}

	fn delete(&self, pattern: &str) -> Result<Option<String>> {
		let pattern = NamePattern::new(pattern)?;
		let mut state = self.state()?;
		let Some(first) = state.catalog.items.iter().find(|v| pattern.matches(&v.name)).map(|v| v.name.clone()) else {
			return Ok(None);
		};
		state.catalog.items.retain(|v| !pattern.matches(&v.name));
		self.persist(&mut state)?;
		Ok(Some(first))
	}

	fn find(&self, pattern: &str) -> Result<Vec<ItemFingerprint>> {
		let pattern = NamePattern::new(pattern)?;
		let state = self.state()?;
		Ok(state.catalog.items.iter().filter(|v| pattern.matches(&v.name)).cloned().collect())
	}

	fn names(&self) -> Result<Vec<String>> {
		let state = self.state()?;
		let mut names: Vec<String> = Vec::new();
		for item in &state.catalog.items {
			if !names.contains(&item.name) {
				names.push(item.name.clone());
			}
		}
		Ok(names)
	}

	fn flush(&self) -> Result<()> {
		let mut state = self.state()?;
		if state.dirty {
			self.persist(&mut state)?;
		}
		Ok(())
	}
}

fn save(path: &Path, catalog: &CatalogFile) -> Result<()> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).with_context(|| format!("Create catalog dir {}", parent.display()))?;
	}

	let tmp = path.with_extension("json.tmp");
	let file = File::create(&tmp).with_context(|| format!("Write catalog temp {}", tmp.display()))?;
	let mut writer = BufWriter::new(file);
	serde_json::to_writer(&mut writer, catalog).context("Serialize catalog")?;
	writer.flush().context("Flush catalog")?;
	drop(writer);

	// Replace existing file (Windows-friendly).
	if std::fs::rename(&tmp, path).is_err() {
		let _ = std::fs::remove_file(path);
		std::fs::rename(&tmp, path).with_context(|| format!("Persist catalog {}", path.display()))?;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use ie::{Color, OwnedImage};

	fn fingerprint(name: &str, group: &str, color: Color) -> ItemFingerprint {
		let mut frame = OwnedImage::new(32, 32, Color::TRANSPARENT);
		frame.fill_rect(8, 8, 12, 12, color);
		ItemFingerprint::from_frame(name, group, 5, 0, &frame).unwrap()
	}

	#[test]
	fn ids_are_assigned_in_order() {
		let store = JsonStore::in_memory();
		let a = store.insert(fingerprint("Ruby", "Jewels", Color::new(200, 0, 0))).unwrap();
		let b = store.insert(fingerprint("Sapphire", "Jewels", Color::new(0, 0, 200))).unwrap();
		assert_eq!((a, b), (1, 2));
		assert_eq!(store.find("sapphire").unwrap()[0].id, 2);
	}

	#[test]
	fn query_filters_by_geometry_and_color() {
		let store = JsonStore::in_memory();
		let ruby = fingerprint("Ruby", "Jewels", Color::new(200, 0, 0));
		store.insert(ruby.clone()).unwrap();
		store.insert(fingerprint("Sapphire", "Jewels", Color::new(0, 0, 200))).unwrap();

		let q = Query {
			size_x: 12,
			size_y: 12,
			size: 144,
			signature: ruby.signature,
			quality: 0,
		};
		let found = store.query(&q).unwrap();
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].name, "Ruby");
	}

	#[test]
	fn increments_and_delete() {
		let store = JsonStore::in_memory();
		store.insert(fingerprint("Ruby", "Jewels", Color::new(200, 0, 0))).unwrap();
		store.insert(fingerprint("Ruby", "Jewels", Color::new(190, 0, 0))).unwrap();
		store.insert(fingerprint("Sapphire", "Jewels", Color::new(0, 0, 200))).unwrap();

		store.increment_priority("Ruby", 400).unwrap();
		store.increment_group_priority("Jewels", 1).unwrap();
		let rubies = store.find("Ruby").unwrap();
		assert!(rubies.iter().all(|v| v.priority == 401));
		assert_eq!(store.find("Sapphire").unwrap()[0].priority, 1);
		assert_eq!(store.names().unwrap(), vec!["Ruby", "Sapphire"]);

		assert_eq!(store.delete("rub%").unwrap().as_deref(), Some("Ruby"));
		assert_eq!(store.delete("Ruby").unwrap(), None);
		assert_eq!(store.len(), 1);
	}

	#[test]
	fn file_round_trip_and_flush() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("catalog.json");

		let store = JsonStore::open(&path).unwrap();
		assert!(store.is_empty());
		store.insert(fingerprint("Ruby", "Jewels", Color::new(200, 0, 0))).unwrap();
		store.increment_priority("Ruby", 400).unwrap();
		assert_eq!(JsonStore::open(&path).unwrap().find("Ruby").unwrap()[0].priority, 0);

		store.flush().unwrap();
		let reopened = JsonStore::open(&path).unwrap();
		assert_eq!(reopened.find("Ruby").unwrap()[0].priority, 400);

		// Ids keep counting after a reload.
		let id = reopened.insert(fingerprint("Sapphire", "Jewels", Color::new(0, 0, 200))).unwrap();
		assert_eq!(id, 2);
	}
}

//! Artifacts of unresolved slots, kept for catalog curation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ie::OwnedImage;

/// One slot the matcher could not resolve.
#[derive(Debug, Clone, Copy)]
pub struct UnresolvedSlot<'a> {
	pub session_id: &'a str,
	pub screenshot: &'a OwnedImage,
	/// Zero based, in scan order.
	pub index: usize,
	/// Slot interior as found on the screenshot.
	pub slot: &'a OwnedImage,
	/// Slot interior with the background removed.
	pub clean: &'a OwnedImage,
}

pub trait DebugArchive: Send + Sync {
	fn archive(&self, slot: UnresolvedSlot) -> Result<()>;
}

/// Keeps nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArchive;

impl DebugArchive for NoArchive {
	fn archive(&self, _slot: UnresolvedSlot) -> Result<()> {
		Ok(())
	}
}

/// Writes `<root>/<session>/screenshot.png`, `slot_<n>.png` and `slot_<n>_clean.png`.
#[derive(Debug, Clone)]
pub struct DirArchive {
	root: PathBuf,
}

impl DirArchive {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

impl DebugArchive for DirArchive {
	fn archive(&self, slot: UnresolvedSlot) -> Result<()> {
		let dir = self.root.join(slot.session_id);
		std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

		let screenshot = dir.join("screenshot.png");
		if !screenshot.exists() {
			slot.screenshot.as_image().save_png(&screenshot)?;
		}
		let n = slot.index + 1;
		slot.slot.as_image().save_png(dir.join(format!("slot_{n}.png")))?;
		slot.clean.as_image().save_png(dir.join(format!("slot_{n}_clean.png")))?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ie::Color;

	#[test]
	fn writes_slot_files() {
		let dir = tempfile::tempdir().unwrap();
		let archive = DirArchive::new(dir.path());
		let screenshot = OwnedImage::new(40, 40, Color::BLACK);
		let slot = OwnedImage::new(32, 32, Color::new(1, 2, 3));

		for index in [0, 4] {
			archive
				.archive(UnresolvedSlot {
					session_id: "42-loot",
					screenshot: &screenshot,
					index,
					slot: &slot,
					clean: &slot,
				})
				.unwrap();
		}

		let session = dir.path().join("42-loot");
		assert!(session.join("screenshot.png").is_file());
		assert!(session.join("slot_1.png").is_file());
		assert!(session.join("slot_5_clean.png").is_file());
		assert_eq!(OwnedImage::open(session.join("slot_5.png")).unwrap(), slot);
	}
}

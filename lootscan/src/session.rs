//! Per-screenshot learning: sprites seen earlier in the same image.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use catalog::{FingerprintStore, ItemFingerprint, Query};
use ie::{Image, OwnedImage, UNKNOWN_GROUP, geometry};

use crate::matcher::{Candidate, CandidateOrigin, rank};

/// Priority of unknown records.
pub const UNKNOWN_PRIORITY: i64 = 10_000_000;

/// State of one scan. Dropped with the scan, nothing here is persisted.
#[derive(Debug, Default)]
pub struct ScanSession {
	pub id: String,
	unknown_items: Vec<Candidate>,
	lq_items: Vec<Candidate>,
	groups: HashMap<String, i64>,
	/// Decoded catalog frames by fingerprint id: (uncropped, cropped).
	frames: HashMap<u64, (Arc<OwnedImage>, Option<Arc<OwnedImage>>)>,
	store_queries: usize,
	low_quality_matches: u32,
}

impl ScanSession {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			..Default::default()
		}
	}

	pub fn groups(&self) -> &HashMap<String, i64> {
		&self.groups
	}

	pub fn add_group_score(&mut self, group: &str, delta: i64) {
		*self.groups.entry(group.to_string()).or_default() += delta;
	}

	/// Number of catalog lookups this scan made.
	pub fn store_queries(&self) -> usize {
		self.store_queries
	}

	/// Session records with about the same box as `sprite`, ranked.
	///
	/// Low quality records only take part at quality 0.
	pub fn session_candidates(&self, sprite: Image, quality: u32) -> Vec<Candidate> {
		let (w, h) = (sprite.width(), sprite.height());
		let lq = self.lq_items.iter().filter(|_| quality == 0);
		let mut out: Vec<Candidate> = lq
			.chain(self.unknown_items.iter())
			.filter(|c| c.fingerprint.fits_box(w, h))
			.cloned()
			.collect();
		rank(&mut out, &self.groups);
		out
	}

	/// Catalog records passing the coarse filter for `sprite`, ranked.
	pub fn catalog_candidates(&mut self, store: &dyn FingerprintStore, sprite: Image, quality: u32) -> Result<Vec<Candidate>> {
		self.store_queries += 1;
		let found = store.query(&Query::for_sprite(sprite, quality))?;

		let mut out = Vec::with_capacity(found.len());
		for fingerprint in found {
			let (frame, cropped) = match self.frames.get(&fingerprint.id) {
				Some(v) => v.clone(),
				None => {
					let decoded = match fingerprint.decode_frame() {
						Ok(v) => v,
						Err(err) => {
							tracing::warn!(error = %err, id = fingerprint.id, "skipping undecodable catalog frame");
							continue;
						}
					};
					let cropped = geometry::crop(decoded.as_image()).map(|v| Arc::new(v.to_owned_image()));
					let entry = (Arc::new(decoded), cropped);
					self.frames.insert(fingerprint.id, entry.clone());
					entry
				}
			};
			let Some(sprite) = cropped else {
				continue;
			};

			out.push(Candidate {
				fingerprint,
				sprite,
				frame: Some(frame),
				origin: CandidateOrigin::Catalog,
			});
		}

		rank(&mut out, &self.groups);
		Ok(out)
	}

	/// Remember a sprite nothing matched. `sprite` is the cropped slot, cleared at quality 0.
	pub fn add_unknown(&mut self, sprite: Image) -> Candidate {
		let fingerprint = ItemFingerprint {
			id: 0,
			name: UNKNOWN_GROUP.to_string(),
			group: UNKNOWN_GROUP.to_string(),
			priority: UNKNOWN_PRIORITY,
			value: 0,
			frame: Vec::new(),
			size_x: sprite.width(),
			size_y: sprite.height(),
			size: geometry::footprint_size(sprite),
			signature: geometry::color_signature(sprite),
		};
		let record = Candidate {
			fingerprint,
			sprite: Arc::new(sprite.to_owned_image()),
			frame: None,
			origin: CandidateOrigin::SessionUnknown,
		};
		self.unknown_items.push(record.clone());
		record
	}

	/// Remember an item only matched at relaxed quality, keyed on how the slot
	/// looks at quality 0. Returns how many such items this scan has seen.
	pub fn add_low_quality(&mut self, matched: &Candidate, sprite: Image) -> u32 {
		let mut record = matched.clone();
		record.fingerprint.size_x = sprite.width();
		record.fingerprint.size_y = sprite.height();
		record.sprite = Arc::new(sprite.to_owned_image());
		record.origin = CandidateOrigin::SessionLowQuality;
		self.lq_items.push(record);

		self.low_quality_matches += 1;
		self.low_quality_matches
	}
}

//! Scan orchestration: one screenshot in, one [`LootReport`] out.
//!
//! Every slot is read, cleared and matched with a tolerance that grows each
//! pass until something matches or the quality cap is reached. Slots are
//! processed one after another so later slots can reuse what earlier ones
//! learned.

use std::sync::Arc;

use catalog::FingerprintStore;
use ie::{Ie, OwnedImage, UNKNOWN_GROUP, geometry::crop, screen::container::SlotCandidate};

use crate::{
	ScanError,
	archive::{DebugArchive, UnresolvedSlot},
	matcher::{self, Candidate, CandidateOrigin},
	metadata::ItemMetadata,
	progress::{ProgressGate, ProgressSink},
	report::{LootReport, Tally, TallyEntry},
	session::ScanSession,
};

/// Sent once per scan after too many relaxed matches.
pub const LOW_QUALITY_WARNING: &str = "WARNING: You seem to be using a low quality image, or a screenshot taken using the \
	software renderer. Some items may not be recognized correctly, and overall scanning speed will be slower!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
	/// Matching stops once quality reaches this.
	pub max_quality: u32,
	/// Minimum progress increment, in percent.
	pub progress_step: u8,
	pub low_quality_warning_after: u32,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			max_quality: 30,
			progress_step: 5,
			low_quality_warning_after: 5,
		}
	}
}

/// Next quality of the escalation loop: 0, 2, 4, 6, 9, 13, 19, 28, ...
pub fn next_quality(quality: u32) -> u32 {
	quality + (quality / 2).max(2)
}

/// How one slot was resolved.
#[derive(Debug, Clone)]
pub enum SlotOutcome {
	Empty,
	/// `quality` is the pass that matched.
	Matched { candidate: Candidate, quality: u32 },
	Unknown,
}

pub struct Engine {
	ie: Arc<Ie>,
	store: Arc<dyn FingerprintStore>,
	metadata: Arc<dyn ItemMetadata>,
	archive: Arc<dyn DebugArchive>,
	options: ScanOptions,
}

impl Engine {
	pub fn new(
		ie: Arc<Ie>,
		store: Arc<dyn FingerprintStore>,
		metadata: Arc<dyn ItemMetadata>,
		archive: Arc<dyn DebugArchive>,
		options: ScanOptions,
	) -> Self {
		Self {
			ie,
			store,
			metadata,
			archive,
			options,
		}
	}

	pub fn store(&self) -> &Arc<dyn FingerprintStore> {
		&self.store
	}

	/// Scan `screenshot`. `session_id` names the debug archive folder.
	pub fn scan(&self, session_id: &str, screenshot: &OwnedImage, progress: &dyn ProgressSink) -> Result<LootReport, ScanError> {
		let slots = self.ie.container_find_slots(screenshot.as_image());
		if slots.is_empty() {
			return Err(ScanError::NoSlotsFound);
		}
		tracing::debug!(session = session_id, slots = slots.len(), "found slots");
		send_progress(progress, 0, "Scanning items");

		let mut session = ScanSession::new(session_id);
		let mut tally = Tally::new();
		let mut canvas = screenshot.clone();
		let mut gate = ProgressGate::new(self.options.progress_step);
		let mut warned = false;

		for (index, slot) in slots.iter().enumerate() {
			self.scan_slot(&mut session, screenshot, &mut canvas, &mut tally, index, slot, progress, &mut warned)?;

			// 100 is reserved for the completion message below.
			if let Some(percent) = gate.advance(index + 1, slots.len())
				&& percent < 100
			{
				send_progress(progress, percent, &format!("Scanning items ({}/{})", index + 1, slots.len()));
			}
		}
		send_progress(progress, 100, "Complete!");

		let mut report = LootReport::aggregate(tally, self.metadata.as_ref());
		report.overlay = Some(canvas);
		tracing::info!(
			session = session_id,
			slots = slots.len(),
			items = report.items.len(),
			unknown = report.unknown_count,
			total = report.total_value,
			store_queries = session.store_queries(),
			"scan complete"
		);
		Ok(report)
	}

	/// Match one slot sprite, escalating quality. `slot` must already be digit-read.
	pub fn resolve(&self, session: &mut ScanSession, slot: &OwnedImage) -> Result<SlotOutcome, ScanError> {
		let mut quality = 0;
		while quality < self.options.max_quality {
			let cleared = self.ie.cleared_background(slot, quality);
			let Some(sprite) = crop(cleared.as_image()) else {
				return Ok(SlotOutcome::Empty);
			};

			let session_candidates = session.session_candidates(sprite, quality);
			if let Some(candidate) = matcher::find_match(sprite, &session_candidates, quality) {
				return Ok(SlotOutcome::Matched { candidate, quality });
			}

			let candidates = session
				.catalog_candidates(self.store.as_ref(), sprite, quality)
				.map_err(ScanError::StoreUnavailable)?;
			if let Some(candidate) = matcher::find_match(sprite, &candidates, quality) {
				return Ok(SlotOutcome::Matched { candidate, quality });
			}

			quality = next_quality(quality);
		}
		Ok(SlotOutcome::Unknown)
	}

	#[allow(clippy::too_many_arguments)]
	fn scan_slot(
		&self,
		session: &mut ScanSession,
		screenshot: &OwnedImage,
		canvas: &mut OwnedImage,
		tally: &mut Tally,
		index: usize,
		found: &SlotCandidate,
		progress: &dyn ProgressSink,
		warned: &mut bool,
	) -> Result<(), ScanError> {
		let mut slot = found.image.clone();
		let digits = self.ie.read_quantity(&mut slot);
		let mut quantity = digits.quantity;

		// The slot as it looks with only exact background removed.
		let qz_item = self.ie.cleared_background(&slot, 0);
		let qz_crop = crop(qz_item.as_image());

		let candidate = match (self.resolve(session, &slot)?, qz_crop) {
			(SlotOutcome::Empty, _) | (_, None) => {
				tracing::debug!(index, x = found.x, y = found.y, "empty slot");
				return Ok(());
			}
			(SlotOutcome::Matched { candidate, quality }, Some(qz_crop)) => {
				tracing::debug!(index, name = %candidate.fingerprint.name, quality, "matched slot");
				if quality > 0 && candidate.origin == CandidateOrigin::Catalog {
					let seen = session.add_low_quality(&candidate, qz_crop);
					if seen == self.options.low_quality_warning_after && !*warned {
						*warned = true;
						if let Err(err) = progress.warn(LOW_QUALITY_WARNING) {
							tracing::warn!(error = %err, "failed to send low quality warning");
						}
					}
				}
				candidate
			}
			(SlotOutcome::Unknown, Some(qz_crop)) => {
				tracing::warn!(session = %session.id, index, x = found.x, y = found.y, "unresolved slot");
				quantity = 1;
				let record = session.add_unknown(qz_crop);
				let unresolved = UnresolvedSlot {
					session_id: &session.id,
					screenshot,
					index,
					slot: &found.image,
					clean: &qz_item,
				};
				if let Err(err) = self.archive.archive(unresolved) {
					tracing::warn!(error = %err, index, "failed to archive unresolved slot");
				}
				record
			}
		};

		let fp = &candidate.fingerprint;
		tally
			.entry(fp.name.clone())
			.and_modify(|v| v.count += quantity)
			.or_insert_with(|| TallyEntry {
				count: quantity,
				group: fp.group.clone(),
				value: fp.value,
			});

		if let Some(bonus) = matcher::reinforce(self.store.as_ref(), &candidate).map_err(ScanError::StoreUnavailable)? {
			session.add_group_score(&fp.group, bonus);
		}

		if fp.group != UNKNOWN_GROUP
			&& let Some(frame) = &candidate.frame
		{
			let overlay = (quantity > 1).then_some(&digits.overlay);
			self.ie.draw_match(canvas, found.x, found.y, frame.as_image(), overlay);
		}
		self.ie.stamp_group(canvas, found.x, found.y, &fp.group, fp.value);
		Ok(())
	}
}

fn send_progress(progress: &dyn ProgressSink, percent: u8, message: &str) {
	if let Err(err) = progress.report(percent, message) {
		tracing::debug!(error = %err, "progress update dropped");
	}
}

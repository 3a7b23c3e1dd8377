//! Candidate ranking and sprite matching.
//!
//! Matching itself has no side effects; [`reinforce`] is the post-match step
//! the orchestrator calls to bias future scans toward what was just found.

use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use catalog::{FingerprintStore, ItemFingerprint};
use ie::{
	Image, OwnedImage, UNKNOWN_GROUP,
	compare::{Thresholds, sprites_match},
	geometry::footprint_size,
};

/// Priority bonus of a matched item.
pub const MATCH_BONUS: i64 = 400;
/// Persistent priority bonus of every item in a matched item's group.
pub const GROUP_BONUS: i64 = 1;
/// Score bonus of a group within the current scan, per match.
pub const SESSION_GROUP_BONUS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
	Catalog,
	/// Never-matched sprite seen earlier in the same screenshot.
	SessionUnknown,
	/// Item matched earlier in the same screenshot only at a relaxed quality.
	SessionLowQuality,
}

/// Something a slot sprite can be compared with.
#[derive(Debug, Clone)]
pub struct Candidate {
	pub fingerprint: ItemFingerprint,
	/// Cropped sprite compared against the slot.
	pub sprite: Arc<OwnedImage>,
	/// Uncropped 32x32 frame drawn over a recognized slot.
	pub frame: Option<Arc<OwnedImage>>,
	pub origin: CandidateOrigin,
}

impl Candidate {
	pub fn is_unknown(&self) -> bool {
		self.fingerprint.group == UNKNOWN_GROUP
	}
}

/// Ordering score; higher is tried first.
///
/// Historical priority plus the group's score in the current scan dominate.
/// Value adds at most one point, so among equals the more valuable item wins.
pub fn sort_score(fingerprint: &ItemFingerprint, groups: &HashMap<String, i64>) -> f64 {
	let group = groups.get(&fingerprint.group).copied().unwrap_or(0);
	(fingerprint.priority + group) as f64 / 100.0 + fingerprint.value.min(1000) as f64 / 1000.0
}

/// Stable sort by descending [`sort_score`].
pub fn rank(candidates: &mut [Candidate], groups: &HashMap<String, i64>) {
	candidates.sort_by(|a, b| sort_score(&b.fingerprint, groups).total_cmp(&sort_score(&a.fingerprint, groups)));
}

/// First candidate `sprite` matches at `quality`.
///
/// A returned catalog item carries its [`MATCH_BONUS`]; session unknowns come
/// back as they are.
pub fn find_match(sprite: Image, candidates: &[Candidate], quality: u32) -> Option<Candidate> {
	let thresholds = Thresholds::new(footprint_size(sprite), quality);
	let found = candidates.iter().find(|c| sprites_match(sprite, c.sprite.as_image(), &thresholds))?;

	let mut found = found.clone();
	if found.origin != CandidateOrigin::SessionUnknown {
		found.fingerprint.priority += MATCH_BONUS;
	}
	Some(found)
}

/// Persist the reward for a match. Unknown sprites earn nothing.
///
/// Returns the session group bonus to apply, if any.
pub fn reinforce(store: &dyn FingerprintStore, matched: &Candidate) -> Result<Option<i64>> {
	if matched.is_unknown() {
		return Ok(None);
	}
	store.increment_priority(&matched.fingerprint.name, MATCH_BONUS)?;
	store.increment_group_priority(&matched.fingerprint.group, GROUP_BONUS)?;
	Ok(Some(SESSION_GROUP_BONUS))
}

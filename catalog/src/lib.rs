use anyhow::{Context, Result};
use ie::{Image, OwnedImage, geometry::ColorSignature};

pub mod build;
pub mod curate;
mod pattern;
pub use pattern::NamePattern;
mod store;
pub use store::JsonStore;

/// Box tolerance (both axes) for geometry lookups.
pub const BOX_TOLERANCE: u32 = 3;
/// Footprint tolerance for geometry lookups.
pub const FOOTPRINT_TOLERANCE: u32 = 10;

/// One known sprite of an item. Animated items have one record per frame.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemFingerprint {
	/// Assigned by the store on insert.
	#[serde(default)]
	pub id: u64,
	pub name: String,
	pub group: String,
	#[serde(default)]
	pub priority: i64,
	pub value: u32,
	/// PNG of the uncropped 32x32 frame.
	#[serde(with = "frame_base64")]
	pub frame: Vec<u8>,
	pub size_x: u32,
	pub size_y: u32,
	pub size: u32,
	#[serde(flatten)]
	pub signature: ColorSignature,
}

impl ItemFingerprint {
	/// Fingerprint `frame`, which must have at least one visible pixel.
	pub fn from_frame(name: impl Into<String>, group: impl Into<String>, value: u32, priority: i64, frame: &OwnedImage) -> Result<Self> {
		let cropped = ie::geometry::crop(frame.as_image()).context("Frame has no visible pixels")?;
		Ok(Self {
			id: 0,
			name: name.into(),
			group: group.into(),
			priority,
			value,
			frame: frame.to_png()?,
			size_x: cropped.width(),
			size_y: cropped.height(),
			size: ie::geometry::footprint_size(cropped),
			signature: ie::geometry::color_signature(cropped),
		})
	}

	pub fn decode_frame(&self) -> Result<OwnedImage> {
		OwnedImage::decode(&self.frame).with_context(|| format!("Decode frame of {} (id {})", self.name, self.id))
	}

	/// Whether the cropped bounds are within [`BOX_TOLERANCE`] of `(size_x, size_y)`.
	pub fn fits_box(&self, size_x: u32, size_y: u32) -> bool {
		self.size_x.abs_diff(size_x) <= BOX_TOLERANCE && self.size_y.abs_diff(size_y) <= BOX_TOLERANCE
	}

	/// Coarse geometry and color pre-filter.
	pub fn matches(&self, query: &Query) -> bool {
		let geometry = self.fits_box(query.size_x, query.size_y) || self.size.abs_diff(query.size) <= FOOTPRINT_TOLERANCE;
		geometry && self.signature.distance(&query.signature) <= query.color_tolerance()
	}
}

/// Lookup key computed from a cropped slot sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
	pub size_x: u32,
	pub size_y: u32,
	pub size: u32,
	pub signature: ColorSignature,
	pub quality: u32,
}

impl Query {
	pub fn for_sprite(cropped: Image, quality: u32) -> Self {
		Self {
			size_x: cropped.width(),
			size_y: cropped.height(),
			size: ie::geometry::footprint_size(cropped),
			signature: ie::geometry::color_signature(cropped),
			quality,
		}
	}

	/// Allowed signature distance, widening with quality.
	pub fn color_tolerance(&self) -> u32 {
		60 + 2 * self.quality
	}
}

/// Persistent catalog of item fingerprints.
///
/// Shared between concurrent scans; implementations synchronize internally.
pub trait FingerprintStore: Send + Sync {
	/// Fingerprints passing the coarse filter of [`ItemFingerprint::matches`], in catalog order.
	fn query(&self, query: &Query) -> Result<Vec<ItemFingerprint>>;

	/// Add `delta` to the priority of every record named `name`.
	fn increment_priority(&self, name: &str, delta: i64) -> Result<()>;

	/// Add `delta` to the priority of every record in `group`.
	fn increment_group_priority(&self, group: &str, delta: i64) -> Result<()>;

	/// Store a new record and return its id.
	fn insert(&self, fingerprint: ItemFingerprint) -> Result<u64>;

	/// Delete every record whose name matches `pattern`, returning the first name removed.
	fn delete(&self, pattern: &str) -> Result<Option<String>>;

	/// Records whose name matches `pattern`, in catalog order.
	fn find(&self, pattern: &str) -> Result<Vec<ItemFingerprint>>;

	/// Distinct item names, in catalog order.
	fn names(&self) -> Result<Vec<String>>;

	/// Persist buffered updates.
	fn flush(&self) -> Result<()> {
		Ok(())
	}
}

mod frame_base64 {
	use base64::{Engine, engine::general_purpose::STANDARD};
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&STANDARD.encode(bytes))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let s = String::deserialize(deserializer)?;
		STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
	}
}

//! Scan admission and worker threads.
//!
//! Every accepted submission runs on its own thread, so distinct users scan
//! concurrently while one user has at most one scan in flight.

use std::{
	collections::HashSet,
	sync::{Arc, Mutex, PoisonError},
	thread::JoinHandle,
};

use ie::{OwnedImage, SLOT_SIZE};

use crate::{ScanError, progress::ProgressSink, report::LootReport, scan::Engine};

type InFlight = Arc<Mutex<HashSet<u64>>>;

/// Marks a user busy until dropped.
struct AdmissionGuard {
	in_flight: InFlight,
	user: u64,
}

impl Drop for AdmissionGuard {
	fn drop(&mut self) {
		self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.user);
	}
}

pub struct Scanner {
	engine: Arc<Engine>,
	in_flight: InFlight,
	trusted: HashSet<u64>,
	max_image_bytes: u64,
}

/// A running scan.
pub struct ScanHandle {
	worker: JoinHandle<Result<LootReport, ScanError>>,
}

impl ScanHandle {
	/// Block until the scan finishes.
	pub fn wait(self) -> Result<LootReport, ScanError> {
		match self.worker.join() {
			Ok(result) => result,
			Err(panic) => std::panic::resume_unwind(panic),
		}
	}
}

impl Scanner {
	pub fn new(engine: Arc<Engine>, trusted: impl IntoIterator<Item = u64>, max_image_bytes: u64) -> Self {
		Self {
			engine,
			in_flight: InFlight::default(),
			trusted: trusted.into_iter().collect(),
			max_image_bytes,
		}
	}

	/// Whether `user` has a scan running.
	pub fn is_busy(&self, user: u64) -> bool {
		self.in_flight.lock().unwrap_or_else(PoisonError::into_inner).contains(&user)
	}

	fn admit(&self, user: u64) -> Result<Option<AdmissionGuard>, ScanError> {
		if self.trusted.contains(&user) {
			return Ok(None);
		}
		let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
		if !in_flight.insert(user) {
			tracing::info!(user, "rejected concurrent scan");
			return Err(ScanError::Busy);
		}
		Ok(Some(AdmissionGuard {
			in_flight: self.in_flight.clone(),
			user,
		}))
	}

	/// Start scanning the encoded image `bytes` for `user`.
	///
	/// Fails with [`ScanError::Busy`] while the same user has a scan in flight.
	/// Image validation happens on the worker and surfaces through
	/// [`ScanHandle::wait`] before any slot is scanned.
	pub fn submit(
		&self,
		user: u64,
		bytes: Vec<u8>,
		session_id: String,
		progress: Arc<dyn ProgressSink>,
	) -> Result<ScanHandle, ScanError> {
		let guard = self.admit(user)?;
		let engine = self.engine.clone();
		let max_bytes = self.max_image_bytes;

		let worker = std::thread::spawn(move || {
			let _guard = guard;
			let screenshot = validate_image(&bytes, max_bytes)?;
			let report = engine.scan(&session_id, &screenshot, progress.as_ref());

			// Batched priority increments; a failed flush only loses ranking hints.
			if let Err(err) = engine.store().flush() {
				tracing::warn!(error = %err, "failed to flush fingerprint store");
			}
			report
		});

		Ok(ScanHandle { worker })
	}
}

/// Decode a submission, enforcing the byte cap and the minimum slot size.
pub fn validate_image(bytes: &[u8], max_bytes: u64) -> Result<OwnedImage, ScanError> {
	if bytes.len() as u64 > max_bytes {
		return Err(ScanError::InvalidImage(format!("{} bytes exceeds the {max_bytes} byte limit", bytes.len())));
	}
	let image = OwnedImage::decode(bytes).map_err(|err| ScanError::InvalidImage(format!("{err:#}")))?;
	if image.width() < SLOT_SIZE || image.height() < SLOT_SIZE {
		return Err(ScanError::InvalidImage(format!(
			"{}x{} is smaller than one slot",
			image.width(),
			image.height()
		)));
	}
	Ok(image)
}

#[cfg(test)]
mod tests {
	use std::sync::mpsc::{self, Receiver, Sender};

	use anyhow::Result;
	use catalog::JsonStore;
	use ie::{Color, Ie, Templates};

	use super::*;
	use crate::{archive::NoArchive, metadata::NoMetadata, progress::NoProgress, scan::ScanOptions};

	/// Holds the scan at its first progress report until released.
	struct Hold {
		entered: Mutex<Sender<()>>,
		release: Mutex<Receiver<()>>,
	}

	impl ProgressSink for Hold {
		fn report(&self, percent: u8, _message: &str) -> Result<()> {
			if percent == 0 {
				self.entered.lock().unwrap().send(())?;
				self.release.lock().unwrap().recv()?;
			}
			Ok(())
		}
	}

	fn hold() -> (Arc<Hold>, Receiver<()>, Sender<()>) {
		let (entered_tx, entered_rx) = mpsc::channel();
		let (release_tx, release_rx) = mpsc::channel();
		let sink = Hold {
			entered: Mutex::new(entered_tx),
			release: Mutex::new(release_rx),
		};
		(Arc::new(sink), entered_rx, release_tx)
	}

	fn scanner(trusted: &[u64]) -> Scanner {
		let templates = Templates::builtin();
		let engine = Engine::new(
			Arc::new(Ie::new(templates)),
			Arc::new(JsonStore::in_memory()),
			Arc::new(NoMetadata),
			Arc::new(NoArchive),
			ScanOptions::default(),
		);
		Scanner::new(Arc::new(engine), trusted.iter().copied(), 2 * 1024 * 1024)
	}

	/// PNG of a single empty slot.
	fn one_slot_png() -> Vec<u8> {
		let templates = Templates::builtin();
		let mut image = OwnedImage::new(SLOT_SIZE + 8, SLOT_SIZE + 8, Color::BLACK);
		image.paste(templates.slot.as_image(), 4, 4);
		image.to_png().unwrap()
	}

	#[test]
	fn one_scan_per_user() {
		let scanner = scanner(&[]);
		let (sink, entered, release) = hold();

		let first = scanner.submit(1, one_slot_png(), "a".into(), sink).unwrap();
		entered.recv().unwrap();
		assert!(scanner.is_busy(1));
		assert!(matches!(
			scanner.submit(1, one_slot_png(), "b".into(), Arc::new(NoProgress)),
			Err(ScanError::Busy)
		));

		// Other users are not affected.
		let other = scanner.submit(2, one_slot_png(), "c".into(), Arc::new(NoProgress)).unwrap();
		assert!(other.wait().unwrap().is_empty());

		release.send(()).unwrap();
		assert!(first.wait().unwrap().is_empty());
		assert!(!scanner.is_busy(1));
		assert!(scanner.submit(1, one_slot_png(), "d".into(), Arc::new(NoProgress)).unwrap().wait().is_ok());
	}

	#[test]
	fn trusted_users_skip_the_guard() {
		let scanner = scanner(&[9]);
		let (sink, entered, release) = hold();

		let first = scanner.submit(9, one_slot_png(), "a".into(), sink).unwrap();
		entered.recv().unwrap();
		let second = scanner.submit(9, one_slot_png(), "b".into(), Arc::new(NoProgress)).unwrap();
		assert!(second.wait().is_ok());

		release.send(()).unwrap();
		assert!(first.wait().is_ok());
	}

	#[test]
	fn invalid_images_are_rejected_and_release_the_user() {
		let scanner = scanner(&[]);
		let garbage = scanner.submit(1, b"not a png".to_vec(), "a".into(), Arc::new(NoProgress)).unwrap();
		assert!(matches!(garbage.wait(), Err(ScanError::InvalidImage(_))));
		assert!(!scanner.is_busy(1));

		let tiny = OwnedImage::new(33, 100, Color::BLACK).to_png().unwrap();
		let tiny = scanner.submit(1, tiny, "b".into(), Arc::new(NoProgress)).unwrap();
		assert!(matches!(tiny.wait(), Err(ScanError::InvalidImage(_))));
	}

	#[test]
	fn byte_cap_is_enforced() {
		let png = one_slot_png();
		assert!(matches!(validate_image(&png, png.len() as u64 - 1), Err(ScanError::InvalidImage(_))));
		assert!(validate_image(&png, png.len() as u64).is_ok());
	}

	#[test]
	fn blank_images_have_no_slots() {
		let scanner = scanner(&[]);
		let png = OwnedImage::new(64, 64, Color::BLACK).to_png().unwrap();
		let handle = scanner.submit(1, png, "a".into(), Arc::new(NoProgress)).unwrap();
		assert!(matches!(handle.wait(), Err(ScanError::NoSlotsFound)));
	}
}

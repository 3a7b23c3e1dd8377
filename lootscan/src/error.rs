/// Why a scan did not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
	/// Undecodable, too large or too small; nothing was scanned.
	#[error("invalid image: {0}")]
	InvalidImage(String),
	#[error("no inventory slots found in the image")]
	NoSlotsFound,
	/// The fingerprint store failed; the scan's session learning is discarded.
	#[error("fingerprint store unavailable: {0:#}")]
	StoreUnavailable(#[source] anyhow::Error),
	/// The submitter already has a scan in flight.
	#[error("a scan for this user is already running")]
	Busy,
}

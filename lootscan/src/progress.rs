//! Progress side channel. Nothing sent here can fail a scan.

use std::sync::mpsc::Sender;

use anyhow::Result;

pub trait ProgressSink: Send + Sync {
	fn report(&self, percent: u8, message: &str) -> Result<()>;

	/// One-off notice for the submitter.
	fn warn(&self, message: &str) -> Result<()> {
		tracing::warn!("{message}");
		Ok(())
	}
}

/// Drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
	fn report(&self, _percent: u8, _message: &str) -> Result<()> {
		Ok(())
	}

	fn warn(&self, _message: &str) -> Result<()> {
		Ok(())
	}
}

/// Writes updates to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
	fn report(&self, percent: u8, message: &str) -> Result<()> {
		tracing::info!(percent, "{message}");
		Ok(())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
	Report { percent: u8, message: String },
	Warning(String),
}

/// Forwards updates to a channel, e.g. the thread owning the status message.
#[derive(Debug)]
pub struct ChannelProgress {
	tx: std::sync::Mutex<Sender<ProgressEvent>>,
}

impl ChannelProgress {
	pub fn new(tx: Sender<ProgressEvent>) -> Self {
		Self { tx: std::sync::Mutex::new(tx) }
	}

	fn send(&self, event: ProgressEvent) -> Result<()> {
		let tx = self.tx.lock().map_err(|_| anyhow::anyhow!("progress lock poisoned"))?;
		tx.send(event)?;
		Ok(())
	}
}

impl ProgressSink for ChannelProgress {
	fn report(&self, percent: u8, message: &str) -> Result<()> {
		self.send(ProgressEvent::Report {
			percent,
			message: message.to_string(),
		})
	}

	fn warn(&self, message: &str) -> Result<()> {
		self.send(ProgressEvent::Warning(message.to_string()))
	}
}

/// Decides when a slot counts as a new progress step.
#[derive(Debug, Clone)]
pub(crate) struct ProgressGate {
	step: u8,
	last: u8,
}

impl ProgressGate {
	pub(crate) fn new(step: u8) -> Self {
		Self { step: step.max(1), last: 0 }
	}

	/// Percentage to report after `done` of `total` slots, if it moved far enough.
	pub(crate) fn advance(&mut self, done: usize, total: usize) -> Option<u8> {
		if total == 0 {
			return None;
		}
		let percent = (done * 100 / total).min(100) as u8;
		if percent.saturating_sub(self.last) >= self.step {
			self.last = percent;
			Some(percent)
		} else {
			None
		}
	}
}

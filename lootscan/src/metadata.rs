use std::{collections::HashSet, path::Path};

use anyhow::{Context, Result};

/// Side lookup for items that are worth more on the market than to NPCs.
pub trait ItemMetadata: Send + Sync {
	fn is_marketable(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl ItemMetadata for NoMetadata {
	fn is_marketable(&self, _name: &str) -> bool {
		false
	}
}

/// Case-insensitive set of marketable item names, loaded from a JSON list.
#[derive(Debug, Clone, Default)]
pub struct MarketableSet {
	names: HashSet<String>,
}

impl MarketableSet {
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
		let names: Vec<String> = serde_json::from_str(&json).with_context(|| format!("parse {}", path.display()))?;
		Ok(names.into_iter().collect())
	}
}

impl<S: AsRef<str>> FromIterator<S> for MarketableSet {
	fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
		Self {
			names: iter.into_iter().map(|v| v.as_ref().to_lowercase()).collect(),
		}
	}
}

impl ItemMetadata for MarketableSet {
	fn is_marketable(&self, name: &str) -> bool {
		self.names.contains(&name.to_lowercase())
	}
}

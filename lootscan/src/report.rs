//! Scan results grouped by buyer.

use anyhow::{Context, Result};
use ie::{NO_VALUE_GROUP, OwnedImage, UNKNOWN_GROUP};
use indexmap::IndexMap;
use serde::Serialize;

use crate::metadata::ItemMetadata;

/// Marker appended to marketable item names.
pub const MARKETABLE_MARK: &str = "💎";

/// Raw per-item count, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
	pub count: u32,
	pub group: String,
	pub value: u32,
}

pub type Tally = IndexMap<String, TallyEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
	pub name: String,
	pub count: u32,
	pub value: u32,
	pub total: u64,
	pub marketable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
	pub name: String,
	pub subtotal: u64,
	pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LootReport {
	pub items: Tally,
	/// Groups in first-seen order, unknown items excluded.
	pub groups: Vec<GroupReport>,
	pub total_value: u64,
	pub unknown_count: u32,
	pub has_marketable: bool,
	/// Screenshot with recognized slots redrawn and group icons stamped.
	#[serde(skip)]
	pub overlay: Option<OwnedImage>,
}

impl LootReport {
	pub fn aggregate(items: Tally, metadata: &dyn ItemMetadata) -> Self {
		let mut groups: IndexMap<&str, GroupReport> = IndexMap::new();
		let mut has_marketable = false;

		for (name, entry) in &items {
			if entry.group == UNKNOWN_GROUP {
				continue;
			}
			let marketable = entry.group != NO_VALUE_GROUP && metadata.is_marketable(name);
			has_marketable |= marketable;

			let total = entry.count as u64 * entry.value as u64;
			let group = groups.entry(entry.group.as_str()).or_insert_with(|| GroupReport {
				name: entry.group.clone(),
				subtotal: 0,
				items: Vec::new(),
			});
			group.subtotal += total;
			group.items.push(ReportItem {
				name: name.clone(),
				count: entry.count,
				value: entry.value,
				total,
				marketable,
			});
		}

		let groups: Vec<GroupReport> = groups.into_values().collect();
		let total_value = groups.iter().map(|g| g.subtotal).sum();
		let unknown_count = items.values().filter(|v| v.group == UNKNOWN_GROUP).map(|v| v.count).sum();

		Self {
			items,
			groups,
			total_value,
			unknown_count,
			has_marketable,
			overlay: None,
		}
	}

	/// Nothing recognized and nothing unknown: every slot was empty.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn overlay_png(&self) -> Result<Option<Vec<u8>>> {
		self.overlay.as_ref().map(|v| v.to_png().context("encode overlay")).transpose()
	}

	/// Human readable report, one line per entry.
	pub fn summary_lines(&self) -> Vec<String> {
		let mut lines = Vec::new();
		for group in &self.groups {
			if group.name == NO_VALUE_GROUP {
				lines.push(group.name.clone());
				lines.extend(group.items.iter().map(|i| format!("x{} {}", i.count, i.name)));
			} else {
				lines.push(format!("{} - {} gold", group.name, thousands(group.subtotal)));
				for i in &group.items {
					let mark = if i.marketable { MARKETABLE_MARK } else { "" };
					lines.push(format!("x{} {}{} → {}gp total", i.count, i.name, mark, thousands(i.total)));
				}
			}
			lines.push(String::new());
		}

		if self.unknown_count > 0 {
			lines.push(format!("There were {} unknown items.", self.unknown_count));
		}
		lines.push(format!("The total loot value is: {} gold coins.", thousands(self.total_value)));
		if self.has_marketable {
			lines.push(format!(
				"{MARKETABLE_MARK} Items marked with this are used in imbuements and might be worth more in the market."
			));
		}
		lines
	}
}

fn thousands(n: u64) -> String {
	let digits = n.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);
	for (i, c) in digits.chars().enumerate() {
		if i > 0 && (digits.len() - i) % 3 == 0 {
			out.push(',');
		}
		out.push(c);
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::metadata::{MarketableSet, NoMetadata};

	fn entry(count: u32, group: &str, value: u32) -> TallyEntry {
		TallyEntry {
			count,
			group: group.into(),
			value,
		}
	}

	fn tally() -> Tally {
		let mut t = Tally::new();
		t.insert("Gold Coin".into(), entry(2, "Valuables", 1));
		t.insert("Unknown".into(), entry(3, UNKNOWN_GROUP, 0));
		t.insert("Wolf Paw".into(), entry(4, "Creature Products", 70));
		t.insert("Rope Belt".into(), entry(1, NO_VALUE_GROUP, 0));
		t.insert("Small Ruby".into(), entry(5, "Valuables", 250));
		t
	}

	#[test]
	fn groups_totals_and_unknowns() {
		let report = LootReport::aggregate(tally(), &NoMetadata);
		let names: Vec<_> = report.groups.iter().map(|g| g.name.as_str()).collect();
		assert_eq!(names, ["Valuables", "Creature Products", NO_VALUE_GROUP]);
		assert_eq!(report.groups[0].subtotal, 2 + 1250);
		assert_eq!(report.groups[1].subtotal, 280);
		assert_eq!(report.total_value, 2 + 1250 + 280);
		assert_eq!(report.unknown_count, 3);
		assert!(!report.has_marketable);
	}

	#[test]
	fn marketable_items_are_marked() {
		let meta: MarketableSet = ["Wolf Paw", "Rope Belt"].into_iter().collect();
		let report = LootReport::aggregate(tally(), &meta);
		assert!(report.has_marketable);
		assert!(report.groups[1].items[0].marketable);
		// Items without value are never marked.
		assert!(!report.groups[2].items[0].marketable);

		let lines = report.summary_lines();
		assert!(lines.contains(&"x4 Wolf Paw💎 → 280gp total".to_string()));
		assert!(lines.contains(&"x1 Rope Belt".to_string()));
		assert!(lines.contains(&"Valuables - 1,252 gold".to_string()));
		assert!(lines.contains(&"There were 3 unknown items.".to_string()));
		assert!(lines.contains(&"The total loot value is: 1,532 gold coins.".to_string()));
		assert!(lines.last().unwrap().starts_with(MARKETABLE_MARK));
	}

	#[test]
	fn thousands_separator() {
		assert_eq!(thousands(0), "0");
		assert_eq!(thousands(999), "999");
		assert_eq!(thousands(1000), "1,000");
		assert_eq!(thousands(12345678), "12,345,678");
	}
}

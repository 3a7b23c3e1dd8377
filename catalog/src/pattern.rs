use anyhow::{Context, Result};
use regex::Regex;

/// SQL `LIKE` style name pattern: `%` is any run, `_` any single character,
/// case is ignored and the whole name has to match.
#[derive(Debug, Clone)]
pub struct NamePattern {
	regex: Regex,
}

impl NamePattern {
	pub fn new(pattern: &str) -> Result<Self> {
		let mut expr = String::with_capacity(pattern.len() + 8);
		expr.push_str("(?is)^");
		let mut literal = String::new();
		for c in pattern.chars() {
			match c {
				'%' | '_' => {
					expr.push_str(&regex::escape(&literal));
					literal.clear();
					expr.push_str(if c == '%' { ".*" } else { "." });
				}
				c => literal.push(c),
			}
		}
		expr.push_str(&regex::escape(&literal));
		expr.push('$');

		let regex = Regex::new(&expr).with_context(|| format!("Compile name pattern {pattern:?}"))?;
		Ok(Self { regex })
	}

	pub fn matches(&self, name: &str) -> bool {
		self.regex.is_match(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn plain_names_match_ignoring_case() {
		let p = NamePattern::new("gold coin").unwrap();
		assert!(p.matches("Gold Coin"));
		assert!(!p.matches("Gold Coins"));
		assert!(!p.matches("A Gold Coin"));
	}

	#[test]
	fn wildcards() {
		let p = NamePattern::new("%coin").unwrap();
		assert!(p.matches("Platinum Coin"));
		assert!(p.matches("coin"));
		let p = NamePattern::new("b_g").unwrap();
		assert!(p.matches("Bag"));
		assert!(!p.matches("Bg"));
	}

	#[test]
	fn regex_characters_are_literal() {
		let p = NamePattern::new("Bag (Ahmet)").unwrap();
		assert!(p.matches("bag (ahmet)"));
		assert!(!p.matches("Bag Ahmet"));
	}
}

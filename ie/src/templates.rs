use std::{collections::HashMap, path::Path};

use anyhow::{Result, ensure};

use crate::{Color, Image, OwnedImage};

/// Side of a framed slot, border included.
pub const SLOT_SIZE: u32 = 34;
/// Side of the sprite area inside the frame.
pub const SPRITE_SIZE: u32 = 32;
pub const GLYPH_WIDTH: u32 = 8;
pub const GLYPH_HEIGHT: u32 = 10;

pub const UNKNOWN_GROUP: &str = "Unknown";
pub const NO_VALUE_GROUP: &str = "No Value";
const NO_VALUE_ICON: &str = "NoValue";
const OTHER_ICON: &str = "Other";

/// Groups that have their own icon, with the built-in marker color.
const GROUP_ICONS: [(&str, Color); 10] = [
	("Green Djinn", Color::new(40, 190, 60)),
	("Blue Djinn", Color::new(50, 90, 220)),
	("Rashid", Color::new(200, 120, 30)),
	("Yasir", Color::new(150, 60, 200)),
	("Tamoril", Color::new(200, 40, 40)),
	("Jewels", Color::new(60, 210, 210)),
	("Gnomission", Color::new(230, 210, 60)),
	(OTHER_ICON, Color::new(160, 160, 160)),
	(NO_VALUE_ICON, Color::new(90, 60, 40)),
	(UNKNOWN_GROUP, Color::new(250, 0, 250)),
];

const BORDER_DARK: Color = Color::new(21, 21, 21);
const BORDER_LIGHT: Color = Color::new(87, 87, 87);
const INSIDE_A: Color = Color::new(44, 44, 44);
const INSIDE_B: Color = Color::new(48, 47, 48);

const GLYPH_FILL: Color = Color::new(223, 223, 223);
const GLYPH_OUTLINE: Color = Color::BLACK;

/// 5x7 digit shapes; the glyph adds a one pixel outline around them.
const DIGIT_SHAPES: [[&str; 7]; 10] = [
	[".###.", "#...#", "#..##", "#.#.#", "##..#", "#...#", ".###."],
	["..#..", ".##..", "..#..", "..#..", "..#..", "..#..", ".###."],
	[".###.", "#...#", "....#", "...#.", "..#..", ".#...", "#####"],
	["#####", "...#.", "..#..", "...#.", "....#", "#...#", ".###."],
	["...#.", "..##.", ".#.#.", "#..#.", "#####", "...#.", "...#."],
	["#####", "#....", "####.", "....#", "....#", "#...#", ".###."],
	["..##.", ".#...", "#....", "####.", "#...#", "#...#", ".###."],
	["#####", "....#", "...#.", "..#..", ".#...", ".#...", ".#..."],
	[".###.", "#...#", "#...#", ".###.", "#...#", "#...#", ".###."],
	[".###.", "#...#", "#...#", ".####", "....#", "...#.", ".##.."],
];

/// Reference bitmaps every scan compares against.
///
/// Loaded once at startup and shared by reference; nothing mutates them.
#[derive(Debug, Clone)]
pub struct Templates {
	/// Clean 34x34 slot, frame included.
	pub slot: OwnedImage,
	/// 34x34 frame; only the perimeter is compared.
	pub border: OwnedImage,
	/// Quantity glyphs `0`..`9`; transparent pixels are not part of the glyph.
	pub digits: [OwnedImage; 10],
	icons: HashMap<String, OwnedImage>,
}

impl Templates {
	/// Read the template set from a directory of PNG files.
	///
	/// Expects `slot.png`, `slotborder.png`, `0.png`..`9.png` and one
	/// `<Group>.png` per icon (`Other.png` at least).
	pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
		let dir = dir.as_ref();
		let slot = OwnedImage::open(dir.join("slot.png"))?;
		let border = OwnedImage::open(dir.join("slotborder.png"))?;
		ensure!(
			slot.width() == SLOT_SIZE && slot.height() == SLOT_SIZE,
			"slot.png must be {SLOT_SIZE}x{SLOT_SIZE}"
		);
		ensure!(
			border.width() == SLOT_SIZE && border.height() == SLOT_SIZE,
			"slotborder.png must be {SLOT_SIZE}x{SLOT_SIZE}"
		);

		let mut digits = Vec::with_capacity(10);
		for i in 0..10 {
			digits.push(OwnedImage::open(dir.join(format!("{i}.png")))?);
		}
		let digits: [OwnedImage; 10] = digits
			.try_into()
			.map_err(|_| anyhow::anyhow!("expected ten digit glyphs"))?;

		let mut icons = HashMap::new();
		for (name, _) in GROUP_ICONS {
			let path = dir.join(format!("{name}.png"));
			if path.is_file() {
				icons.insert(name.to_string(), OwnedImage::open(&path)?);
			}
		}
		ensure!(icons.contains_key(OTHER_ICON), "missing {OTHER_ICON}.png in {}", dir.display());

		Ok(Self {
			slot,
			border,
			digits,
			icons,
		})
	}

	/// Template set drawn in code, used when no asset directory is available.
	pub fn builtin() -> Self {
		let slot = OwnedImage::from_fn(SLOT_SIZE, SLOT_SIZE, |x, y| {
			let last = SLOT_SIZE - 1;
			if x == 0 || y == 0 {
				BORDER_DARK
			} else if x == last || y == last {
				BORDER_LIGHT
			} else if (x + y) % 2 == 0 {
				INSIDE_A
			} else {
				INSIDE_B
			}
		});

		let digits = std::array::from_fn(|i| glyph(&DIGIT_SHAPES[i]));

		let icons = GROUP_ICONS
			.iter()
			.map(|(name, color)| (name.to_string(), icon(*color)))
			.collect();

		Self {
			border: slot.clone(),
			slot,
			digits,
			icons,
		}
	}

	/// Icon stamped over a resolved slot.
	///
	/// Valueless items get the "no value" icon unless they are unknown; groups
	/// without an icon of their own fall back to "other".
	pub fn icon(&self, group: &str, value: u32) -> Image<'_> {
		let key = if value > 0 || group == UNKNOWN_GROUP {
			group
		} else {
			NO_VALUE_ICON
		};

		self.icons
			.get(key)
			.or_else(|| self.icons.get(OTHER_ICON))
			.map(|v| v.as_image())
			.unwrap_or_else(|| self.slot.as_image().sub_image(0, 0, 0, 0))
	}
}

fn glyph(shape: &[&str; 7]) -> OwnedImage {
	let fill = |x: i32, y: i32| -> bool {
		// Shape pixels sit at (1, 1) inside the cell.
		let (sx, sy) = (x - 1, y - 1);
		if !(0..5).contains(&sx) || !(0..7).contains(&sy) {
			return false;
		}
		shape[sy as usize].as_bytes()[sx as usize] == b'#'
	};

	OwnedImage::from_fn(GLYPH_WIDTH, GLYPH_HEIGHT, |x, y| {
		let (x, y) = (x as i32, y as i32);
		if fill(x, y) {
			return GLYPH_FILL;
		}
		let touches_fill = (-1..=1).any(|dy| (-1..=1).any(|dx| fill(x + dx, y + dy)));
		if touches_fill { GLYPH_OUTLINE } else { Color::TRANSPARENT }
	})
}

fn icon(color: Color) -> OwnedImage {
	OwnedImage::from_fn(SLOT_SIZE, SLOT_SIZE, |x, y| {
		if (26..32).contains(&x) && (2..8).contains(&y) {
			color
		} else {
			Color::TRANSPARENT
		}
	})
}

//! Color and label helpers shared by derivation and rendering.

use std::fmt;

use super::error::MindmapError;

/// Fill used for every concept node.
pub const CONCEPT_HEX: &str = "#E6A817";

const LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// An sRGB color with channels in `0..=255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
}

impl Rgb {
	/// Fallback for books without a color and for unparseable color strings, `#8B949E`.
	pub const NEUTRAL: Rgb = Rgb {
		r: 0x8b,
		g: 0x94,
		b: 0x9e,
	};

	/// Parses `#rrggbb` or `#rgb` (the leading `#` is optional).
	pub fn from_hex(hex: &str) -> Result<Self, MindmapError> {
		let invalid = || MindmapError::InvalidColor(hex.to_string());
		let digits = hex.trim().trim_start_matches('#');
		if !digits.is_ascii() {
			return Err(invalid());
		}
		let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
		match digits.len() {
			6 => Ok(Rgb {
				r: channel(&digits[0..2])?,
				g: channel(&digits[2..4])?,
				b: channel(&digits[4..6])?,
			}),
			3 => {
				let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
				Ok(Rgb {
					r: short(0)?,
					g: short(1)?,
					b: short(2)?,
				})
			}
			_ => Err(invalid()),
		}
	}

	/// Parses `hex`, falling back to [`Rgb::NEUTRAL`].
	pub fn from_hex_or_neutral(hex: Option<&str>) -> Self {
		hex.and_then(|h| Rgb::from_hex(h).ok())
			.unwrap_or(Rgb::NEUTRAL)
	}

	/// Relative luminance in `0.0..=1.0` using Rec. 709 weights.
	pub fn luminance(&self) -> f64 {
		let [r, g, b] = self.unit();
		LUMA[0] * r + LUMA[1] * g + LUMA[2] * b
	}

	fn unit(&self) -> [f64; 3] {
		[
			self.r as f64 / 255.0,
			self.g as f64 / 255.0,
			self.b as f64 / 255.0,
		]
	}

	/// Pulls every channel toward the luminance gray, keeping `factor` of the
	/// original chroma. Luminance is unchanged up to rounding.
	pub fn desaturate(&self, factor: f64) -> Self {
		let gray = self.luminance();
		let [r, g, b] = self.unit().map(|c| gray + (c - gray) * factor);
		let to_byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
		Rgb {
			r: to_byte(r),
			g: to_byte(g),
			b: to_byte(b),
		}
	}

	/// CSS `rgba(...)` string for canvas fills with an opacity.
	pub fn to_css_alpha(&self, alpha: f64) -> String {
		format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
	}
}

impl fmt::Display for Rgb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "rgb({},{},{})", self.r, self.g, self.b)
	}
}

/// Lowercases and collapses whitespace runs so "  Stoicism\tEthics" matches
/// "stoicism ethics".
pub fn normalize_concept(s: &str) -> String {
	s.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join(" ")
}

/// Whether `candidate` matches an already normalized filter.
pub fn concept_matches(normalized_filter: &str, candidate: &str) -> bool {
	normalize_concept(candidate) == normalized_filter
}

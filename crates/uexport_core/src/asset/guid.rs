use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset::{ExportError, Result};

/// 128-bit identifier stored as its 16 on-disk bytes.
///
/// The first three groups are little-endian on disk, so the text form
/// `00112233-4455-6677-8899-aabbccddeeff` corresponds to the bytes
/// `33 22 11 00 55 44 77 66 88 99 aa bb cc dd ee ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
	/// The all-zero identifier.
	pub const ZERO: Self = Self([0; 16]);

	/// Wrap on-disk bytes.
	pub fn from_bytes(bytes: [u8; 16]) -> Self {
		Self(bytes)
	}

	/// Return the on-disk bytes.
	pub fn to_bytes(self) -> [u8; 16] {
		self.0
	}
}

// Text order of each on-disk byte.
const TEXT_ORDER: [usize; 16] = [3, 2, 1, 0, 5, 4, 7, 6, 8, 9, 10, 11, 12, 13, 14, 15];
const GROUPS: [usize; 5] = [4, 2, 2, 2, 6];

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut order = TEXT_ORDER.iter();
		for (group_idx, group_len) in GROUPS.iter().enumerate() {
			if group_idx > 0 {
				f.write_str("-")?;
			}
			for slot in order.by_ref().take(*group_len) {
				write!(f, "{:02x}", self.0[*slot])?;
			}
		}
		Ok(())
	}
}

impl FromStr for Guid {
	type Err = ExportError;

	fn from_str(text: &str) -> Result<Self> {
		let invalid = || ExportError::InvalidGuidText { text: text.to_owned() };
		let trimmed = text.trim();
		let body = trimmed.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')).unwrap_or(trimmed);

		let groups: Vec<&str> = body.split('-').collect();
		if groups.len() != GROUPS.len() || groups.iter().zip(GROUPS).any(|(group, len)| group.len() != len * 2) {
			return Err(invalid());
		}

		let digits = groups.concat();
		if !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
			return Err(invalid());
		}
		let mut bytes = [0_u8; 16];
		for (text_idx, slot) in TEXT_ORDER.iter().enumerate() {
			let pair = digits.get(text_idx * 2..text_idx * 2 + 2).ok_or_else(invalid)?;
			bytes[*slot] = u8::from_str_radix(pair, 16).map_err(|_| invalid())?;
		}
		Ok(Self(bytes))
	}
}

impl Serialize for Guid {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Guid {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		let text = String::deserialize(deserializer)?;
		text.parse().map_err(serde::de::Error::custom)
	}
}

/// Caller-supplied replacement applied to GUID values as they are decoded.
pub trait GuidRemap {
	/// Return the replacement for `value`, or `None` to keep it.
	fn remap(&self, value: Guid) -> Option<Guid>;
}

impl<F> GuidRemap for F
where
	F: Fn(Guid) -> Option<Guid>,
{
	fn remap(&self, value: Guid) -> Option<Guid> {
		self(value)
	}
}

/// One class entry of a GUID update document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidUpdate {
	/// Owning class name, for diagnostics.
	#[serde(rename = "ClassName", default)]
	pub class_name: String,
	/// Component replacements for this class.
	#[serde(rename = "GuidUpdateComponents", default)]
	pub components: Vec<GuidUpdateComponent>,
}

/// One dummy-to-production replacement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidUpdateComponent {
	/// Component name, for diagnostics.
	#[serde(rename = "ComponentName", default)]
	pub component_name: String,
	/// Placeholder identifier to replace. Empty entries are ignored.
	#[serde(rename = "DummyGuid", default)]
	pub dummy_guid: String,
	/// Identifier substituted for the placeholder.
	#[serde(rename = "ProductionGuid", default)]
	pub production_guid: String,
}

#[derive(Debug, Clone)]
struct RemapEntry {
	replacement: Guid,
	class_name: String,
	component_name: String,
}

/// Lookup table built once from a GUID update document.
///
/// The first entry for a given placeholder wins.
#[derive(Debug, Clone, Default)]
pub struct GuidRemapTable {
	entries: HashMap<Guid, RemapEntry>,
}

impl GuidRemapTable {
	/// Parse a JSON update document (an array of [`GuidUpdate`]).
	pub fn from_json(text: &str) -> Result<Self> {
		let updates: Vec<GuidUpdate> = serde_json::from_str(text)?;
		Self::from_updates(&updates)
	}

	/// Build the table from already-parsed updates.
	pub fn from_updates(updates: &[GuidUpdate]) -> Result<Self> {
		let mut entries = HashMap::new();
		for update in updates {
			for component in &update.components {
				if component.dummy_guid.trim().is_empty() {
					continue;
				}
				let dummy: Guid = component.dummy_guid.parse()?;
				let replacement: Guid = component.production_guid.parse()?;
				entries.entry(dummy).or_insert_with(|| RemapEntry {
					replacement,
					class_name: update.class_name.clone(),
					component_name: component.component_name.clone(),
				});
			}
		}
		Ok(Self { entries })
	}

	/// Number of distinct placeholders.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the table has no placeholders.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl GuidRemap for GuidRemapTable {
	fn remap(&self, value: Guid) -> Option<Guid> {
		let entry = self.entries.get(&value)?;
		tracing::debug!(
			class = %entry.class_name,
			component = %entry.component_name,
			from = %value,
			to = %entry.replacement,
			"guid remapped"
		);
		Some(entry.replacement)
	}
}

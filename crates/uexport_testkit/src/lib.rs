//! Shared test helpers for workspace crates.

/// Byte-level builder for struct-export record bodies.
///
/// Builds exactly what a writer would emit, without going through the codec,
/// so tests can check both directions against an independent encoding.
#[derive(Debug, Clone, Default)]
pub struct RecordBytes {
	reserved: i32,
	super_struct: i32,
	children: Vec<i32>,
	properties: Option<(i32, Vec<u8>)>,
	instruction_count: i32,
	script: Vec<u8>,
	storage_len: Option<i32>,
}

impl RecordBytes {
	/// Empty record: null parent, no children, no properties, empty script.
	pub fn new() -> Self {
		Self::default()
	}

	/// Override the reserved field (normally zero).
	pub fn reserved(mut self, value: i32) -> Self {
		self.reserved = value;
		self
	}

	/// Set the parent handle.
	pub fn super_struct(mut self, index: i32) -> Self {
		self.super_struct = index;
		self
	}

	/// Set child handles in order.
	pub fn children(mut self, children: &[i32]) -> Self {
		self.children = children.to_vec();
		self
	}

	/// Include an inline property section with `count` and pre-encoded bytes.
	pub fn properties(mut self, count: i32, encoded: Vec<u8>) -> Self {
		self.properties = Some((count, encoded));
		self
	}

	/// Set the script instruction count and block bytes.
	pub fn script(mut self, instruction_count: i32, block: Vec<u8>) -> Self {
		self.instruction_count = instruction_count;
		self.script = block;
		self
	}

	/// Override the storage length prefix (normally the block length).
	pub fn storage_len(mut self, len: i32) -> Self {
		self.storage_len = Some(len);
		self
	}

	/// Assemble the record body.
	pub fn build(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(&self.reserved.to_le_bytes());
		out.extend_from_slice(&self.super_struct.to_le_bytes());
		out.extend_from_slice(&(self.children.len() as i32).to_le_bytes());
		for child in &self.children {
			out.extend_from_slice(&child.to_le_bytes());
		}
		if let Some((count, encoded)) = &self.properties {
			out.extend_from_slice(&count.to_le_bytes());
			out.extend_from_slice(encoded);
		}
		out.extend_from_slice(&self.instruction_count.to_le_bytes());
		let storage_len = self.storage_len.unwrap_or(self.script.len() as i32);
		out.extend_from_slice(&storage_len.to_le_bytes());
		out.extend_from_slice(&self.script);
		out
	}
}

/// Encode an 8-bit length-prefixed string with its terminator.
pub fn fstring(text: &str) -> Vec<u8> {
	let mut out = Vec::with_capacity(text.len() + 5);
	out.extend_from_slice(&(text.len() as i32 + 1).to_le_bytes());
	out.extend_from_slice(text.as_bytes());
	out.push(0);
	out
}

/// Deterministic pseudo-random 16 bytes for `seed` (splitmix64).
pub fn pseudo_random_guid_bytes(seed: u64) -> [u8; 16] {
	let mut state = seed;
	let mut next = || {
		state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
		let mut z = state;
		z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
		z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
		z ^ (z >> 31)
	};

	let mut out = [0_u8; 16];
	out[..8].copy_from_slice(&next().to_le_bytes());
	out[8..].copy_from_slice(&next().to_le_bytes());
	out
}

/// Build a GUID update document with one class holding `(component, dummy, production)` rows.
pub fn guid_updates_json(class_name: &str, rows: &[(&str, &str, &str)]) -> String {
	let components: Vec<serde_json::Value> = rows
		.iter()
		.map(|(component, dummy, production)| {
			serde_json::json!({
				"ComponentName": component,
				"DummyGuid": dummy,
				"ProductionGuid": production,
			})
		})
		.collect();

	serde_json::json!([{ "ClassName": class_name, "GuidUpdateComponents": components }]).to_string()
}

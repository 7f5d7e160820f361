use std::fmt;
use std::io::{Seek, Write};

use serde::{Deserialize, Serialize};

use crate::asset::bytes::Cursor;
use crate::asset::kismet::{decode_script, write_expr};
use crate::asset::{Expr, ExportError, GuidRemap, PackageIndex, PropertyContext, PropertyValue, Result, VersionGate, Writer};

/// Legacy placeholder written after the base header; always zero on disk.
pub const RESERVED_ZERO: i32 = 0;

/// Runtime switches for struct-export decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
	/// Attempt structural decoding of script bytecode before keeping raw bytes.
	pub decode_bytecode: bool,
	/// Maximum nesting of script instructions inside one another.
	pub max_expr_depth: u32,
}

impl Default for ReadOptions {
	fn default() -> Self {
		Self {
			decode_bytecode: true,
			max_expr_depth: 64,
		}
	}
}

impl ReadOptions {
	/// Preset that always keeps script blocks as raw bytes.
	pub fn raw_bytecode() -> Self {
		Self {
			decode_bytecode: false,
			..Self::default()
		}
	}
}

/// Inputs consulted while reading one record.
#[derive(Clone, Default)]
pub struct ReadContext<'a> {
	/// Format revision of the enclosing container.
	pub gate: VersionGate,
	/// Decode switches.
	pub options: ReadOptions,
	/// Replacement applied to decoded GUID property values.
	pub guid_remap: Option<&'a dyn GuidRemap>,
}

impl<'a> ReadContext<'a> {
	/// Context with default options and no remap.
	pub fn new(gate: VersionGate) -> Self {
		Self {
			gate,
			options: ReadOptions::default(),
			guid_remap: None,
		}
	}

	/// Replace the decode options.
	pub fn with_options(mut self, options: ReadOptions) -> Self {
		self.options = options;
		self
	}

	/// Inject a GUID remap strategy.
	pub fn with_guid_remap(mut self, remap: &'a dyn GuidRemap) -> Self {
		self.guid_remap = Some(remap);
		self
	}

	fn property_context(&self) -> PropertyContext<'a> {
		PropertyContext {
			length_hint: None,
			guid_remap: self.guid_remap,
		}
	}
}

impl fmt::Debug for ReadContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReadContext")
			.field("gate", &self.gate)
			.field("options", &self.options)
			.field("guid_remap", &self.guid_remap.is_some())
			.finish()
	}
}

/// Base export header preceding the struct-specific fields.
///
/// The enclosing container owns this layout; `()` reads and writes nothing
/// for callers that have already consumed it.
pub trait ExportBase: Sized {
	/// Read the base header.
	fn read(cursor: &mut Cursor<'_>, gate: VersionGate) -> Result<Self>;

	/// Write the base header.
	fn write<W: Write + Seek>(&self, writer: &mut Writer<W>, gate: VersionGate) -> Result<()>;
}

impl ExportBase for () {
	fn read(_cursor: &mut Cursor<'_>, _gate: VersionGate) -> Result<Self> {
		Ok(())
	}

	fn write<W: Write + Seek>(&self, _writer: &mut Writer<W>, _gate: VersionGate) -> Result<()> {
		Ok(())
	}
}

/// Script block of a struct export, either decoded or kept verbatim.
///
/// An empty block is always read back as `Raw`, so `Decoded(vec![])` writes the
/// same bytes as `Raw(vec![])` but does not compare equal to the record read
/// back from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptBytecode {
	/// Structurally decoded instructions.
	Decoded(Vec<Expr>),
	/// Undecoded block bytes, written back unchanged.
	Raw(Vec<u8>),
}

impl Default for ScriptBytecode {
	fn default() -> Self {
		Self::Raw(Vec::new())
	}
}

impl ScriptBytecode {
	/// Decoded instructions, if the block was understood.
	pub fn decoded(&self) -> Option<&[Expr]> {
		match self {
			Self::Decoded(exprs) => Some(exprs),
			Self::Raw(_) => None,
		}
	}

	/// Raw bytes, if the block was kept verbatim.
	pub fn raw(&self) -> Option<&[u8]> {
		match self {
			Self::Decoded(_) => None,
			Self::Raw(bytes) => Some(bytes),
		}
	}
}

/// One struct-export record: parent, child fields, inline properties, and script.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructExport<B = ()> {
	/// Base export header.
	pub base: B,
	/// Struct this one inherits from; may be null.
	pub super_struct: PackageIndex,
	/// Child fields in declaration order.
	pub children: Vec<PackageIndex>,
	/// Properties serialized inline with the definition; empty when the
	/// format revision predates them.
	pub loaded_properties: Vec<PropertyValue>,
	/// Instruction count as stored on disk. Written back unchanged for both
	/// representations; it is never reconciled with the block contents, and
	/// [`StructExport::set_instructions`] resets it to the new count.
	pub script_bytecode_size: i32,
	/// Script block contents.
	pub script: ScriptBytecode,
}

impl<B: ExportBase> StructExport<B> {
	/// Read one record.
	///
	/// A script block that cannot be decoded, or whose decoding is disabled, is
	/// kept as raw bytes; only failures in the surrounding fields are returned.
	pub fn read(cursor: &mut Cursor<'_>, ctx: &ReadContext<'_>) -> Result<Self> {
		let start = cursor.pos();
		let base = B::read(cursor, ctx.gate)?;
		let _reserved = cursor.read_i32_le()?;

		let super_struct = PackageIndex::read(cursor)?;

		let child_count = cursor.read_count("child count")?;
		let mut children = Vec::with_capacity(child_count.min(cursor.remaining() / 4));
		for _ in 0..child_count {
			children.push(PackageIndex::read(cursor)?);
		}

		let loaded_properties = if ctx.gate.has_inline_properties() {
			let prop_ctx = ctx.property_context();
			let prop_count = cursor.read_count("property count")?;
			let mut props = Vec::with_capacity(prop_count.min(cursor.remaining()));
			for _ in 0..prop_count {
				props.push(PropertyValue::read_tagged(cursor, &prop_ctx)?);
			}
			props
		} else {
			Vec::new()
		};

		let script_bytecode_size = cursor.read_i32_le()?;
		let storage_size = cursor.read_count("script storage size")?;
		let script = read_script(cursor, storage_size, &ctx.options)?;

		tracing::trace!(
			offset = start,
			children = children.len(),
			properties = loaded_properties.len(),
			decoded = matches!(script, ScriptBytecode::Decoded(_)),
			"struct export read"
		);

		Ok(Self {
			base,
			super_struct,
			children,
			loaded_properties,
			script_bytecode_size,
			script,
		})
	}

	/// Read one record from a standalone byte buffer.
	pub fn from_bytes(bytes: &[u8], ctx: &ReadContext<'_>) -> Result<Self> {
		Self::read(&mut Cursor::new(bytes), ctx)
	}

	/// Write the record, returning the number of bytes emitted.
	///
	/// Decoded scripts get their storage length backpatched after encoding, so
	/// the sink must be seekable.
	pub fn write<W: Write + Seek>(&self, writer: &mut Writer<W>, gate: VersionGate) -> Result<usize> {
		let start = writer.position()?;
		self.base.write(writer, gate)?;
		writer.write_i32_le(RESERVED_ZERO)?;

		self.super_struct.write(writer)?;

		writer.write_count("child count", self.children.len())?;
		for child in &self.children {
			child.write(writer)?;
		}

		if gate.has_inline_properties() {
			writer.write_count("property count", self.loaded_properties.len())?;
			for prop in &self.loaded_properties {
				prop.write_tagged(writer)?;
			}
		}

		writer.write_i32_le(self.script_bytecode_size)?;
		match &self.script {
			ScriptBytecode::Raw(bytes) => {
				writer.write_count("script storage size", bytes.len())?;
				writer.write_bytes(bytes)?;
			}
			ScriptBytecode::Decoded(exprs) => {
				let length_offset = writer.position()?;
				writer.write_i32_le(0)?;

				let block_start = writer.position()?;
				for expr in exprs {
					write_expr(expr, writer)?;
				}
				let block_end = writer.position()?;

				let len = block_end - block_start;
				let storage_size = i32::try_from(len).map_err(|_| ExportError::ScriptTooLarge { len })?;
				writer.seek_to(length_offset)?;
				writer.write_i32_le(storage_size)?;
				writer.seek_to(block_end)?;
			}
		}

		Ok((writer.position()? - start) as usize)
	}

	/// Replace the script with `exprs` and set the stored instruction count to
	/// match.
	pub fn set_instructions(&mut self, exprs: Vec<Expr>) -> Result<()> {
		self.script_bytecode_size = i32::try_from(exprs.len()).map_err(|_| ExportError::CountOverflow {
			what: "script instruction count",
			count: exprs.len(),
		})?;
		self.script = ScriptBytecode::Decoded(exprs);
		Ok(())
	}

	/// Encode the record into a fresh buffer.
	pub fn to_bytes(&self, gate: VersionGate) -> Result<Vec<u8>> {
		let mut writer = Writer::new(std::io::Cursor::new(Vec::new()));
		self.write(&mut writer, gate)?;
		Ok(writer.into_inner().into_inner())
	}
}

fn read_script(cursor: &mut Cursor<'_>, storage_size: usize, options: &ReadOptions) -> Result<ScriptBytecode> {
	let start = cursor.pos();
	let block = cursor.read_exact(storage_size)?;

	// Empty blocks stay raw so an untouched record compares equal after a round trip.
	if options.decode_bytecode && !block.is_empty() {
		// Decoding runs over the block slice only; the outer cursor already sits
		// at the block end whichever representation is kept.
		match decode_script(block, options.max_expr_depth) {
			Ok(exprs) => return Ok(ScriptBytecode::Decoded(exprs)),
			Err(err) => {
				tracing::debug!(offset = start, len = storage_size, error = %err, "script decode failed, keeping raw bytes");
			}
		}
	}

	Ok(ScriptBytecode::Raw(block.to_vec()))
}

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{Seek, Write};

use serde::{Deserialize, Serialize};

use crate::asset::bytes::Cursor;
use crate::asset::{ExportError, Guid, GuidRemap, Result, Writer};

/// Registered property value encodings, keyed by their type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
	/// 16-byte identifier.
	Guid,
	/// Signed 32-bit integer.
	Int,
	/// Signed 64-bit integer.
	Int64,
	/// 32-bit float.
	Float,
	/// 64-bit float.
	Double,
	/// Length-prefixed string.
	Str,
}

impl PropertyKind {
	/// Every registered kind, in tag-table order.
	pub const ALL: [Self; 6] = [Self::Guid, Self::Int, Self::Int64, Self::Float, Self::Double, Self::Str];

	/// On-disk type tag.
	pub fn tag(self) -> &'static str {
		match self {
			Self::Guid => "Guid",
			Self::Int => "IntProperty",
			Self::Int64 => "Int64Property",
			Self::Float => "FloatProperty",
			Self::Double => "DoubleProperty",
			Self::Str => "StrProperty",
		}
	}

	/// Resolve a type tag to its kind.
	pub fn from_tag(tag: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|kind| kind.tag() == tag)
	}
}

/// Payload of one property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyData {
	/// `Guid` payload.
	Guid(Guid),
	/// `IntProperty` payload.
	Int(i32),
	/// `Int64Property` payload.
	Int64(i64),
	/// `FloatProperty` payload.
	Float(f32),
	/// `DoubleProperty` payload.
	Double(f64),
	/// `StrProperty` payload; `None` is the null string.
	Str {
		/// String contents.
		value: Option<String>,
		/// Whether the string is stored as UTF-16.
		wide: bool,
	},
}

impl PropertyData {
	/// Kind of this payload.
	pub fn kind(&self) -> PropertyKind {
		match self {
			Self::Guid(_) => PropertyKind::Guid,
			Self::Int(_) => PropertyKind::Int,
			Self::Int64(_) => PropertyKind::Int64,
			Self::Float(_) => PropertyKind::Float,
			Self::Double(_) => PropertyKind::Double,
			Self::Str { .. } => PropertyKind::Str,
		}
	}

	/// Parse the textual form produced by [`fmt::Display`] for `kind`.
	///
	/// `StrProperty` text always parses to a non-null string, stored as UTF-16
	/// only when it holds characters outside Latin-1. A null string or a wide
	/// Latin-1 string therefore does not survive a text round trip unchanged.
	pub fn parse(kind: PropertyKind, text: &str) -> Result<Self> {
		let invalid = || ExportError::InvalidPropertyText {
			tag: kind.tag(),
			text: text.to_owned(),
		};
		Ok(match kind {
			PropertyKind::Guid => Self::Guid(text.parse()?),
			PropertyKind::Int => Self::Int(text.trim().parse().map_err(|_| invalid())?),
			PropertyKind::Int64 => Self::Int64(text.trim().parse().map_err(|_| invalid())?),
			PropertyKind::Float => Self::Float(text.trim().parse().map_err(|_| invalid())?),
			PropertyKind::Double => Self::Double(text.trim().parse().map_err(|_| invalid())?),
			PropertyKind::Str => Self::Str {
				value: Some(text.to_owned()),
				wide: text.chars().any(|ch| u32::from(ch) > 0xFF),
			},
		})
	}
}

impl fmt::Display for PropertyData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Guid(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::Int64(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::Double(value) => write!(f, "{value}"),
			Self::Str { value, .. } => f.write_str(value.as_deref().unwrap_or_default()),
		}
	}
}

/// Outer-context inputs for reading one property value.
#[derive(Clone, Copy, Default)]
pub struct PropertyContext<'a> {
	/// Payload length declared by the enclosing container, when known.
	pub length_hint: Option<u64>,
	/// Replacement applied to decoded GUID payloads.
	pub guid_remap: Option<&'a dyn GuidRemap>,
}

impl fmt::Debug for PropertyContext<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PropertyContext")
			.field("length_hint", &self.length_hint)
			.field("guid_remap", &self.guid_remap.is_some())
			.finish()
	}
}

/// One decoded property value with its optional header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
	/// Property header identifier, present when read with a header.
	pub header: Option<Guid>,
	/// Variant payload.
	pub data: PropertyData,
}

impl PropertyValue {
	/// Value without a header.
	pub fn new(data: PropertyData) -> Self {
		Self { header: None, data }
	}

	/// Value carrying a header identifier.
	pub fn with_header(header: Guid, data: PropertyData) -> Self {
		Self { header: Some(header), data }
	}

	/// Kind of the payload.
	pub fn kind(&self) -> PropertyKind {
		self.data.kind()
	}

	/// On-disk type tag of the payload.
	pub fn tag(&self) -> &'static str {
		self.kind().tag()
	}

	/// Read a value whose type tag was supplied by the outer context.
	pub fn read(cursor: &mut Cursor<'_>, tag: &str, include_header: bool, ctx: &PropertyContext<'_>) -> Result<Self> {
		let kind = PropertyKind::from_tag(tag).ok_or_else(|| ExportError::UnknownPropertyType { tag: tag.to_owned() })?;
		Self::read_kind(cursor, kind, include_header, ctx)
	}

	/// Read a value of a known kind.
	pub fn read_kind(cursor: &mut Cursor<'_>, kind: PropertyKind, include_header: bool, ctx: &PropertyContext<'_>) -> Result<Self> {
		let header = if include_header {
			Some(Guid::from_bytes(cursor.read_array()?))
		} else {
			None
		};

		let data = match kind {
			PropertyKind::Guid => {
				let value = Guid::from_bytes(cursor.read_array()?);
				let value = ctx.guid_remap.and_then(|remap| remap.remap(value)).unwrap_or(value);
				PropertyData::Guid(value)
			}
			PropertyKind::Int => PropertyData::Int(cursor.read_i32_le()?),
			PropertyKind::Int64 => PropertyData::Int64(cursor.read_i64_le()?),
			PropertyKind::Float => PropertyData::Float(cursor.read_f32_le()?),
			PropertyKind::Double => PropertyData::Double(cursor.read_f64_le()?),
			PropertyKind::Str => {
				let start = cursor.pos();
				let (value, wide) = cursor.read_fstring()?;
				let actual = (cursor.pos() - start) as u64;
				if let Some(hint) = ctx.length_hint.filter(|hint| *hint != actual) {
					return Err(ExportError::PropertyLengthMismatch {
						tag: kind.tag(),
						hint,
						actual,
					});
				}
				PropertyData::Str { value, wide }
			}
		};

		Ok(Self { header, data })
	}

	/// Write the value, returning the payload size in bytes (header excluded).
	///
	/// A missing header is written as all zeros when `include_header` is set.
	pub fn write<W: Write + Seek>(&self, writer: &mut Writer<W>, include_header: bool) -> Result<usize> {
		if include_header {
			writer.write_bytes(&self.header.unwrap_or(Guid::ZERO).to_bytes())?;
		}

		let start = writer.position()?;
		match &self.data {
			PropertyData::Guid(value) => writer.write_bytes(&value.to_bytes())?,
			PropertyData::Int(value) => writer.write_i32_le(*value)?,
			PropertyData::Int64(value) => writer.write_i64_le(*value)?,
			PropertyData::Float(value) => writer.write_f32_le(*value)?,
			PropertyData::Double(value) => writer.write_f64_le(*value)?,
			PropertyData::Str { value, wide } => writer.write_fstring(value.as_deref(), *wide)?,
		}
		Ok((writer.position()? - start) as usize)
	}

	/// Read a type tag string followed by a headed value.
	pub fn read_tagged(cursor: &mut Cursor<'_>, ctx: &PropertyContext<'_>) -> Result<Self> {
		let (tag, _) = cursor.read_fstring()?;
		Self::read(cursor, tag.as_deref().unwrap_or_default(), true, ctx)
	}

	/// Write the type tag string followed by the headed value.
	pub fn write_tagged<W: Write + Seek>(&self, writer: &mut Writer<W>) -> Result<usize> {
		writer.write_fstring(Some(self.tag()), false)?;
		self.write(writer, true)
	}
}

impl fmt::Display for PropertyValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.data, f)
	}
}

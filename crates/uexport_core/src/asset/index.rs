use std::io::{Seek, Write};

use serde::{Deserialize, Serialize};

use crate::asset::bytes::Cursor;
use crate::asset::{Result, Writer};

/// Signed handle into the container's export or import table.
///
/// `0` is null. Positive values are 1-based export indices and negative values
/// are 1-based import indices by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIndex(pub i32);

impl PackageIndex {
	/// The null handle.
	pub const NULL: Self = Self(0);

	/// Wrap a raw on-disk value.
	pub fn new(index: i32) -> Self {
		Self(index)
	}

	/// Handle for the 0-based export table slot.
	pub fn from_export(slot: usize) -> Option<Self> {
		i32::try_from(slot).ok()?.checked_add(1).map(Self)
	}

	/// Handle for the 0-based import table slot.
	pub fn from_import(slot: usize) -> Option<Self> {
		i32::try_from(slot).ok()?.checked_add(1).map(|index| Self(-index))
	}

	/// Return the raw on-disk value.
	pub fn index(self) -> i32 {
		self.0
	}

	/// Whether this is the null handle.
	pub fn is_null(self) -> bool {
		self.0 == 0
	}

	/// 0-based export table slot, when this handle points at an export.
	pub fn export_slot(self) -> Option<usize> {
		(self.0 > 0).then(|| (self.0 - 1) as usize)
	}

	/// 0-based import table slot, when this handle points at an import.
	pub fn import_slot(self) -> Option<usize> {
		(self.0 < 0).then(|| (self.0.unsigned_abs() - 1) as usize)
	}

	pub(crate) fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
		Ok(Self(cursor.read_i32_le()?))
	}

	pub(crate) fn write<W: Write + Seek>(self, writer: &mut Writer<W>) -> Result<()> {
		writer.write_i32_le(self.0)
	}
}

impl From<i32> for PackageIndex {
	fn from(index: i32) -> Self {
		Self(index)
	}
}

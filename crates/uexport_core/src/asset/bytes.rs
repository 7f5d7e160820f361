use std::io::{Seek, SeekFrom, Write};

use crate::asset::{ExportError, Result};

/// Simple bounded little-endian cursor over an immutable byte slice.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Move to an absolute offset within the underlying slice.
	pub fn seek(&mut self, pos: usize) -> Result<()> {
		if pos > self.bytes.len() {
			return Err(ExportError::UnexpectedEof {
				at: self.pos,
				need: pos - self.pos,
				rem: self.remaining(),
			});
		}
		self.pos = pos;
		Ok(())
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(ExportError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a fixed-size byte array.
	pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		let raw = self.read_exact(N)?;
		let mut out = [0_u8; N];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read one byte.
	pub fn read_u8(&mut self) -> Result<u8> {
		Ok(self.read_array::<1>()?[0])
	}

	/// Read a little-endian `u16`.
	pub fn read_u16_le(&mut self) -> Result<u16> {
		Ok(u16::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `u32`.
	pub fn read_u32_le(&mut self) -> Result<u32> {
		Ok(u32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `i32`.
	pub fn read_i32_le(&mut self) -> Result<i32> {
		Ok(i32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `u64`.
	pub fn read_u64_le(&mut self) -> Result<u64> {
		Ok(u64::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian `i64`.
	pub fn read_i64_le(&mut self) -> Result<i64> {
		Ok(i64::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian IEEE-754 `f32`.
	pub fn read_f32_le(&mut self) -> Result<f32> {
		Ok(f32::from_le_bytes(self.read_array()?))
	}

	/// Read a little-endian IEEE-754 `f64`.
	pub fn read_f64_le(&mut self) -> Result<f64> {
		Ok(f64::from_le_bytes(self.read_array()?))
	}

	/// Read an `i32` count prefix, rejecting negative values.
	pub fn read_count(&mut self, what: &'static str) -> Result<usize> {
		let at = self.pos;
		let count = self.read_i32_le()?;
		usize::try_from(count).map_err(|_| ExportError::NegativeCount { what, count, at })
	}

	/// Read a length-prefixed string.
	///
	/// Positive lengths are 8-bit characters and negative lengths UTF-16 units;
	/// both include the terminator. Zero is the null string. Returns the text and
	/// whether it was stored wide.
	pub fn read_fstring(&mut self) -> Result<(Option<String>, bool)> {
		let at = self.pos;
		let len = self.read_i32_le()?;
		if len == 0 {
			return Ok((None, false));
		}

		if len > 0 {
			let raw = self.read_exact(len as usize)?;
			let (body, nul) = raw.split_at(raw.len() - 1);
			if nul != [0] {
				return Err(ExportError::InvalidString { at });
			}
			return Ok((Some(latin1_to_string(body)), false));
		}

		let units = len.unsigned_abs() as usize;
		let need = units.checked_mul(2).ok_or(ExportError::InvalidString { at })?;
		let raw = self.read_exact(need)?;
		let mut wide: Vec<u16> = raw.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
		if wide.pop() != Some(0) {
			return Err(ExportError::InvalidString { at });
		}
		let text = String::from_utf16(&wide).map_err(|_| ExportError::InvalidString { at })?;
		Ok((Some(text), true))
	}

	/// Read a zero-terminated 8-bit string without the terminator.
	pub fn read_cstring(&mut self) -> Result<String> {
		let at = self.pos;
		let rem = &self.bytes[self.pos..];
		let Some(rel_end) = rem.iter().position(|byte| *byte == 0) else {
			return Err(ExportError::UnexpectedEof {
				at,
				need: rem.len() + 1,
				rem: rem.len(),
			});
		};

		let text = latin1_to_string(&rem[..rel_end]);
		self.pos = at + rel_end + 1;
		Ok(text)
	}

	/// Read a zero-terminated UTF-16 string without the terminator.
	pub fn read_utf16_cstring(&mut self) -> Result<String> {
		let at = self.pos;
		let mut units = Vec::new();
		loop {
			let unit = self.read_u16_le()?;
			if unit == 0 {
				break;
			}
			units.push(unit);
		}
		String::from_utf16(&units).map_err(|_| ExportError::InvalidString { at })
	}
}

/// Little-endian writer over a seekable sink.
///
/// Seeking is required so length prefixes can be backpatched once the
/// payload they describe has been written.
pub struct Writer<W> {
	inner: W,
}

impl<W: Write + Seek> Writer<W> {
	/// Wrap a seekable sink.
	pub fn new(inner: W) -> Self {
		Self { inner }
	}

	/// Unwrap the underlying sink.
	pub fn into_inner(self) -> W {
		self.inner
	}

	/// Return the current absolute offset.
	pub fn position(&mut self) -> Result<u64> {
		Ok(self.inner.stream_position()?)
	}

	/// Move to an absolute offset.
	pub fn seek_to(&mut self, pos: u64) -> Result<()> {
		self.inner.seek(SeekFrom::Start(pos))?;
		Ok(())
	}

	/// Write raw bytes verbatim.
	pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
		self.inner.write_all(bytes)?;
		Ok(())
	}

	/// Write one byte.
	pub fn write_u8(&mut self, value: u8) -> Result<()> {
		self.write_bytes(&[value])
	}

	/// Write a little-endian `u16`.
	pub fn write_u16_le(&mut self, value: u16) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian `u32`.
	pub fn write_u32_le(&mut self, value: u32) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian `i32`.
	pub fn write_i32_le(&mut self, value: i32) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian `u64`.
	pub fn write_u64_le(&mut self, value: u64) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian `i64`.
	pub fn write_i64_le(&mut self, value: i64) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian IEEE-754 `f32`.
	pub fn write_f32_le(&mut self, value: f32) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a little-endian IEEE-754 `f64`.
	pub fn write_f64_le(&mut self, value: f64) -> Result<()> {
		self.write_bytes(&value.to_le_bytes())
	}

	/// Write a collection length as an `i32` count prefix.
	pub fn write_count(&mut self, what: &'static str, count: usize) -> Result<()> {
		let prefix = i32::try_from(count).map_err(|_| ExportError::CountOverflow { what, count })?;
		self.write_i32_le(prefix)
	}

	/// Write a length-prefixed string, mirroring [`Cursor::read_fstring`].
	///
	/// Text with characters outside 8-bit range is always stored wide.
	pub fn write_fstring(&mut self, value: Option<&str>, wide: bool) -> Result<()> {
		let Some(text) = value else {
			return self.write_i32_le(0);
		};

		let at = self.position()? as usize;
		if wide || !is_latin1(text) {
			let mut units: Vec<u16> = text.encode_utf16().collect();
			units.push(0);
			let len = i32::try_from(units.len()).map_err(|_| ExportError::InvalidString { at })?;
			self.write_i32_le(-len)?;
			for unit in units {
				self.write_u16_le(unit)?;
			}
			return Ok(());
		}

		let mut raw = string_to_latin1(text).ok_or(ExportError::InvalidString { at })?;
		raw.push(0);
		let len = i32::try_from(raw.len()).map_err(|_| ExportError::InvalidString { at })?;
		self.write_i32_le(len)?;
		self.write_bytes(&raw)
	}

	/// Write a zero-terminated 8-bit string.
	pub fn write_cstring(&mut self, text: &str) -> Result<()> {
		let at = self.position()? as usize;
		let raw = string_to_latin1(text).filter(|raw| !raw.contains(&0)).ok_or(ExportError::InvalidString { at })?;
		self.write_bytes(&raw)?;
		self.write_u8(0)
	}

	/// Write a zero-terminated UTF-16 string.
	pub fn write_utf16_cstring(&mut self, text: &str) -> Result<()> {
		let at = self.position()? as usize;
		if text.contains('\0') {
			return Err(ExportError::InvalidString { at });
		}
		for unit in text.encode_utf16() {
			self.write_u16_le(unit)?;
		}
		self.write_u16_le(0)
	}
}

fn latin1_to_string(bytes: &[u8]) -> String {
	bytes.iter().map(|byte| char::from(*byte)).collect()
}

fn is_latin1(text: &str) -> bool {
	text.chars().all(|ch| u32::from(ch) <= 0xFF)
}

fn string_to_latin1(text: &str) -> Option<Vec<u8>> {
	text.chars().map(|ch| u8::try_from(u32::from(ch)).ok()).collect()
}

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors produced while decoding and encoding export records.
#[derive(Debug, Error)]
pub enum ExportError {
	/// Stream IO failure, including seek failures during backpatching.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// A count or length prefix was negative.
	#[error("negative {what} {count} at offset {at}")]
	NegativeCount {
		/// Logical kind of the count.
		what: &'static str,
		/// Parsed signed value.
		count: i32,
		/// Byte offset of the prefix.
		at: usize,
	},
	/// A collection was too long for its `i32` count prefix.
	#[error("{what} {count} does not fit a 32-bit count prefix")]
	CountOverflow {
		/// Logical kind of the count.
		what: &'static str,
		/// Collection length.
		count: usize,
	},
	/// Property type tag has no registered variant.
	#[error("unknown property type tag: {tag}")]
	UnknownPropertyType {
		/// Type tag as read from the stream or supplied by the caller.
		tag: String,
	},
	/// Variable-length property payload disagreed with the supplied length hint.
	#[error("property {tag} length mismatch: hint={hint}, actual={actual}")]
	PropertyLengthMismatch {
		/// Property type tag.
		tag: &'static str,
		/// Length supplied by the outer context.
		hint: u64,
		/// Bytes actually consumed.
		actual: u64,
	},
	/// Script opcode has no registered instruction.
	#[error("unknown script opcode 0x{opcode:02x} at offset {at}")]
	UnknownOpcode {
		/// Raw opcode byte.
		opcode: u8,
		/// Offset of the opcode within the script block.
		at: usize,
	},
	/// A script instruction ran past the declared end of its block.
	#[error("script overshoot: instruction at {at} runs past block length {target}")]
	ScriptOvershoot {
		/// Declared storage length of the block.
		target: usize,
		/// Block offset of the instruction's opcode.
		at: usize,
	},
	/// Nested script expressions exceeded the configured ceiling.
	#[error("script expression depth exceeded (max={max_depth})")]
	ExprDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Encoded script block does not fit the 32-bit length prefix.
	#[error("script block too large: {len} bytes")]
	ScriptTooLarge {
		/// Encoded length in bytes.
		len: u64,
	},
	/// String payload was missing its terminator or was not valid text.
	#[error("invalid string at offset {at}")]
	InvalidString {
		/// Offset of the string's first byte.
		at: usize,
	},
	/// GUID text was not in hyphenated hexadecimal form.
	#[error("invalid guid text: {text}")]
	InvalidGuidText {
		/// Offending input.
		text: String,
	},
	/// Property text could not be parsed for the given type.
	#[error("invalid {tag} text: {text}")]
	InvalidPropertyText {
		/// Property type tag.
		tag: &'static str,
		/// Offending input.
		text: String,
	},
	/// GUID remap document could not be parsed.
	#[error("invalid guid remap document: {0}")]
	InvalidRemapTable(#[from] serde_json::Error),
}

use std::io::{Seek, Write};

use serde::{Deserialize, Serialize};

use crate::asset::bytes::Cursor;
use crate::asset::{ExportError, PackageIndex, Result, Writer};

/// One-byte script instruction tags understood by this codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
	/// Return from the function with an expression result.
	Return = 0x04,
	/// Unconditional jump to a code offset.
	Jump = 0x06,
	/// Jump to a code offset when the condition is false.
	JumpIfNot = 0x07,
	/// Assertion with source line and debug flag.
	Assert = 0x09,
	/// No operation.
	Nothing = 0x0B,
	/// End of a function call's parameter list.
	EndFunctionParms = 0x16,
	/// The executing object.
	SelfObject = 0x17,
	/// Expression preceded by a skip offset.
	Skip = 0x18,
	/// 32-bit integer constant.
	IntConst = 0x1D,
	/// 32-bit float constant.
	FloatConst = 0x1E,
	/// 8-bit string constant.
	StringConst = 0x1F,
	/// Object reference constant.
	ObjectConst = 0x20,
	/// Byte constant.
	ByteConst = 0x24,
	/// Integer zero.
	IntZero = 0x25,
	/// Integer one.
	IntOne = 0x26,
	/// Boolean true.
	True = 0x27,
	/// Boolean false.
	False = 0x28,
	/// Null object.
	NoObject = 0x2A,
	/// Integer constant stored in one byte.
	IntConstByte = 0x2C,
	/// Null interface.
	NoInterface = 0x2D,
	/// UTF-16 string constant.
	UnicodeStringConst = 0x34,
	/// 64-bit integer constant.
	Int64Const = 0x35,
	/// Unsigned 64-bit integer constant.
	UInt64Const = 0x36,
	/// 64-bit float constant.
	DoubleConst = 0x37,
	/// Push a code offset on the execution flow stack.
	PushExecutionFlow = 0x4C,
	/// Pop the execution flow stack and jump.
	PopExecutionFlow = 0x4D,
	/// Jump to an offset computed by an expression.
	ComputedJump = 0x4E,
	/// Pop the execution flow stack when the condition is false.
	PopExecutionFlowIfNot = 0x4F,
	/// Debugger breakpoint.
	Breakpoint = 0x50,
	/// Interface context wrapper.
	InterfaceContext = 0x51,
	/// End of the script block.
	EndOfScript = 0x53,
	/// Wire tracepoint.
	WireTracepoint = 0x5A,
	/// Code offset constant.
	SkipOffsetConst = 0x5B,
	/// Tracepoint.
	Tracepoint = 0x5E,
}

impl Opcode {
	/// Raw on-disk tag.
	pub fn as_u8(self) -> u8 {
		self as u8
	}
}

impl TryFrom<u8> for Opcode {
	type Error = u8;

	fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
		Ok(match value {
			0x04 => Self::Return,
			0x06 => Self::Jump,
			0x07 => Self::JumpIfNot,
			0x09 => Self::Assert,
			0x0B => Self::Nothing,
			0x16 => Self::EndFunctionParms,
			0x17 => Self::SelfObject,
			0x18 => Self::Skip,
			0x1D => Self::IntConst,
			0x1E => Self::FloatConst,
			0x1F => Self::StringConst,
			0x20 => Self::ObjectConst,
			0x24 => Self::ByteConst,
			0x25 => Self::IntZero,
			0x26 => Self::IntOne,
			0x27 => Self::True,
			0x28 => Self::False,
			0x2A => Self::NoObject,
			0x2C => Self::IntConstByte,
			0x2D => Self::NoInterface,
			0x34 => Self::UnicodeStringConst,
			0x35 => Self::Int64Const,
			0x36 => Self::UInt64Const,
			0x37 => Self::DoubleConst,
			0x4C => Self::PushExecutionFlow,
			0x4D => Self::PopExecutionFlow,
			0x4E => Self::ComputedJump,
			0x4F => Self::PopExecutionFlowIfNot,
			0x50 => Self::Breakpoint,
			0x51 => Self::InterfaceContext,
			0x53 => Self::EndOfScript,
			0x5A => Self::WireTracepoint,
			0x5B => Self::SkipOffsetConst,
			0x5E => Self::Tracepoint,
			other => return Err(other),
		})
	}
}

/// One decoded script instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
	/// `Return`: result expression.
	Return(Box<Expr>),
	/// `Jump`: target code offset.
	Jump(u32),
	/// `JumpIfNot`: target code offset and condition.
	JumpIfNot {
		/// Target code offset.
		offset: u32,
		/// Condition expression.
		condition: Box<Expr>,
	},
	/// `Assert`: source line, debug-only flag, and condition.
	Assert {
		/// Source line number.
		line: u16,
		/// Debug-only flag byte; nonzero when the assertion only runs in debug
		/// builds. Kept as stored.
		debug_only: u8,
		/// Condition expression.
		condition: Box<Expr>,
	},
	/// `Nothing`.
	Nothing,
	/// `EndFunctionParms`.
	EndFunctionParms,
	/// `Self`.
	SelfObject,
	/// `Skip`: skip offset and skippable expression.
	Skip {
		/// Code offset to skip to.
		offset: u32,
		/// Skipped expression.
		expr: Box<Expr>,
	},
	/// `IntConst`.
	IntConst(i32),
	/// `FloatConst`.
	FloatConst(f32),
	/// `StringConst`.
	StringConst(String),
	/// `ObjectConst`.
	ObjectConst(PackageIndex),
	/// `ByteConst`.
	ByteConst(u8),
	/// `IntZero`.
	IntZero,
	/// `IntOne`.
	IntOne,
	/// `True`.
	True,
	/// `False`.
	False,
	/// `NoObject`.
	NoObject,
	/// `IntConstByte`.
	IntConstByte(u8),
	/// `NoInterface`.
	NoInterface,
	/// `UnicodeStringConst`.
	UnicodeStringConst(String),
	/// `Int64Const`.
	Int64Const(i64),
	/// `UInt64Const`.
	UInt64Const(u64),
	/// `DoubleConst`.
	DoubleConst(f64),
	/// `PushExecutionFlow`: resume code offset.
	PushExecutionFlow(u32),
	/// `PopExecutionFlow`.
	PopExecutionFlow,
	/// `ComputedJump`: offset expression.
	ComputedJump(Box<Expr>),
	/// `PopExecutionFlowIfNot`: condition.
	PopExecutionFlowIfNot(Box<Expr>),
	/// `Breakpoint`.
	Breakpoint,
	/// `InterfaceContext`: interface value expression.
	InterfaceContext(Box<Expr>),
	/// `EndOfScript`.
	EndOfScript,
	/// `WireTracepoint`.
	WireTracepoint,
	/// `SkipOffsetConst`.
	SkipOffsetConst(u32),
	/// `Tracepoint`.
	Tracepoint,
}

impl Expr {
	/// Tag identifying this instruction on disk.
	pub fn opcode(&self) -> Opcode {
		match self {
			Self::Return(_) => Opcode::Return,
			Self::Jump(_) => Opcode::Jump,
			Self::JumpIfNot { .. } => Opcode::JumpIfNot,
			Self::Assert { .. } => Opcode::Assert,
			Self::Nothing => Opcode::Nothing,
			Self::EndFunctionParms => Opcode::EndFunctionParms,
			Self::SelfObject => Opcode::SelfObject,
			Self::Skip { .. } => Opcode::Skip,
			Self::IntConst(_) => Opcode::IntConst,
			Self::FloatConst(_) => Opcode::FloatConst,
			Self::StringConst(_) => Opcode::StringConst,
			Self::ObjectConst(_) => Opcode::ObjectConst,
			Self::ByteConst(_) => Opcode::ByteConst,
			Self::IntZero => Opcode::IntZero,
			Self::IntOne => Opcode::IntOne,
			Self::True => Opcode::True,
			Self::False => Opcode::False,
			Self::NoObject => Opcode::NoObject,
			Self::IntConstByte(_) => Opcode::IntConstByte,
			Self::NoInterface => Opcode::NoInterface,
			Self::UnicodeStringConst(_) => Opcode::UnicodeStringConst,
			Self::Int64Const(_) => Opcode::Int64Const,
			Self::UInt64Const(_) => Opcode::UInt64Const,
			Self::DoubleConst(_) => Opcode::DoubleConst,
			Self::PushExecutionFlow(_) => Opcode::PushExecutionFlow,
			Self::PopExecutionFlow => Opcode::PopExecutionFlow,
			Self::ComputedJump(_) => Opcode::ComputedJump,
			Self::PopExecutionFlowIfNot(_) => Opcode::PopExecutionFlowIfNot,
			Self::Breakpoint => Opcode::Breakpoint,
			Self::InterfaceContext(_) => Opcode::InterfaceContext,
			Self::EndOfScript => Opcode::EndOfScript,
			Self::WireTracepoint => Opcode::WireTracepoint,
			Self::SkipOffsetConst(_) => Opcode::SkipOffsetConst,
			Self::Tracepoint => Opcode::Tracepoint,
		}
	}

	fn read_payload(opcode: Opcode, cursor: &mut Cursor<'_>, depth: u32, max_depth: u32) -> Result<Self> {
		Ok(match opcode {
			Opcode::Return => Self::Return(read_nested(cursor, depth, max_depth)?),
			Opcode::Jump => Self::Jump(cursor.read_u32_le()?),
			Opcode::JumpIfNot => {
				let offset = cursor.read_u32_le()?;
				Self::JumpIfNot {
					offset,
					condition: read_nested(cursor, depth, max_depth)?,
				}
			}
			Opcode::Assert => {
				let line = cursor.read_u16_le()?;
				let debug_only = cursor.read_u8()?;
				Self::Assert {
					line,
					debug_only,
					condition: read_nested(cursor, depth, max_depth)?,
				}
			}
			Opcode::Nothing => Self::Nothing,
			Opcode::EndFunctionParms => Self::EndFunctionParms,
			Opcode::SelfObject => Self::SelfObject,
			Opcode::Skip => {
				let offset = cursor.read_u32_le()?;
				Self::Skip {
					offset,
					expr: read_nested(cursor, depth, max_depth)?,
				}
			}
			Opcode::IntConst => Self::IntConst(cursor.read_i32_le()?),
			Opcode::FloatConst => Self::FloatConst(cursor.read_f32_le()?),
			Opcode::StringConst => Self::StringConst(cursor.read_cstring()?),
			Opcode::ObjectConst => Self::ObjectConst(PackageIndex::read(cursor)?),
			Opcode::ByteConst => Self::ByteConst(cursor.read_u8()?),
			Opcode::IntZero => Self::IntZero,
			Opcode::IntOne => Self::IntOne,
			Opcode::True => Self::True,
			Opcode::False => Self::False,
			Opcode::NoObject => Self::NoObject,
			Opcode::IntConstByte => Self::IntConstByte(cursor.read_u8()?),
			Opcode::NoInterface => Self::NoInterface,
			Opcode::UnicodeStringConst => Self::UnicodeStringConst(cursor.read_utf16_cstring()?),
			Opcode::Int64Const => Self::Int64Const(cursor.read_i64_le()?),
			Opcode::UInt64Const => Self::UInt64Const(cursor.read_u64_le()?),
			Opcode::DoubleConst => Self::DoubleConst(cursor.read_f64_le()?),
			Opcode::PushExecutionFlow => Self::PushExecutionFlow(cursor.read_u32_le()?),
			Opcode::PopExecutionFlow => Self::PopExecutionFlow,
			Opcode::ComputedJump => Self::ComputedJump(read_nested(cursor, depth, max_depth)?),
			Opcode::PopExecutionFlowIfNot => Self::PopExecutionFlowIfNot(read_nested(cursor, depth, max_depth)?),
			Opcode::Breakpoint => Self::Breakpoint,
			Opcode::InterfaceContext => Self::InterfaceContext(read_nested(cursor, depth, max_depth)?),
			Opcode::EndOfScript => Self::EndOfScript,
			Opcode::WireTracepoint => Self::WireTracepoint,
			Opcode::SkipOffsetConst => Self::SkipOffsetConst(cursor.read_u32_le()?),
			Opcode::Tracepoint => Self::Tracepoint,
		})
	}

	/// Serialize the payload (without the opcode tag).
	///
	/// Returns the number of bytes written out-of-band relative to another part
	/// of the stream; zero for every instruction in this set.
	pub fn write_payload<W: Write + Seek>(&self, writer: &mut Writer<W>) -> Result<usize> {
		match self {
			Self::Return(expr) | Self::ComputedJump(expr) | Self::PopExecutionFlowIfNot(expr) | Self::InterfaceContext(expr) => write_expr(expr, writer),
			Self::Jump(offset) | Self::PushExecutionFlow(offset) | Self::SkipOffsetConst(offset) => {
				writer.write_u32_le(*offset)?;
				Ok(0)
			}
			Self::JumpIfNot { offset, condition } => {
				writer.write_u32_le(*offset)?;
				write_expr(condition, writer)
			}
			Self::Assert { line, debug_only, condition } => {
				writer.write_u16_le(*line)?;
				writer.write_u8(*debug_only)?;
				write_expr(condition, writer)
			}
			Self::Skip { offset, expr } => {
				writer.write_u32_le(*offset)?;
				write_expr(expr, writer)
			}
			Self::IntConst(value) => {
				writer.write_i32_le(*value)?;
				Ok(0)
			}
			Self::FloatConst(value) => {
				writer.write_f32_le(*value)?;
				Ok(0)
			}
			Self::StringConst(value) => {
				writer.write_cstring(value)?;
				Ok(0)
			}
			Self::ObjectConst(index) => {
				index.write(writer)?;
				Ok(0)
			}
			Self::ByteConst(value) | Self::IntConstByte(value) => {
				writer.write_u8(*value)?;
				Ok(0)
			}
			Self::UnicodeStringConst(value) => {
				writer.write_utf16_cstring(value)?;
				Ok(0)
			}
			Self::Int64Const(value) => {
				writer.write_i64_le(*value)?;
				Ok(0)
			}
			Self::UInt64Const(value) => {
				writer.write_u64_le(*value)?;
				Ok(0)
			}
			Self::DoubleConst(value) => {
				writer.write_f64_le(*value)?;
				Ok(0)
			}
			Self::Nothing
			| Self::EndFunctionParms
			| Self::SelfObject
			| Self::IntZero
			| Self::IntOne
			| Self::True
			| Self::False
			| Self::NoObject
			| Self::NoInterface
			| Self::PopExecutionFlow
			| Self::Breakpoint
			| Self::EndOfScript
			| Self::WireTracepoint
			| Self::Tracepoint => Ok(0),
		}
	}
}

/// Read one tagged instruction, nesting at most `max_depth` levels.
pub fn read_expr(cursor: &mut Cursor<'_>, max_depth: u32) -> Result<Expr> {
	read_expr_at(cursor, 0, max_depth)
}

fn read_expr_at(cursor: &mut Cursor<'_>, depth: u32, max_depth: u32) -> Result<Expr> {
	if depth >= max_depth {
		return Err(ExportError::ExprDepthExceeded { max_depth });
	}

	let at = cursor.pos();
	let raw = cursor.read_u8()?;
	let opcode = Opcode::try_from(raw).map_err(|opcode| ExportError::UnknownOpcode { opcode, at })?;
	Expr::read_payload(opcode, cursor, depth, max_depth)
}

fn read_nested(cursor: &mut Cursor<'_>, depth: u32, max_depth: u32) -> Result<Box<Expr>> {
	read_expr_at(cursor, depth + 1, max_depth).map(Box::new)
}

/// Write one instruction with its opcode tag, returning its out-of-band byte count.
pub fn write_expr<W: Write + Seek>(expr: &Expr, writer: &mut Writer<W>) -> Result<usize> {
	writer.write_u8(expr.opcode().as_u8())?;
	expr.write_payload(writer)
}

/// Decode a complete script block.
///
/// Instructions are read until exactly `block.len()` bytes are consumed. An
/// unknown opcode, a truncated payload, or an instruction running past the end
/// of the block fails the whole block.
pub fn decode_script(block: &[u8], max_depth: u32) -> Result<Vec<Expr>> {
	let mut cursor = Cursor::new(block);
	let mut out = Vec::new();
	while cursor.pos() < block.len() {
		let at = cursor.pos();
		let expr = read_expr(&mut cursor, max_depth).map_err(|err| match err {
			ExportError::UnexpectedEof { .. } => ExportError::ScriptOvershoot { target: block.len(), at },
			other => other,
		})?;
		out.push(expr);
	}
	Ok(out)
}

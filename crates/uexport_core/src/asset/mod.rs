mod bytes;
mod error;
mod export;
mod guid;
mod index;
mod kismet;
mod property;
mod version;

/// Bounded little-endian reader and seekable writer.
pub use bytes::{Cursor, Writer};
/// Error and result aliases.
pub use error::{ExportError, Result};
/// Struct-export record codec, read configuration, and base-header seam.
pub use export::{ExportBase, ReadContext, ReadOptions, RESERVED_ZERO, ScriptBytecode, StructExport};
/// GUID value type and injected remap strategies.
pub use guid::{Guid, GuidRemap, GuidRemapTable, GuidUpdate, GuidUpdateComponent};
/// Signed import/export table handle.
pub use index::PackageIndex;
/// Script bytecode instruction set and block decoder.
pub use kismet::{Expr, Opcode, decode_script, read_expr, write_expr};
/// Tagged property value codec.
pub use property::{PropertyContext, PropertyData, PropertyKind, PropertyValue};
/// Format revision markers and gates.
pub use version::{CoreObjectVersion, VersionGate};

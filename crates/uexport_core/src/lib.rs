//! Codec for struct-export records, tagged property values, and script bytecode in versioned engine assets.

/// Struct-export decoding and encoding, property values, and script bytecode.
pub mod asset;

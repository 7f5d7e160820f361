use std::io::{Seek, Write};

use pretty_assertions::assert_eq;
use uexport_testkit::{RecordBytes, fstring, pseudo_random_guid_bytes};

use crate::asset::bytes::Cursor;
use crate::asset::{
	CoreObjectVersion, ExportBase, ExportError, Expr, Guid, GuidRemapTable, PackageIndex, PropertyData, PropertyValue, ReadContext, ReadOptions, Result,
	ScriptBytecode, StructExport, VersionGate, Writer,
};

fn legacy<'a>() -> ReadContext<'a> {
	ReadContext::new(VersionGate::new(CoreObjectVersion::BEFORE_CUSTOM_VERSION))
}

fn current<'a>() -> ReadContext<'a> {
	ReadContext::new(VersionGate::with_inline_properties())
}

#[test]
fn reserved_field_is_discarded_and_rewritten_as_zero() {
	let bytes = RecordBytes::new().reserved(0x1234).super_struct(2).build();
	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(record.super_struct, PackageIndex::new(2));

	let rewritten = record.to_bytes(legacy().gate).expect("record writes");
	assert_eq!(&rewritten[..4], &[0, 0, 0, 0]);
	assert_eq!(&rewritten[4..], &bytes[4..]);
}

#[test]
fn legacy_gate_has_no_property_section() {
	let bytes = RecordBytes::new().children(&[1, -1]).build();
	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert!(record.loaded_properties.is_empty());
	assert_eq!(record.to_bytes(legacy().gate).expect("record writes"), bytes);
}

#[test]
fn inline_properties_are_dispatched_by_tag() {
	let header = Guid::from_bytes(pseudo_random_guid_bytes(1));
	let payload = Guid::from_bytes(pseudo_random_guid_bytes(2));

	let mut props = fstring("Guid");
	props.extend_from_slice(&header.to_bytes());
	props.extend_from_slice(&payload.to_bytes());
	props.extend_from_slice(&fstring("IntProperty"));
	props.extend_from_slice(&[0; 16]);
	props.extend_from_slice(&41_i32.to_le_bytes());

	let bytes = RecordBytes::new().properties(2, props).build();
	let record: StructExport = StructExport::from_bytes(&bytes, &current()).expect("record reads");
	assert_eq!(
		record.loaded_properties,
		vec![
			PropertyValue::with_header(header, PropertyData::Guid(payload)),
			PropertyValue::with_header(Guid::ZERO, PropertyData::Int(41)),
		]
	);
	assert_eq!(record.to_bytes(current().gate).expect("record writes"), bytes);
}

#[test]
fn unknown_property_tag_fails_the_record() {
	let mut props = fstring("MulticastDelegateProperty");
	props.extend_from_slice(&[0; 32]);
	let bytes = RecordBytes::new().properties(1, props).build();

	let err = StructExport::<()>::from_bytes(&bytes, &current()).expect_err("unregistered tag");
	assert!(matches!(err, ExportError::UnknownPropertyType { .. }));
}

#[test]
fn remap_reaches_inline_guid_properties() {
	let dummy = Guid::from_bytes(pseudo_random_guid_bytes(11));
	let production = Guid::from_bytes(pseudo_random_guid_bytes(12));
	let dummy_text = dummy.to_string();
	let production_text = production.to_string();
	let table = GuidRemapTable::from_json(&uexport_testkit::guid_updates_json("BP_Lamp_C", &[("Bulb", dummy_text.as_str(), production_text.as_str())]))
		.expect("table parses");

	let mut props = fstring("Guid");
	props.extend_from_slice(&[0; 16]);
	props.extend_from_slice(&dummy.to_bytes());
	let bytes = RecordBytes::new().properties(1, props).build();

	let ctx = current().with_guid_remap(&table);
	let record: StructExport = StructExport::from_bytes(&bytes, &ctx).expect("record reads");
	assert_eq!(record.loaded_properties[0].data, PropertyData::Guid(production));
}

#[test]
fn decoded_script_length_is_backpatched() {
	let mut block = vec![0x1E];
	block.extend_from_slice(&3.14_f32.to_le_bytes());
	let bytes = RecordBytes::new().script(1, block).build();

	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(record.script, ScriptBytecode::Decoded(vec![Expr::FloatConst(3.14)]));

	let rewritten = record.to_bytes(legacy().gate).expect("record writes");
	let storage_at = rewritten.len() - 5 - 4;
	assert_eq!(&rewritten[storage_at..storage_at + 4], &5_i32.to_le_bytes());
	assert_eq!(rewritten, bytes);
}

#[test]
fn backpatch_works_mid_stream() {
	let mut record = StructExport::<()>::default();
	record.set_instructions(vec![Expr::IntConst(9), Expr::EndOfScript]).expect("count fits");
	assert_eq!(record.script_bytecode_size, 2);

	let mut writer = Writer::new(std::io::Cursor::new(Vec::new()));
	writer.write_bytes(b"PREFIX").expect("prefix writes");
	let written = record.write(&mut writer, legacy().gate).expect("record writes");
	writer.write_bytes(b"!").expect("suffix writes");
	let out = writer.into_inner().into_inner();

	assert_eq!(written, out.len() - 7);
	let body = &out[6..out.len() - 1];
	let back: StructExport = StructExport::from_bytes(body, &legacy()).expect("record reads back");
	assert_eq!(back.script, record.script);
	assert_eq!(back.script_bytecode_size, 2);
}

#[test]
fn decoded_script_keeps_stored_instruction_count() {
	let bytes = RecordBytes::new().script(7, vec![0x0B]).build();

	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(record.script, ScriptBytecode::Decoded(vec![Expr::Nothing]));
	assert_eq!(record.script_bytecode_size, 7);
	assert_eq!(record.to_bytes(legacy().gate).expect("record writes"), bytes);
}

#[test]
fn edited_instructions_reset_the_count() {
	let bytes = RecordBytes::new().script(7, vec![0x0B]).build();
	let mut record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	record.set_instructions(vec![Expr::IntZero, Expr::IntOne, Expr::EndOfScript]).expect("count fits");

	let expected = RecordBytes::new().script(3, vec![0x25, 0x26, 0x53]).build();
	assert_eq!(record.to_bytes(legacy().gate).expect("record writes"), expected);
}

#[test]
fn empty_decoded_script_writes_like_empty_raw() {
	let decoded = StructExport::<()> {
		script: ScriptBytecode::Decoded(Vec::new()),
		..StructExport::default()
	};
	let bytes = decoded.to_bytes(legacy().gate).expect("record writes");
	assert_eq!(bytes, StructExport::<()>::default().to_bytes(legacy().gate).expect("record writes"));

	let back: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(back.script, ScriptBytecode::Raw(Vec::new()));
}

#[test]
fn unknown_opcode_falls_back_to_raw() {
	let block = vec![0x03, 0xAA, 0xBB, 0xCC];
	let bytes = RecordBytes::new().script(99, block.clone()).build();

	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("fallback is not an error");
	assert_eq!(record.script.decoded(), None);
	assert_eq!(record.script.raw(), Some(block.as_slice()));
	assert_eq!(record.script_bytecode_size, 99);
	assert_eq!(record.to_bytes(legacy().gate).expect("record writes"), bytes);
}

#[test]
fn partial_decode_is_discarded() {
	let mut block = vec![0x25, 0x26];
	block.extend_from_slice(&[0x1D, 0x01]);
	let bytes = RecordBytes::new().script(3, block.clone()).build();

	let record: StructExport = StructExport::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(record.script, ScriptBytecode::Raw(block));
}

#[test]
fn decoding_can_be_disabled() {
	let bytes = RecordBytes::new().script(1, vec![0x0B]).build();
	let ctx = legacy().with_options(ReadOptions::raw_bytecode());
	let record: StructExport = StructExport::from_bytes(&bytes, &ctx).expect("record reads");
	assert_eq!(record.script, ScriptBytecode::Raw(vec![0x0B]));
}

#[test]
fn truncated_script_block_is_fatal() {
	let bytes = RecordBytes::new().script(1, vec![0x0B, 0x0B]).storage_len(10).build();
	let err = StructExport::<()>::from_bytes(&bytes, &legacy()).expect_err("block longer than stream");
	assert!(matches!(err, ExportError::UnexpectedEof { need: 10, rem: 2, .. }));
}

#[test]
fn negative_child_count_is_fatal() {
	let mut bytes = RecordBytes::new().build();
	bytes[8..12].copy_from_slice(&(-1_i32).to_le_bytes());
	let err = StructExport::<()>::from_bytes(&bytes, &legacy()).expect_err("negative count");
	assert!(matches!(err, ExportError::NegativeCount { what: "child count", count: -1, at: 8 }));
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ObjectFlags(u32);

impl ExportBase for ObjectFlags {
	fn read(cursor: &mut Cursor<'_>, _gate: VersionGate) -> Result<Self> {
		Ok(Self(cursor.read_u32_le()?))
	}

	fn write<W: Write + Seek>(&self, writer: &mut Writer<W>, _gate: VersionGate) -> Result<()> {
		writer.write_u32_le(self.0)
	}
}

#[test]
fn base_header_is_delegated() {
	let mut bytes = 0x0008_0001_u32.to_le_bytes().to_vec();
	bytes.extend_from_slice(&RecordBytes::new().super_struct(-4).build());

	let record = StructExport::<ObjectFlags>::from_bytes(&bytes, &legacy()).expect("record reads");
	assert_eq!(record.base, ObjectFlags(0x0008_0001));
	assert_eq!(record.super_struct, PackageIndex::new(-4));
	assert_eq!(record.to_bytes(legacy().gate).expect("record writes"), bytes);
}

#[test]
fn record_serializes_to_json() {
	let record = StructExport::<()> {
		super_struct: PackageIndex::new(-2),
		children: vec![PackageIndex::new(5)],
		loaded_properties: vec![PropertyValue::new(PropertyData::Guid(Guid::ZERO))],
		script_bytecode_size: 1,
		script: ScriptBytecode::Decoded(vec![Expr::FloatConst(1.5)]),
		..StructExport::default()
	};

	let json = serde_json::to_value(&record).expect("record serializes");
	assert_eq!(json["super_struct"], serde_json::json!(-2));
	assert_eq!(json["children"], serde_json::json!([5]));
	assert_eq!(json["loaded_properties"][0]["data"]["Guid"], serde_json::json!("00000000-0000-0000-0000-000000000000"));
	assert_eq!(json["script"]["Decoded"][0]["FloatConst"], serde_json::json!(1.5));

	let back: StructExport = serde_json::from_value(json).expect("record deserializes");
	assert_eq!(back, record);
}

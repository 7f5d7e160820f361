#![allow(missing_docs)]

use proptest::prelude::*;
use uexport::asset::{Opcode, ReadContext, StructExport, VersionGate, Writer, decode_script, write_expr};
use uexport_testkit::RecordBytes;

fn known_opcodes() -> Vec<u8> {
	(0..=u8::MAX).filter(|raw| Opcode::try_from(*raw).is_ok()).collect()
}

// Mostly valid opcodes, so a fair share of blocks decode.
fn script_block() -> impl Strategy<Value = Vec<u8>> {
	let byte = prop_oneof![
		3 => prop::sample::select(known_opcodes()),
		1 => Just(0_u8),
		2 => any::<u8>(),
	];
	prop::collection::vec(byte, 0..48)
}

proptest! {
	#[test]
	fn decodable_blocks_reencode_exactly(block in script_block()) {
		if let Ok(exprs) = decode_script(&block, 64) {
			let mut writer = Writer::new(std::io::Cursor::new(Vec::new()));
			for expr in &exprs {
				write_expr(expr, &mut writer).expect("expr writes");
			}
			prop_assert_eq!(writer.into_inner().into_inner(), block);
		}
	}

	#[test]
	fn records_round_trip_byte_for_byte(
		super_struct in any::<i32>(),
		children in prop::collection::vec(any::<i32>(), 0..8),
		instruction_count in any::<i32>(),
		block in script_block(),
	) {
		let bytes = RecordBytes::new()
			.super_struct(super_struct)
			.children(&children)
			.script(instruction_count, block)
			.build();
		let ctx = ReadContext::new(VersionGate::default());

		let record: StructExport = StructExport::from_bytes(&bytes, &ctx).expect("record reads");
		prop_assert_eq!(record.script_bytecode_size, instruction_count);
		prop_assert_eq!(record.to_bytes(ctx.gate).expect("record writes"), bytes);
	}
}

#![allow(missing_docs)]

use proptest::prelude::*;
use uexport::asset::{PackageIndex, ReadContext, StructExport, VersionGate};
use uexport_testkit::RecordBytes;

proptest! {
	#[test]
	fn children_keep_order_and_sign(children in prop::collection::vec(any::<i32>(), 0..64)) {
		let bytes = RecordBytes::new().children(&children).build();
		let ctx = ReadContext::new(VersionGate::default());

		let record: StructExport = StructExport::from_bytes(&bytes, &ctx).expect("record reads");
		let read: Vec<i32> = record.children.iter().map(|child| child.index()).collect();
		prop_assert_eq!(&read, &children);

		let rewritten = record.to_bytes(ctx.gate).expect("record writes");
		prop_assert_eq!(rewritten, bytes);
	}
}

#[test]
fn mixed_export_and_import_handles_round_trip() {
	let children = [4, -1, 0, 7, -12, i32::MAX, i32::MIN];
	let bytes = RecordBytes::new().children(&children).build();
	let ctx = ReadContext::new(VersionGate::default());

	let record: StructExport = StructExport::from_bytes(&bytes, &ctx).expect("record reads");
	let expected: Vec<PackageIndex> = children.iter().copied().map(PackageIndex::new).collect();
	assert_eq!(record.children, expected);
	assert_eq!(record.children[0].export_slot(), Some(3));
	assert_eq!(record.children[1].import_slot(), Some(0));
	assert_eq!(record.to_bytes(ctx.gate).expect("record writes"), bytes);
}

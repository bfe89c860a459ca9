use codec::{
    decode_update_packet, encode_update_packet, CodecLimits, EntityRef, FieldValue, Tick,
    UpdatePacket, UpdateRecord,
};
use proptest::prelude::*;
use schema::FieldId;

fn position_update() -> impl Strategy<Value = UpdateRecord> {
    (1u32..16_384, 1u32..1000, -1.0e4f32..1.0e4, -1.0e4f32..1.0e4).prop_map(|(id, hash, x, y)| {
        UpdateRecord {
            entity: EntityRef::new(id, hash),
            fields: vec![(FieldId::X, FieldValue::Float(x)), (FieldId::Y, FieldValue::Float(y))],
        }
    })
}

proptest! {
    #[test]
    fn position_updates_roundtrip(
        tick in any::<u32>(),
        updates in proptest::collection::vec(position_update(), 0..20),
    ) {
        let packet = UpdatePacket { tick: Tick::new(tick), deletes: Vec::new(), updates, creations: Vec::new() };
        let bytes = encode_update_packet(&packet).unwrap();
        let decoded = decode_update_packet(&bytes, &CodecLimits::default()).unwrap();
        prop_assert_eq!(decoded, packet);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_update_packet(&bytes, &CodecLimits::for_testing());
    }
}

use proptest::prelude::*;
use wire::{decode_client_message, ClientMessage, IncomingCache, InputFlags, Limits};

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode_client_message(&bytes, &Limits::for_testing());
    }

    #[test]
    fn input_sequence_merges_to_union(
        inputs in proptest::collection::vec((any::<u16>(), -1000.0f32..1000.0), 1..16)
    ) {
        let limits = Limits::for_testing();
        let mut cache = IncomingCache::new(&limits);
        let mut expected = 0u32;
        for (flags, x) in &inputs {
            expected |= u32::from(*flags);
            let message = ClientMessage::Input {
                flags: InputFlags::from_raw(u32::from(*flags)),
                mouse_x: *x,
                mouse_y: 0.0,
            };
            cache.receive(&message.encode(), &limits).unwrap();
        }
        let last_x = inputs[inputs.len() - 1].1;
        let drained = cache.drain();
        prop_assert_eq!(drained.len(), 1);
        match &drained[0] {
            ClientMessage::Input { flags, mouse_x, .. } => {
                prop_assert_eq!(flags.raw(), expected);
                prop_assert_eq!(mouse_x.to_bits(), last_x.to_bits());
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }
}

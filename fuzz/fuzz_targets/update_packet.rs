#![no_main]

use codec::{decode_update_packet, encode_update_packet, CodecLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = CodecLimits::for_testing();
    let Ok(packet) = decode_update_packet(data, &limits) else {
        return;
    };

    // Anything that decodes must encode again and decode to the same shape.
    let bytes = encode_update_packet(&packet).expect("decoded packet encodes");
    let again = decode_update_packet(&bytes, &limits).expect("re-encoded packet decodes");
    assert_eq!(again.tick, packet.tick);
    assert_eq!(again.deletes, packet.deletes);
    assert_eq!(again.record_count(), packet.record_count());
});

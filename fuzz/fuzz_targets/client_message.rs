#![no_main]

use libfuzzer_sys::fuzz_target;
use wire::{decode_client_message, IncomingCache, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits::for_testing();
    let _ = decode_client_message(data, &limits);

    // Split the input into frames and push them through the merge cache.
    let mut cache = IncomingCache::new(&limits);
    let mut idx = 0usize;
    while idx < data.len() && idx < 4096 {
        let len = usize::from(data[idx] % 24).saturating_add(1);
        idx += 1;
        let end = (idx + len).min(data.len());
        let _ = cache.receive(&data[idx..end], &limits);
        idx = end;
    }
    let _ = cache.drain();
});

#![no_main]

use bitstream::Reader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = Reader::new(data);
    let mut idx = 0usize;

    // Input bytes pick a bounded sequence of reads over the same buffer.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_u8();
            }
            1 => {
                let len = usize::from(data[idx.saturating_sub(1)] % 16);
                let _ = reader.read_bytes(len);
            }
            2 => {
                let _ = reader.read_varu32();
            }
            3 => {
                let _ = reader.read_vars32();
            }
            4 => {
                let _ = reader.read_f32();
            }
            5 => {
                let _ = reader.read_angle();
            }
            _ => {
                let _ = reader.read_string_nt();
            }
        }
    }
});

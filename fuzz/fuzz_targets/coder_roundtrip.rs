#![no_main]
use arith::{Decoder, Encoder, Error};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: Vec<u8>| {
    if data.is_empty() {
        return;
    }

    // Each input byte becomes one coded bit: low bit is the value, the
    // upper bits pick a probability across the usable range.
    let pairs: Vec<(f64, bool)> = data
        .iter()
        .map(|&b| {
            let prob = 0.05 + f64::from(b >> 1) / 127.0 * 0.9;
            (prob, b & 1 == 1)
        })
        .collect();

    let mut encoder = Encoder::new();
    let mut accepted = Vec::new();
    for &(prob, bit) in &pairs {
        match encoder.push_bit(prob, bit) {
            Ok(()) => accepted.push((prob, bit)),
            Err(Error::ResolutionExhausted) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    let bytes = encoder.finish().unwrap();

    let mut decoder = Decoder::from_bytes(bytes);
    for &(prob, bit) in &accepted {
        assert_eq!(decoder.pop_bit(prob).unwrap(), bit);
    }
});

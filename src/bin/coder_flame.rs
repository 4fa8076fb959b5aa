use arith::{Decoder, Encoder};

fn main() {
    let bits = (0..10000).map(|i| i % 10 != 0).collect::<Vec<bool>>();

    for _ in 0..1000 {
        let mut encoder = Encoder::new();
        for &bit in &bits {
            encoder.push_bit(0.9, bit).unwrap();
        }
        let bytes = encoder.finish().unwrap();

        let mut decoder = Decoder::from_bytes(bytes);
        for &bit in &bits {
            assert_eq!(decoder.pop_bit(0.9).unwrap(), bit);
        }
    }
}

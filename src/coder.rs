//! Binary arithmetic coder.
//!
//! [`Encoder`] and [`Decoder`] are mirror-image state machines over a
//! shrinking interval of a fixed-point real line. Each coded bit arrives
//! with an externally supplied probability that it is a one; the interval
//! narrows in proportion to that probability, and whole output bits fall
//! out whenever the interval stops straddling the split point.
//!
//! The canonical full interval is `[-0.5, 0.5)` rather than the textbook
//! `[0, 1)`. This is purely cosmetic; the split point is zero instead of
//! one half.

use std::path::Path;

use crate::bitfield::{BitReader, BitWriter};
use crate::error::{Error, Result};

/// Fixed-point fractional precision of the coding interval, in bits.
///
/// Interval bounds are signed 64-bit integers scaled so that `1 << PRECISION`
/// represents 1.0. One integer unit is the resolution floor: no subdivision
/// narrower than a unit can be coded.
pub const PRECISION: u32 = 48;

const ONE: i64 = 1 << PRECISION;
const HALF: i64 = ONE / 2;
const QUARTER: i64 = ONE / 4;
/// One fixed-point unit, the explicit `ε_min` of the coder.
const EPS: i64 = 1;

/// Deferred-bit state for the encoder's renormalization loop.
///
/// When the interval straddles zero but is narrower than a quarter of the
/// range, the next output bit is known to exist but not yet which value it
/// takes (the classic E3 underflow case). The decision is deferred until a
/// later narrowing lands the interval on one side; the deferred bits then
/// resolve to the complement of the bit that finally gets emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Carry {
    /// No bits are pending.
    #[default]
    Resolved,
    /// `n` bits await resolution.
    Pending(u32),
}

impl Carry {
    fn defer(&mut self) {
        *self = match *self {
            Carry::Resolved => Carry::Pending(1),
            Carry::Pending(n) => Carry::Pending(n + 1),
        };
    }

    /// Drain the pending count, returning to `Resolved`.
    fn take(&mut self) -> u32 {
        match std::mem::replace(self, Carry::Resolved) {
            Carry::Resolved => 0,
            Carry::Pending(n) => n,
        }
    }
}

/// Validate `prob` and compute the width of the lower sub-interval.
///
/// Shared verbatim between encoder and decoder: both sides must derive the
/// identical subdivision from the identical probability, or the streams
/// silently diverge. All checks happen before any state is touched, so a
/// failed call leaves the calling coder exactly as it was.
fn subdivide(lb: i64, ub: i64, prob: f64) -> Result<i64> {
    if !(prob > 0.0 && prob < 1.0) {
        return Err(Error::InvalidProbability(prob));
    }
    let width = ub - lb;
    // Truncation is the fixed-point floor; the clamp keeps the upper
    // sub-interval non-empty when prob * width rounds up to the full width.
    let epsilon = ((prob * width as f64) as i64).min(width - EPS);
    if epsilon <= EPS {
        return Err(Error::ResolutionExhausted);
    }
    Ok(epsilon)
}

/// Arithmetic encoder.
///
/// Feed bits with [`push_bit`](Encoder::push_bit), then finalize exactly
/// once with [`finish`](Encoder::finish) or
/// [`write_file`](Encoder::write_file). Finalization consumes the encoder,
/// so double-finalize and push-after-finalize are compile errors rather
/// than runtime ones.
pub struct Encoder {
    field: BitWriter,
    lb: i64,
    ub: i64,
    carry: Carry,
}

impl Encoder {
    /// Create an encoder over the canonical full interval.
    pub fn new() -> Self {
        Self {
            field: BitWriter::new(),
            lb: -HALF,
            ub: HALF - EPS,
            carry: Carry::Resolved,
        }
    }

    /// Encode one bit.
    ///
    /// `prob` is the probability, strictly between 0 and 1, that `bit` is
    /// `true` — supplied by the caller's model *without* looking at `bit`.
    /// The decoder must later be handed the same probability, in the same
    /// position, to recover this bit.
    ///
    /// # Errors
    /// [`Error::InvalidProbability`] if `prob` is outside (0, 1), and
    /// [`Error::ResolutionExhausted`] if the model's probabilities have
    /// driven the interval too narrow to subdivide. Neither error mutates
    /// the encoder, so previously pushed bits remain finalizable.
    pub fn push_bit(&mut self, prob: f64, bit: bool) -> Result<()> {
        let epsilon = subdivide(self.lb, self.ub, prob)?;
        if bit {
            // Lower sub-interval; the -EPS keeps lb strictly below ub.
            self.ub = self.lb + epsilon - EPS;
            self.flush()?;
        } else {
            // Upper sub-interval. No renormalization here: the interval
            // keeps its position and only narrows from below.
            self.lb += epsilon;
        }
        Ok(())
    }

    /// Renormalization loop: emit every bit the interval has determined,
    /// doubling the interval back up as each one leaves.
    fn flush(&mut self) -> Result<()> {
        debug_assert!(self.lb < self.ub);
        debug_assert!(self.lb >= -ONE && self.ub <= ONE);
        loop {
            if self.lb > 0 && self.ub > 0 {
                // Entirely in the upper half: the next stream bit is 1.
                self.lb -= QUARTER;
                self.ub -= QUARTER;
                self.emit(true)?;
            } else if self.lb <= 0 && self.ub <= 0 {
                // Entirely in the lower half: the next stream bit is 0.
                self.lb += QUARTER;
                self.ub += QUARTER;
                self.emit(false)?;
            } else if self.ub - self.lb >= QUARTER {
                // Straddling zero with room to spare: nothing more is
                // determined until another push narrows the interval.
                break;
            } else {
                // Straddling but narrow: a bit exists, its value doesn't
                // yet. Defer it.
                self.carry.defer();
            }
            self.lb *= 2;
            self.ub = self.ub * 2 + EPS;
        }
        Ok(())
    }

    /// Write `bit` followed by any deferred bits, which resolve to the
    /// complement of the bit that released them.
    fn emit(&mut self, bit: bool) -> Result<()> {
        self.field.push_bit(bit)?;
        for _ in 0..self.carry.take() {
            self.field.push_bit(!bit)?;
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.flush()?;
        if self.lb <= 0 && self.ub > 0 {
            // The interval still straddles zero, so the last bit (and any
            // deferred ones behind it) never resolved. Pin one bound at the
            // split point to force them out; either side works, and any
            // point in the final interval decodes to the same stream.
            if self.ub == EPS {
                // ub is a single unit above zero, so pinning lb would close
                // the interval. Resolve downward instead.
                self.ub = 0;
            } else {
                self.lb = EPS;
            }
            self.flush()?;
        }
        Ok(())
    }

    /// Finalize the stream and return its bytes, the last one zero-padded.
    ///
    /// # Errors
    /// [`Error::StoreOverflow`] if the final flush would exceed the bit
    /// store's capacity.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.finalize()?;
        Ok(self.field.into_bytes())
    }

    /// Finalize the stream and serialize it to `path`.
    ///
    /// # Errors
    /// As [`finish`](Encoder::finish), plus any I/O error from writing the
    /// file.
    pub fn write_file<P: AsRef<Path>>(mut self, path: P) -> Result<()> {
        self.finalize()?;
        self.field.write_file(path)
    }

    #[cfg(test)]
    fn pending_carries(&self) -> u32 {
        match self.carry {
            Carry::Resolved => 0,
            Carry::Pending(n) => n,
        }
    }

    #[cfg(test)]
    fn emitted_bits(&self) -> u64 {
        self.field.len()
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Arithmetic decoder.
///
/// Mirrors [`Encoder`] bit for bit. The accumulated data value `d` tracks
/// every shift and doubling of the interval bounds, so carries that the
/// encoder had to defer explicitly resolve implicitly here.
pub struct Decoder {
    field: BitReader,
    lb: i64,
    ub: i64,
    d: i64,
}

impl Decoder {
    /// Load a coded stream from a file.
    ///
    /// # Errors
    /// Surfaces the underlying I/O error if the file cannot be read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::seed(BitReader::open(path)?))
    }

    /// Decode from an in-memory byte stream.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::seed(BitReader::from_bytes(data))
    }

    /// Consume an initial window of `PRECISION` bits into `d`, most
    /// significant first, then renormalize.
    fn seed(mut field: BitReader) -> Self {
        let mut d = -HALF;
        let mut weight = HALF;
        while weight >= EPS {
            if field.pop_bit() {
                d += weight;
            }
            weight /= 2;
        }
        let mut decoder = Self {
            field,
            lb: -HALF,
            ub: HALF - EPS,
            d,
        };
        decoder.flush();
        decoder
    }

    /// Decode one bit.
    ///
    /// `prob` must be exactly the probability the encoder was given for
    /// this position. A mismatch is undetectable and silently yields wrong
    /// bits from here on.
    ///
    /// # Errors
    /// Same conditions as [`Encoder::push_bit`], checked before any state
    /// changes.
    pub fn pop_bit(&mut self, prob: f64) -> Result<bool> {
        let epsilon = subdivide(self.lb, self.ub, prob)?;
        if self.lb + epsilon > self.d {
            // d falls in the lower sub-interval: this was a 1.
            self.ub = self.lb + epsilon - EPS;
            self.flush();
            Ok(true)
        } else {
            self.lb += epsilon;
            Ok(false)
        }
    }

    /// The decoder's renormalization: identical interval bisection to the
    /// encoder's, with `d` kept in lockstep and one fresh stream bit pulled
    /// into its least significant unit per doubling.
    fn flush(&mut self) {
        debug_assert!(self.lb <= self.d && self.d <= self.ub);
        loop {
            if self.lb > 0 && self.ub > 0 {
                self.lb -= QUARTER;
                self.d -= QUARTER;
                self.ub -= QUARTER;
            } else if self.lb <= 0 && self.ub <= 0 {
                self.lb += QUARTER;
                self.d += QUARTER;
                self.ub += QUARTER;
            } else if self.ub - self.lb >= QUARTER {
                break;
            }
            self.lb *= 2;
            self.d *= 2;
            self.ub = self.ub * 2 + EPS;
            if self.field.pop_bit() {
                self.d += EPS;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roundtrip(pairs: &[(f64, bool)]) -> Vec<bool> {
        let mut enc = Encoder::new();
        for &(prob, bit) in pairs {
            enc.push_bit(prob, bit).unwrap();
        }
        let bytes = enc.finish().unwrap();
        let mut dec = Decoder::from_bytes(bytes);
        pairs
            .iter()
            .map(|&(prob, _)| dec.pop_bit(prob).unwrap())
            .collect()
    }

    #[test]
    fn test_carry_defer_and_take() {
        let mut c = Carry::Resolved;
        assert_eq!(c.take(), 0);
        c.defer();
        c.defer();
        c.defer();
        assert_eq!(c, Carry::Pending(3));
        assert_eq!(c.take(), 3);
        assert_eq!(c, Carry::Resolved);
        assert_eq!(c.take(), 0);
    }

    #[test]
    fn test_boundary_scenario() {
        let pairs = [(0.5, true), (0.5, false), (0.5, true)];
        assert_eq!(roundtrip(&pairs), vec![true, false, true]);
    }

    #[test]
    fn test_empty_stream_finalizes_and_opens() {
        let bytes = Encoder::new().finish().unwrap();
        // Finalization forces the single undetermined bit out.
        assert_eq!(bytes, vec![0x80]);
        let _ = Decoder::from_bytes(bytes);
    }

    #[test]
    fn test_carry_accumulates_before_resolving() {
        let mut enc = Encoder::new();
        enc.push_bit(0.49, false).unwrap();
        // Narrows to a straddling interval well under a quarter wide, which
        // must defer a bit per renormalization doubling: four of them before
        // the width recovers.
        enc.push_bit(0.04, true).unwrap();
        assert!(enc.pending_carries() >= 2);
        assert_eq!(enc.emitted_bits(), 0);
        enc.push_bit(0.6, true).unwrap();

        let bytes = enc.finish().unwrap();
        let mut dec = Decoder::from_bytes(bytes);
        assert!(!dec.pop_bit(0.49).unwrap());
        assert!(dec.pop_bit(0.04).unwrap());
        assert!(dec.pop_bit(0.6).unwrap());
    }

    #[test]
    fn test_straddle_break_boundary_is_inclusive() {
        // Width of exactly a quarter straddling zero: no bit is deferred,
        // the loop exits immediately.
        let mut enc = Encoder::new();
        enc.lb = -ONE / 8;
        enc.ub = enc.lb + QUARTER;
        enc.flush().unwrap();
        assert_eq!(enc.pending_carries(), 0);
        assert_eq!(enc.emitted_bits(), 0);
        assert_eq!((enc.lb, enc.ub), (-ONE / 8, ONE / 8));

        // One unit narrower and the bit defers.
        let mut enc = Encoder::new();
        enc.lb = -ONE / 8;
        enc.ub = enc.lb + QUARTER - EPS;
        enc.flush().unwrap();
        assert_eq!(enc.pending_carries(), 1);
        assert_eq!(enc.emitted_bits(), 0);
    }

    #[test]
    fn test_finalize_with_upper_bound_one_unit_above_zero() {
        // Walk ulps upward from one half until the subdivision of the full
        // interval is HALF + 2 units; the true branch then leaves ub a
        // single unit above zero, the narrowest straddle finalization can
        // see. Resolution must go downward, not pinch the interval shut.
        let width = (ONE - EPS) as f64;
        let mut prob = 0.5;
        while ((prob * width) as i64) < HALF + 2 {
            prob = f64::from_bits(prob.to_bits() + 1);
        }
        assert_eq!((prob * width) as i64, HALF + 2);

        let mut enc = Encoder::new();
        enc.push_bit(prob, true).unwrap();
        assert_eq!((enc.lb, enc.ub), (-HALF, EPS));

        let bytes = enc.finish().unwrap();
        assert_eq!(bytes, vec![0x00]);

        let mut dec = Decoder::from_bytes(bytes);
        assert!(dec.pop_bit(prob).unwrap());
    }

    #[test]
    fn test_invalid_probability_is_rejected_without_mutation() {
        let mut enc = Encoder::new();
        enc.push_bit(0.5, true).unwrap();
        for bad in [0.0, 1.0, -0.25, 1.5, f64::NAN] {
            assert!(matches!(
                enc.push_bit(bad, true),
                Err(Error::InvalidProbability(_))
            ));
        }
        enc.push_bit(0.5, false).unwrap();

        let bytes = enc.finish().unwrap();
        let mut dec = Decoder::from_bytes(bytes);
        assert!(dec.pop_bit(0.5).unwrap());
        assert!(matches!(
            dec.pop_bit(1.0),
            Err(Error::InvalidProbability(_))
        ));
        assert!(!dec.pop_bit(0.5).unwrap());
    }

    #[test]
    fn test_resolution_exhaustion_surfaces_and_is_atomic() {
        // A run of very improbable zeros narrows the interval without ever
        // renormalizing; within a few dozen bits the subdivision drops
        // below one unit and must be reported, not swallowed.
        let mut enc = Encoder::new();
        let mut accepted = 0;
        let err = loop {
            match enc.push_bit(0.99, false) {
                Ok(()) => accepted += 1,
                Err(e) => break e,
            }
            assert!(accepted < 64, "resolution never exhausted");
        };
        assert!(matches!(err, Error::ResolutionExhausted));

        // The failed push did not touch state: everything accepted so far
        // still round-trips.
        let bytes = enc.finish().unwrap();
        let mut dec = Decoder::from_bytes(bytes);
        for _ in 0..accepted {
            assert!(!dec.pop_bit(0.99).unwrap());
        }
    }

    #[test]
    fn test_compression_bound_on_predictable_input() {
        let n = 2000;
        let mut enc = Encoder::new();
        for _ in 0..n {
            enc.push_bit(0.99, true).unwrap();
        }
        let bytes = enc.finish().unwrap();
        // Entropy is ~0.0145 bits per input bit; allow generous overhead.
        assert!(
            bytes.len() * 8 < n / 4,
            "predictable input compressed to {} bits",
            bytes.len() * 8
        );

        let mut dec = Decoder::from_bytes(bytes);
        for _ in 0..n {
            assert!(dec.pop_bit(0.99).unwrap());
        }
    }

    #[test]
    fn test_incompressibility_bound_on_uniform_input() {
        let n: usize = 1024;
        let pairs: Vec<(f64, bool)> = (0..n).map(|i| (0.5, i % 2 == 0)).collect();
        let expected: Vec<bool> = pairs.iter().map(|&(_, b)| b).collect();

        let mut enc = Encoder::new();
        for &(prob, bit) in &pairs {
            enc.push_bit(prob, bit).unwrap();
        }
        let bytes = enc.finish().unwrap();
        let out_bits = bytes.len() * 8;
        assert!(out_bits <= n + 64, "uniform input expanded to {out_bits} bits");
        assert!(out_bits >= n - 64, "uniform input compressed to {out_bits} bits");

        let mut dec = Decoder::from_bytes(bytes);
        let decoded: Vec<bool> = pairs.iter().map(|&(p, _)| dec.pop_bit(p).unwrap()).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "arith_coder_{}_{:?}.bin",
            std::process::id(),
            std::thread::current().id()
        ));

        let pairs = [(0.8, true), (0.8, true), (0.3, false), (0.8, true)];
        let mut enc = Encoder::new();
        for &(prob, bit) in &pairs {
            enc.push_bit(prob, bit).unwrap();
        }
        enc.write_file(&path).unwrap();

        let mut dec = Decoder::open(&path).unwrap();
        for &(prob, bit) in &pairs {
            assert_eq!(dec.pop_bit(prob).unwrap(), bit);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_open_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("arith_no_such_stream.bin");
        assert!(matches!(Decoder::open(missing), Err(Error::Io(_))));
    }

    proptest! {
        // Mixed biases and values always round-trip. If the model drives
        // the interval to exhaustion mid-sequence, the error must leave the
        // encoder in a state where the accepted prefix still decodes.
        #[test]
        fn prop_roundtrip_mixed_bias(
            pairs in prop::collection::vec((0.05f64..0.95, any::<bool>()), 1..200),
        ) {
            let mut enc = Encoder::new();
            let mut accepted = Vec::new();
            for &(prob, bit) in &pairs {
                match enc.push_bit(prob, bit) {
                    Ok(()) => accepted.push((prob, bit)),
                    Err(Error::ResolutionExhausted) => break,
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            let bytes = enc.finish().unwrap();
            let mut dec = Decoder::from_bytes(bytes);
            for &(prob, bit) in &accepted {
                prop_assert_eq!(dec.pop_bit(prob).unwrap(), bit);
            }
        }
    }
}

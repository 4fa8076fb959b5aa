//! # Binary Arithmetic Coding
//!
//! *Entropy coding at the Shannon limit, one bit and one probability at a time.*
//!
//! ## Intuition First
//!
//! Picture the real line between -0.5 and 0.5 as a map of every message you
//! could possibly send. Each bit you encode splits your current region in
//! two — not down the middle, but in proportion to how likely each value
//! was. Likely bits barely shrink the region; surprising bits slash it.
//!
//! When you are done, you transmit just enough binary digits to point at a
//! number inside the final sliver. A message of mostly unsurprising bits
//! leaves a wide sliver, which takes very few digits to name. That is the
//! whole trick: code length ≈ how surprised you were, summed over the
//! message.
//!
//! ## The Problem
//!
//! Prefix codes must spend a whole number of bits per symbol:
//! - **Huffman coding**: fast, but a bit with probability 0.99 still costs
//!   a full output bit — ~70x the information it carries.
//! - **Arithmetic coding**: pays the true cost, $-\log_2 p$ bits, by letting
//!   symbol boundaries fall *inside* output bits.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon              Entropy as the fundamental limit
//! 1952  Huffman              Optimal integer-length prefix codes
//! 1963  Elias                Folklore: codes as nested intervals
//! 1976  Rissanen, Pasco      Finite-precision arithmetic coding
//! 1979  Rubin                Streaming without unbounded carries
//! 1987  Witten, Neal, Cleary The CACM implementation everyone copied
//! 1995  Moffat, Neal, Witten Revised coder with restricted precision
//! ```
//!
//! The enduring obstacle was never the idea but the fixed-precision
//! mechanics: renormalizing the interval as leading bits resolve, and
//! deferring bits when the interval straddles the split point too narrowly
//! to decide them (the E3 underflow case).
//!
//! ## Mathematical Formulation
//!
//! Maintain an interval $[lb, ub)$, initially $[-0.5, 0.5)$. To code a bit
//! $b$ with supplied probability $p = P(b = 1)$:
//!
//! ```text
//! ε  = p · (ub - lb)
//! b = 1:  ub ← lb + ε        (lower sub-interval)
//! b = 0:  lb ← lb + ε        (upper sub-interval)
//! ```
//!
//! Whenever the interval lies wholly on one side of zero, its next binary
//! digit is determined: emit it and double the interval. The decoder holds
//! a value $d$ read from the stream, keeps $lb \le d \le ub$, and recovers
//! each bit by asking which sub-interval $d$ fell into.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(1)$ amortized per bit (renormalization emits each output
//!   bit exactly once).
//! - **Space**: $O(1)$ coder state plus the in-memory bit store.
//!
//! ## Failure Modes
//!
//! 1. **Probability mismatch**: encoder and decoder must see identical
//!    probabilities in identical order. A mismatch is undetectable in-band
//!    and silently decodes garbage.
//! 2. **Resolution exhaustion**: long runs of improbable zeros narrow the
//!    interval without triggering renormalization; once a subdivision
//!    would be smaller than one fixed-point unit, coding must stop
//!    ([`Error::ResolutionExhausted`]).
//! 3. **No framing**: the stream has no header and no end marker. Callers
//!    must carry a length prefix or reserve a stop symbol in their model.
//!
//! ## Implementation Notes
//!
//! Interval bounds are signed 64-bit fixed point with 48 fractional bits
//! and an explicit one-unit resolution floor, so the renormalization
//! boundary cases are exact and testable rather than at the mercy of
//! floating-point rounding. The canonical interval is $[-0.5, 0.5)$ with
//! the split at zero, a cosmetic choice that makes the half-interval tests
//! simple sign checks. Deferred carry bits are tracked as an explicit
//! two-state machine on the encoder; the decoder needs none, since its data
//! value tracks the bound shifts directly.
//!
//! ```
//! use arith::{Decoder, Encoder};
//!
//! # fn main() -> arith::error::Result<()> {
//! let mut encoder = Encoder::new();
//! encoder.push_bit(0.9, true)?;
//! encoder.push_bit(0.9, true)?;
//! encoder.push_bit(0.2, false)?;
//! let bytes = encoder.finish()?;
//!
//! let mut decoder = Decoder::from_bytes(bytes);
//! assert!(decoder.pop_bit(0.9)?);
//! assert!(decoder.pop_bit(0.9)?);
//! assert!(!decoder.pop_bit(0.2)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - Witten, I. H., Neal, R. M., Cleary, J. G. (1987). "Arithmetic coding
//!   for data compression." Communications of the ACM 30(6).
//! - Moffat, A., Neal, R. M., Witten, I. H. (1995). "Arithmetic coding
//!   revisited." ACM Transactions on Information Systems 16(3).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitfield;
pub mod coder;
pub mod error;

pub use bitfield::{BitField, BitReader, BitWriter};
pub use coder::{Decoder, Encoder};
pub use error::Error;

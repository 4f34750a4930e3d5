//! Price and volume types.
//!
//! Prices live on the venue's $0.01 tick grid. Rather than hand-rolling
//! scaled-integer arithmetic, we lean on `rust_decimal::Decimal`, which is
//! exact at this scale and is what the rest of the stack already uses for
//! money; `quantize` below is the one seam where wire-boundary floats get
//! snapped onto the grid, which is the scaled-integer design note's intent
//! without giving up `Decimal`'s ergonomics everywhere else.

use rust_decimal::Decimal;

pub type Price = Decimal;
pub type Volume = Decimal;

/// Smallest price increment on the venue.
pub const TICK: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Snap a price onto the $0.01 grid, rounding half away from zero.
#[must_use]
pub fn quantize(price: Decimal) -> Decimal {
    price.round_dp(2)
}

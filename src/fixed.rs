// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Fixed-point sample positions.
//!
//! Positions and increments are integers whose low [`FRACTION_BITS`] bits hold
//! the sub-sample fraction. A 64-bit backing integer keeps reflections such as
//! `2 * loop_end - position` from overflowing for any patch the loader accepts.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Number of low bits reserved for the fractional part of a position.
pub const FRACTION_BITS: u32 = 12;

/// Mask selecting the fractional bits.
pub const FRACTION_MASK: i64 = (1 << FRACTION_BITS) - 1;

/// A position or step in fixed-point sample units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    /// One whole sample.
    pub const ONE: Fixed = Fixed(1 << FRACTION_BITS);

    /// Wraps an already-scaled raw value.
    pub const fn from_raw(raw: i64) -> Fixed {
        Fixed(raw)
    }

    /// Converts a whole number of samples.
    pub const fn from_samples(samples: i64) -> Fixed {
        Fixed(samples << FRACTION_BITS)
    }

    /// Converts a floating point sample count, truncating toward zero.
    pub fn from_f64(value: f64) -> Fixed {
        Fixed((value * (1i64 << FRACTION_BITS) as f64) as i64)
    }

    /// The raw scaled integer.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// The whole-sample index (floor for positive values).
    pub const fn to_int(self) -> i64 {
        self.0 >> FRACTION_BITS
    }

    /// The fractional bits, in `0..(1 << FRACTION_BITS)`.
    pub const fn to_frac(self) -> i64 {
        self.0 & FRACTION_MASK
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / (1i64 << FRACTION_BITS) as f64
    }

    /// Multiplies by a real ratio, truncating toward zero.
    pub fn scale(self, ratio: f64) -> Fixed {
        Fixed((self.0 as f64 * ratio) as i64)
    }

    /// Divides by a real ratio, truncating toward zero.
    pub fn div_ratio(self, ratio: f64) -> Fixed {
        Fixed((self.0 as f64 / ratio) as i64)
    }

    /// Sets the top four fractional bits, as GF1 "fractions" nibbles do.
    pub fn with_nibble_fraction(self, nibble: u8) -> Fixed {
        Fixed(self.0 | (i64::from(nibble & 0x0f) << (FRACTION_BITS - 4)))
    }

    pub const fn abs(self) -> Fixed {
        Fixed(self.0.abs())
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Number of steps of `incr` from `self` that stay strictly below `bound`.
    ///
    /// Both the batched resampler loops and their per-sample reference use
    /// this so the two emit identical positions. `incr` must be positive.
    pub fn steps_below(self, bound: Fixed, incr: Fixed) -> i64 {
        if self >= bound {
            return 0;
        }
        (bound.0 - self.0 + incr.0 - 1) / incr.0
    }

    /// Number of steps of `incr` from `self` that stay strictly above `bound`.
    /// `incr` must be negative.
    pub fn steps_above(self, bound: Fixed, incr: Fixed) -> i64 {
        if self <= bound {
            return 0;
        }
        (self.0 - bound.0 - incr.0 - 1) / -incr.0
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}/{}", self.to_int(), self.to_frac(), 1 << FRACTION_BITS)
    }
}

//! Exact rational time values.
//!
//! All musical durations, time cursors and proportion signs are kept as
//! integer fractions so that long pieces accumulate no floating-point
//! drift. Coordinates only become `f64` at the final scaling step in the
//! positioner.

use num_rational::Ratio;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// An immutable rational number used for all musical time arithmetic.
///
/// Stored reduced; the denominator is never zero. Serialized as a
/// `(numerator, denominator)` pair.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct Proportion(Ratio<i64>);

impl Proportion {
    /// Create a new proportion. A zero denominator is a caller bug; it is
    /// clamped to 1 in release builds so arithmetic can continue.
    pub fn new(num: i64, den: i64) -> Self {
        debug_assert!(den != 0, "Proportion denominator must be non-zero");
        let den = if den == 0 { 1 } else { den };
        Proportion(Ratio::new(num, den))
    }

    /// Create a proportion, returning `None` on a zero denominator.
    pub fn checked_new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            None
        } else {
            Some(Proportion(Ratio::new(num, den)))
        }
    }

    pub fn zero() -> Self {
        Proportion(Ratio::zero())
    }

    pub fn one() -> Self {
        Proportion(Ratio::new(1, 1))
    }

    pub fn from_int(n: i64) -> Self {
        Proportion(Ratio::new(n, 1))
    }

    pub fn numer(&self) -> i64 {
        *self.0.numer()
    }

    pub fn denom(&self) -> i64 {
        *self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// The reciprocal. The value must be non-zero.
    pub fn recip(&self) -> Self {
        debug_assert!(!self.is_zero(), "reciprocal of zero Proportion");
        if self.is_zero() {
            return Proportion::one();
        }
        Proportion(self.0.recip())
    }

    pub fn min(self, other: Self) -> Self {
        if self <= other {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Self) -> Self {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Convert to `f64` for coordinate scaling. Only the positioner's
    /// final width computation should call this.
    pub fn as_f64(&self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }
}

impl Default for Proportion {
    fn default() -> Self {
        Proportion::zero()
    }
}

impl From<(i64, i64)> for Proportion {
    fn from((num, den): (i64, i64)) -> Self {
        Proportion::new(num, den)
    }
}

impl From<Proportion> for (i64, i64) {
    fn from(p: Proportion) -> Self {
        (p.numer(), p.denom())
    }
}

impl Add for Proportion {
    type Output = Proportion;
    fn add(self, rhs: Self) -> Self {
        Proportion(self.0 + rhs.0)
    }
}

impl Sub for Proportion {
    type Output = Proportion;
    fn sub(self, rhs: Self) -> Self {
        Proportion(self.0 - rhs.0)
    }
}

impl Mul for Proportion {
    type Output = Proportion;
    fn mul(self, rhs: Self) -> Self {
        Proportion(self.0 * rhs.0)
    }
}

impl Div for Proportion {
    type Output = Proportion;
    fn div(self, rhs: Self) -> Self {
        debug_assert!(!rhs.is_zero(), "division by zero Proportion");
        if rhs.is_zero() {
            return self;
        }
        Proportion(self.0 / rhs.0)
    }
}

impl Neg for Proportion {
    type Output = Proportion;
    fn neg(self) -> Self {
        Proportion(-self.0)
    }
}

impl AddAssign for Proportion {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Proportion {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl MulAssign for Proportion {
    fn mul_assign(&mut self, rhs: Self) {
        self.0 *= rhs.0;
    }
}

impl DivAssign for Proportion {
    fn div_assign(&mut self, rhs: Self) {
        debug_assert!(!rhs.is_zero(), "division by zero Proportion");
        if !rhs.is_zero() {
            self.0 /= rhs.0;
        }
    }
}

impl fmt::Debug for Proportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numer(), self.denom())
    }
}

impl fmt::Display for Proportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom() == 1 {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

use std::cmp::Ordering;
use std::fmt;

use crate::foundation::error::{LayoutError, LayoutResult};

pub use kurbo::{Point, Rect};

/// Ticks per quarter note used when converting fractions to integer ticks.
pub const DIVISION: i64 = 480;

/// Rational time position in whole notes (`1/4` is one quarter note from the start).
///
/// Always stored reduced with a positive denominator, so derived equality and
/// hashing agree with numeric equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Fraction {
    num: i32,
    den: i32,
}

impl Fraction {
    /// The score start.
    pub const ZERO: Fraction = Fraction { num: 0, den: 1 };

    /// Create a validated fraction `num/den`, reduced to lowest terms.
    pub fn new(num: i32, den: i32) -> LayoutResult<Self> {
        if den == 0 {
            return Err(LayoutError::validation("Fraction den must be non-zero"));
        }
        let sign = if den < 0 { -1 } else { 1 };
        let (num, den) = (i64::from(num) * sign, i64::from(den) * sign);
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        let (num, den) = (num / g, den / g);
        let num = i32::try_from(num)
            .map_err(|_| LayoutError::validation("Fraction numerator out of range"))?;
        let den = i32::try_from(den)
            .map_err(|_| LayoutError::validation("Fraction denominator out of range"))?;
        Ok(Self { num, den })
    }

    /// Whole-note count as a fraction (`n/1`).
    pub const fn whole(n: i32) -> Self {
        Self { num: n, den: 1 }
    }

    /// Numerator in lowest terms.
    pub fn numerator(self) -> i32 {
        self.num
    }

    /// Denominator in lowest terms, always positive.
    pub fn denominator(self) -> i32 {
        self.den
    }

    /// Integer tick value at [`DIVISION`] ticks per quarter note, truncated.
    pub fn ticks(self) -> i64 {
        i64::from(self.num) * DIVISION * 4 / i64::from(self.den)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplication preserves order.
        let lhs = i64::from(self.num) * i64::from(other.den);
        let rhs = i64::from(other.num) * i64::from(self.den);
        lhs.cmp(&rhs)
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<(i32, i32)> for Fraction {
    type Error = LayoutError;

    fn try_from((num, den): (i32, i32)) -> LayoutResult<Self> {
        Self::new(num, den)
    }
}

impl From<Fraction> for (i32, i32) {
    fn from(f: Fraction) -> Self {
        (f.num, f.den)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// 0-based staff index within a score.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct StaffIdx(pub usize);

/// 0-based system index within one layout of a score.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SystemIdx(pub usize);

/// Identity of a notation element, used for diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ElementId(pub u64);

/// Identity of a spanner owned by a score.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct SpannerId(pub u64);

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

//! Exact presentation timestamps.
//!
//! Container time bases differ between files and between tracks (1/90000,
//! 1/600, 1001/30000, ...). [`Timestamp`] stores a time value as a reduced
//! fraction of seconds so two timestamps built from different time bases
//! compare, order and hash by value.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

use ffmpeg_next::Rational;

/// A rational presentation time in seconds.
///
/// The fraction is always kept in lowest terms with a positive denominator,
/// which makes the derived `Eq` and `Hash` agree with the value-based
/// [`Ord`] implementation.
///
/// # Example
///
/// ```
/// use ffmpeg_next::Rational;
/// use framebar::Timestamp;
///
/// let a = Timestamp::from_pts(90_000, Rational::new(1, 90_000));
/// let b = Timestamp::from_pts(600, Rational::new(1, 600));
/// assert_eq!(a, b);
/// assert_eq!(a.as_millis(), 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    numerator: i64,
    denominator: i64,
}

impl Timestamp {
    /// Time zero.
    pub const ZERO: Timestamp = Timestamp {
        numerator: 0,
        denominator: 1,
    };

    /// Build a timestamp of `numerator / denominator` seconds.
    ///
    /// A zero denominator yields [`Timestamp::ZERO`].
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self::from_wide(numerator as i128, denominator as i128)
    }

    /// Build a timestamp from a PTS expressed in a stream time base.
    pub fn from_pts(pts: i64, time_base: Rational) -> Self {
        Self::from_wide(
            pts as i128 * time_base.numerator() as i128,
            time_base.denominator() as i128,
        )
    }

    /// Build a timestamp from whole milliseconds.
    pub fn from_millis(milliseconds: u64) -> Self {
        Self::from_wide(milliseconds as i128, 1000)
    }

    fn from_wide(numerator: i128, denominator: i128) -> Self {
        if denominator == 0 || numerator == 0 {
            return Self::ZERO;
        }
        let sign = if denominator < 0 { -1 } else { 1 };
        let (numerator, denominator) = (numerator * sign, denominator * sign);
        let divisor = gcd(numerator.unsigned_abs(), denominator.unsigned_abs()) as i128;
        let (numerator, denominator) = (numerator / divisor, denominator / divisor);
        Self {
            numerator: numerator.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
            denominator: denominator.min(i64::MAX as i128) as i64,
        }
    }

    /// Numerator of the reduced fraction of seconds.
    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    /// Denominator of the reduced fraction of seconds (always positive).
    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Returns `true` if the value is below zero.
    pub fn is_negative(&self) -> bool {
        self.numerator < 0
    }

    /// Clamp negative values to zero.
    pub fn max_zero(self) -> Self {
        if self.is_negative() { Self::ZERO } else { self }
    }

    /// Convert back to a PTS in `time_base`, rounding to the nearest tick.
    pub fn to_pts(&self, time_base: Rational) -> i64 {
        let dividend = self.numerator as i128 * time_base.denominator() as i128;
        let divisor = self.denominator as i128 * time_base.numerator() as i128;
        if divisor == 0 {
            return 0;
        }
        let (dividend, divisor) = if divisor < 0 {
            (-dividend, -divisor)
        } else {
            (dividend, divisor)
        };
        (2 * dividend + divisor).div_euclid(2 * divisor) as i64
    }

    /// Value in seconds as a float.
    pub fn as_secs_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Value in whole milliseconds, truncated toward zero.
    pub fn as_millis(&self) -> i64 {
        (self.numerator as i128 * 1000 / self.denominator as i128) as i64
    }

    /// Value as a [`Duration`]. Negative values become [`Duration::ZERO`].
    pub fn as_duration(&self) -> Duration {
        if self.numerator <= 0 {
            return Duration::ZERO;
        }
        let nanoseconds = self.numerator as u128 * 1_000_000_000 / self.denominator as u128;
        Duration::from_nanos(nanoseconds.min(u64::MAX as u128) as u64)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.numerator as i128 * other.denominator as i128;
        let right = other.numerator as i128 * self.denominator as i128;
        left.cmp(&right)
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn equal_values_from_different_time_bases() {
        let mpeg = Timestamp::from_pts(45_000, Rational::new(1, 90_000));
        let quicktime = Timestamp::from_pts(300, Rational::new(1, 600));
        assert_eq!(mpeg, quicktime);

        let mut map = HashMap::new();
        map.insert(mpeg, "half a second");
        assert_eq!(map.get(&quicktime), Some(&"half a second"));
    }

    #[test]
    fn ordering_is_exact() {
        // 1001/30000 s is slightly more than 1/30 s.
        let ntsc = Timestamp::from_pts(1, Rational::new(1001, 30_000));
        let thirty = Timestamp::new(1, 30);
        assert!(ntsc > thirty);
        assert!(Timestamp::ZERO < thirty);
    }

    #[test]
    fn pts_round_trip() {
        let time_base = Rational::new(1, 12_800);
        let timestamp = Timestamp::from_pts(25_600, time_base);
        assert_eq!(timestamp.to_pts(time_base), 25_600);
        assert_eq!(timestamp.to_pts(Rational::new(1, 1000)), 2000);
        assert_eq!(timestamp.as_duration(), Duration::from_secs(2));
    }

    #[test]
    fn zero_denominator_is_zero() {
        assert_eq!(Timestamp::new(5, 0), Timestamp::ZERO);
        assert_eq!(Timestamp::from_pts(10, Rational::new(1, 0)), Timestamp::ZERO);
    }

    #[test]
    fn negative_values_clamp() {
        let early = Timestamp::new(-1, 10);
        assert!(early.is_negative());
        assert_eq!(early.max_zero(), Timestamp::ZERO);
        assert_eq!(early.as_duration(), Duration::ZERO);
    }

    #[test]
    fn denominator_sign_is_normalised() {
        assert_eq!(Timestamp::new(1, -2), Timestamp::new(-1, 2));
        assert_eq!(Timestamp::new(2, 4).denominator(), 2);
    }
}

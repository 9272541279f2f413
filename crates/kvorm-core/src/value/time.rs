use serde::{Deserialize, Serialize};
use std::fmt;

const NANOS_PER_SECOND: i32 = 1_000_000_000;

///
/// Timestamp
///
/// Seconds and nanoseconds since the Unix epoch, limited to years 0001..=9999.
/// Field order gives the chronological order.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    /// 0001-01-01T00:00:00Z
    pub const MIN_SECONDS: i64 = -62_135_596_800;
    /// 9999-12-31T23:59:59Z
    pub const MAX_SECONDS: i64 = 253_402_300_799;

    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.seconds >= Self::MIN_SECONDS
            && self.seconds <= Self::MAX_SECONDS
            && self.nanos >= 0
            && self.nanos < NANOS_PER_SECOND
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

///
/// Duration
///
/// Signed span of time. Seconds and nanos always share a sign, so the
/// derived field order is the numeric order.
///

#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

impl Duration {
    /// Roughly 10,000 years.
    pub const MAX_SECONDS: i64 = 315_576_000_000;
    pub const MIN_SECONDS: i64 = -Self::MAX_SECONDS;

    #[must_use]
    pub const fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        if self.seconds < Self::MIN_SECONDS || self.seconds > Self::MAX_SECONDS {
            return false;
        }
        if self.nanos <= -NANOS_PER_SECOND || self.nanos >= NANOS_PER_SECOND {
            return false;
        }

        !((self.seconds > 0 && self.nanos < 0) || (self.seconds < 0 && self.nanos > 0))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds == 0 && self.nanos < 0 {
            write!(f, "-0.{:09}s", self.nanos.unsigned_abs())
        } else {
            write!(f, "{}.{:09}s", self.seconds, self.nanos.unsigned_abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_bounds() {
        assert!(Timestamp::new(Timestamp::MIN_SECONDS, 0).is_valid());
        assert!(Timestamp::new(Timestamp::MAX_SECONDS, 999_999_999).is_valid());
        assert!(!Timestamp::new(Timestamp::MAX_SECONDS + 1, 0).is_valid());
        assert!(!Timestamp::new(0, -1).is_valid());
        assert!(!Timestamp::new(0, NANOS_PER_SECOND).is_valid());
    }

    #[test]
    fn duration_signs_must_agree() {
        assert!(Duration::new(-3, -5).is_valid());
        assert!(Duration::new(0, -5).is_valid());
        assert!(!Duration::new(3, -5).is_valid());
        assert!(!Duration::new(-3, 5).is_valid());
        assert!(Duration::new(-3, -5) < Duration::new(-3, -4));
    }
}

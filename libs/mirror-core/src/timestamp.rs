use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,10})(?:\.(\d{1,9}))?$").expect("timestamp regex"));

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Consensus timestamp in nanoseconds since the epoch.
///
/// Wire form is `seconds` or `seconds.nanos`; a short fraction is right-padded,
/// so `"1.5"` is one and a half seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn nanos(&self) -> i64 {
        self.0
    }

    /// `None` for malformed input and for the largest representable instant,
    /// which has no successor in `int8range`.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = TIMESTAMP_RE.captures(raw)?;
        let secs: i64 = caps[1].parse().ok()?;
        let nanos = match caps.get(2) {
            Some(frac) => {
                let digits = frac.as_str();
                let value: i64 = digits.parse().ok()?;
                value * 10_i64.pow(9 - digits.len() as u32)
            }
            None => 0,
        };
        secs.checked_mul(NANOS_PER_SEC)?
            .checked_add(nanos)
            .filter(|n| *n < i64::MAX)
            .map(Self)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.div_euclid(NANOS_PER_SEC);
        let nanos = self.0.rem_euclid(NANOS_PER_SEC);
        write!(f, "{secs}.{nanos:09}")
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_forms() {
        assert_eq!(Timestamp::parse("12").unwrap().nanos(), 12 * NANOS_PER_SEC);
        assert_eq!(
            Timestamp::parse("12.000000007").unwrap().nanos(),
            12 * NANOS_PER_SEC + 7
        );
        assert_eq!(
            Timestamp::parse("1.5").unwrap().nanos(),
            NANOS_PER_SEC + 500_000_000
        );
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "-1", "1.", ".5", "1.1234567890", "abc", "1.2.3"] {
            assert!(Timestamp::parse(bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn rejects_the_largest_instant() {
        assert!(Timestamp::parse("9223372036.854775807").is_none());
        assert!(Timestamp::parse("9223372036.854775808").is_none());
        assert_eq!(
            Timestamp::parse("9223372036.854775806").unwrap().nanos(),
            i64::MAX - 1
        );
    }

    #[test]
    fn renders_nine_digit_fraction() {
        let ts = Timestamp::from_nanos(1_600_000_000 * NANOS_PER_SEC + 42);
        assert_eq!(ts.to_string(), "1600000000.000000042");
        assert_eq!(Timestamp::parse(&ts.to_string()), Some(ts));
    }
}

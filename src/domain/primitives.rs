//! Domain primitives.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current time in milliseconds since Unix epoch.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed from `self` to `other` (zero if `other` is earlier).
    pub fn elapsed_until(&self, other: TimeMs) -> i64 {
        (other.0 - self.0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }

    #[test]
    fn test_elapsed_until_clamps_negative() {
        let earlier = TimeMs::new(1000);
        let later = TimeMs::new(4000);
        assert_eq!(earlier.elapsed_until(later), 3000);
        assert_eq!(later.elapsed_until(earlier), 0);
    }

    #[test]
    fn test_timems_serializes_as_number() {
        let json = serde_json::to_value(TimeMs::new(1234)).unwrap();
        assert_eq!(json, serde_json::json!(1234));
    }
}

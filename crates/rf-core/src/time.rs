//! Virtual simulation time.
//!
//! Time is an integer count of milliseconds since the simulation clock was
//! created.  Every scheduled task fires at a `SimTime`; the async driver maps
//! wall-clock `Instant`s onto it, while tests advance it by hand.  Integer
//! milliseconds keep scheduling arithmetic exact.

use std::fmt;

/// Milliseconds of virtual time since the clock origin.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_millis(ms: u64) -> Self {
        SimTime(ms)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// `self + ms`, saturating at `u64::MAX`.
    #[inline]
    pub fn after(self, ms: u64) -> SimTime {
        SimTime(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed from `earlier` to `self`; zero if `earlier` is
    /// in the future.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.after(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: SimTime) -> u64 {
        self.since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.0 / 1_000;
        let h = total_secs / 3_600;
        let m = (total_secs % 3_600) / 60;
        let s = total_secs % 60;
        write!(f, "T+{h:02}:{m:02}:{s:02}.{:03}", self.0 % 1_000)
    }
}

/// Convert an elapsed duration in milliseconds to hours.
#[inline]
pub fn millis_to_hours(ms: u64) -> f64 {
    ms as f64 / 3_600_000.0
}

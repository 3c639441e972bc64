use std::fmt;

use serde::{Deserialize, Serialize};

use super::world_state::TimePeriod;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const HOURS_PER_PERIOD: u64 = 6;

pub const SECONDS_PER_HOUR: u64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR; // 3,600
pub const SECONDS_PER_PERIOD: u64 = SECONDS_PER_HOUR * HOURS_PER_PERIOD; // 21,600
pub const SECONDS_PER_DAY: u64 = SECONDS_PER_HOUR * HOURS_PER_DAY; // 86,400

/// Simulated (in-game) time as whole seconds since the session epoch (day 0, 00:00).
///
/// A plain `u64` wrapper. Calendar accessors are derived via division/modulo, so natural
/// ordering equals chronological ordering. Every timer in the dispatch core compares
/// `SimTime` values, never wall-clock time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds)
    }

    pub fn from_minutes(minutes: u64) -> Self {
        Self(minutes * SECONDS_PER_MINUTE)
    }

    /// Day index (0-based), hour (0–23), minute (0–59).
    pub fn new(day: u64, hour: u64, minute: u64) -> Self {
        debug_assert!(hour < HOURS_PER_DAY, "hour out of range: {hour}");
        debug_assert!(minute < MINUTES_PER_HOUR, "minute out of range: {minute}");
        Self(day * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR + minute * SECONDS_PER_MINUTE)
    }

    pub fn as_seconds(self) -> u64 {
        self.0
    }

    pub fn day(self) -> u64 {
        self.0 / SECONDS_PER_DAY
    }

    /// Hour of day (0–23).
    pub fn hour(self) -> u64 {
        (self.0 % SECONDS_PER_DAY) / SECONDS_PER_HOUR
    }

    /// Minute of hour (0–59).
    pub fn minute(self) -> u64 {
        (self.0 % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }

    pub fn second(self) -> u64 {
        self.0 % SECONDS_PER_MINUTE
    }

    pub fn period(self) -> TimePeriod {
        TimePeriod::from_hour(self.hour())
    }

    /// Seconds until the next time-of-day period boundary. Always at least 1: at the
    /// exact boundary the *following* boundary is reported.
    pub fn seconds_until_next_period(self) -> u64 {
        let into_period = (self.0 % SECONDS_PER_DAY) % SECONDS_PER_PERIOD;
        SECONDS_PER_PERIOD - into_period
    }

    pub fn plus_seconds(self, seconds: u64) -> Self {
        Self(self.0.saturating_add(seconds))
    }

    pub fn minus_seconds(self, seconds: u64) -> Self {
        Self(self.0.saturating_sub(seconds))
    }

    /// Whole seconds elapsed between `earlier` and `self` (saturating).
    pub fn seconds_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "D{} {:02}:{:02}:{:02}",
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_accessors() {
        let t = SimTime::new(3, 14, 25).plus_seconds(9);
        assert_eq!(t.day(), 3);
        assert_eq!(t.hour(), 14);
        assert_eq!(t.minute(), 25);
        assert_eq!(t.second(), 9);
        assert_eq!(t.to_string(), "D3 14:25:09");
    }

    #[test]
    fn period_follows_hour() {
        assert_eq!(SimTime::new(0, 5, 59).period(), TimePeriod::Night);
        assert_eq!(SimTime::new(0, 6, 0).period(), TimePeriod::Morning);
        assert_eq!(SimTime::new(0, 12, 0).period(), TimePeriod::Day);
        assert_eq!(SimTime::new(0, 23, 59).period(), TimePeriod::Evening);
    }

    #[test]
    fn seconds_until_next_period_never_zero() {
        assert_eq!(SimTime::new(0, 6, 0).seconds_until_next_period(), SECONDS_PER_PERIOD);
        assert_eq!(SimTime::new(0, 11, 59).seconds_until_next_period(), 60);
        assert_eq!(
            SimTime::new(1, 23, 59).plus_seconds(59).seconds_until_next_period(),
            1
        );
    }

    #[test]
    fn saturating_arithmetic() {
        let t = SimTime::from_seconds(10);
        assert_eq!(t.minus_seconds(60), SimTime::from_seconds(0));
        assert_eq!(SimTime::from_seconds(5).seconds_since(t), 0);
        assert_eq!(t.seconds_since(SimTime::from_seconds(4)), 6);
    }
}

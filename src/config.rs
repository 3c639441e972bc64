use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{DurationRange, ResponseCode};

/// Tunables for schedulers, units and the tick driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Location-search attempts per scheduler iteration.
    pub max_location_attempts: u32,
    /// Consecutive failed iterations before a region stops itself.
    pub max_consecutive_failures: u32,
    /// Lower bound for any scheduler sleep, in real milliseconds.
    pub min_delay_ms: u64,
    /// Travel time for lights-and-sirens responses (simulated seconds).
    pub code3_travel: DurationRange,
    /// Travel time for routine responses (simulated seconds).
    pub code2_travel: DurationRange,
    /// Rest period after a successfully completed call (simulated seconds).
    pub meal_break_secs: u64,
    /// Chance that a unit assigned with random completion is already on scene.
    pub on_scene_probability: f64,
    /// Simulated seconds the ECS clock advances per tick.
    pub seconds_per_tick: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_location_attempts: 10,
            max_consecutive_failures: 3,
            min_delay_ms: 1_000,
            code3_travel: DurationRange::fixed(120, 360),
            code2_travel: DurationRange::fixed(300, 720),
            meal_break_secs: 30 * 60,
            on_scene_probability: 0.8,
            seconds_per_tick: 1,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(SimError::InvalidConfiguration(msg.to_string()));
        if self.max_location_attempts == 0 {
            return fail("max_location_attempts must be at least 1");
        }
        if self.max_consecutive_failures == 0 {
            return fail("max_consecutive_failures must be at least 1");
        }
        if !self.code3_travel.is_valid() || !self.code2_travel.is_valid() {
            return fail("travel ranges must be non-empty and start at 1s or later");
        }
        if self.meal_break_secs == 0 {
            return fail("meal_break_secs must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.on_scene_probability) {
            return fail("on_scene_probability must be within [0, 1]");
        }
        if self.seconds_per_tick == 0 {
            return fail("seconds_per_tick must be at least 1");
        }
        Ok(())
    }

    pub fn travel_range(&self, response: ResponseCode) -> DurationRange {
        match response {
            ResponseCode::Code3 => self.code3_travel,
            ResponseCode::Code2 => self.code2_travel,
        }
    }
}

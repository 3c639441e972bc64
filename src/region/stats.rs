//! Crime levels and the pacing they imply.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::zone::Zone;
use crate::model::time::SECONDS_PER_PERIOD;
use crate::model::{SimTime, TimePeriod};
use crate::sampling::WeightedSampler;
use crate::world::real_ms_for;

/// How busy a region is for the current period. Re-drawn at every period change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CrimeLevel {
    None,
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl CrimeLevel {
    pub const ALL: [CrimeLevel; 6] = [
        CrimeLevel::None,
        CrimeLevel::VeryLow,
        CrimeLevel::Low,
        CrimeLevel::Moderate,
        CrimeLevel::High,
        CrimeLevel::VeryHigh,
    ];

    pub fn draw_weight(self) -> u32 {
        match self {
            Self::None => 5,
            Self::VeryLow => 10,
            Self::Low => 20,
            Self::Moderate => 35,
            Self::High => 20,
            Self::VeryHigh => 10,
        }
    }

    /// Multipliers applied to the expected gap between events. Busier levels
    /// shorten the gap. `None` has no gap: the region idles until the next period.
    pub fn delay_factors(self) -> Option<(f64, f64)> {
        match self {
            Self::None => None,
            Self::VeryLow => Some((1.75, 2.5)),
            Self::Low => Some((1.25, 1.75)),
            Self::Moderate => Some((0.9, 1.25)),
            Self::High => Some((0.6, 0.9)),
            Self::VeryHigh => Some((0.4, 0.6)),
        }
    }

    pub fn sampler() -> WeightedSampler<CrimeLevel> {
        let mut sampler = WeightedSampler::new();
        for level in Self::ALL {
            sampler.add(level, level.draw_weight());
        }
        sampler
    }
}

impl fmt::Display for CrimeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Expected call volume of a region, per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionCrimeStatistics {
    expected_calls: [u32; 4],
    ms_per_event: [Option<u64>; 4],
}

impl RegionCrimeStatistics {
    /// Sum the zones' expected calls and convert them to real-time gaps at the
    /// given time scale.
    pub fn compute<'a>(zones: impl IntoIterator<Item = &'a Arc<Zone>>, time_scale: u32) -> Self {
        let mut expected_calls = [0u32; 4];
        for zone in zones {
            for period in TimePeriod::ALL {
                let slot = &mut expected_calls[period.index()];
                *slot = slot.saturating_add(zone.expected_calls(period));
            }
        }
        let period_ms = real_ms_for(SECONDS_PER_PERIOD, time_scale);
        let ms_per_event = expected_calls.map(|count| {
            (count > 0).then(|| period_ms / u64::from(count))
        });
        Self {
            expected_calls,
            ms_per_event,
        }
    }

    pub fn expected_calls(&self, period: TimePeriod) -> u32 {
        self.expected_calls[period.index()]
    }

    /// Real milliseconds between events in `period`. `None` when no calls are expected.
    pub fn ms_per_event(&self, period: TimePeriod) -> Option<u64> {
        self.ms_per_event[period.index()]
    }
}

/// Closed range of real milliseconds the scheduler sleeps between iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn draw(&self, rng: &mut dyn RngCore) -> u64 {
        rng.random_range(self.min_ms..=self.max_ms)
    }

    pub fn contains(&self, ms: u64) -> bool {
        (self.min_ms..=self.max_ms).contains(&ms)
    }
}

/// Inputs to [`derive_delay`].
#[derive(Debug, Clone, Copy)]
pub struct Pacing<'a> {
    pub statistics: &'a RegionCrimeStatistics,
    pub level: CrimeLevel,
    pub now: SimTime,
    pub time_scale: u32,
    pub min_delay_ms: u64,
}

/// Derive the sleep range for the period `now` falls in.
///
/// The expected gap between events is scaled by the crime level. A quiet
/// region, or one at [`CrimeLevel::None`], waits out the rest of the period.
/// Ranges that would start after the period ends are clamped to
/// `[remaining, remaining + one period]`. The result is never inverted and
/// never below `min_delay_ms` (itself at least 1 ms).
pub fn derive_delay(pacing: Pacing<'_>) -> DelayRange {
    let remaining = real_ms_for(pacing.now.seconds_until_next_period(), pacing.time_scale);
    let period_ms = real_ms_for(SECONDS_PER_PERIOD, pacing.time_scale);
    let base = pacing.statistics.ms_per_event(pacing.now.period());

    let (min_ms, max_ms) = match (base, pacing.level.delay_factors()) {
        (Some(base), Some((low, high))) => {
            let min = scale(base, low);
            if min > remaining {
                (remaining, remaining.saturating_add(period_ms))
            } else {
                (min, scale(base, high))
            }
        }
        _ => (remaining, remaining),
    };

    let floor = pacing.min_delay_ms.max(1);
    let min_ms = min_ms.max(floor);
    DelayRange {
        min_ms,
        max_ms: max_ms.max(min_ms),
    }
}

fn scale(ms: u64, factor: f64) -> u64 {
    (ms as f64 * factor).round() as u64
}

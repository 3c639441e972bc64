use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{TimePeriod, Weather, WeatherCategory};
use crate::world::WorldState;

const PERIODS: usize = TimePeriod::ALL.len();
const CATEGORIES: usize = WeatherCategory::ALL.len();

/// Spawn-weight multipliers per (time period, weather category).
///
/// Dense: every cell exists and defaults to 0. An item's current weight is
/// `base * cell`, so "more burglaries at night, fewer in snow" is data rather
/// than code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStateMultiplierTable {
    base: u32,
    cells: [[u32; CATEGORIES]; PERIODS],
}

impl WorldStateMultiplierTable {
    pub fn new(base: u32) -> Result<Self> {
        validate_base(base)?;
        Ok(Self {
            base,
            cells: [[0; CATEGORIES]; PERIODS],
        })
    }

    /// Every cell set to `value`.
    pub fn uniform(base: u32, value: u32) -> Result<Self> {
        validate_base(base)?;
        Ok(Self {
            base,
            cells: [[value; CATEGORIES]; PERIODS],
        })
    }

    /// Build from an explicit cell list. Every (period, category) pair must appear
    /// exactly once.
    pub fn from_entries(
        base: u32,
        entries: impl IntoIterator<Item = (TimePeriod, WeatherCategory, u32)>,
    ) -> Result<Self> {
        let mut table = Self::new(base)?;
        let mut seen = [[false; CATEGORIES]; PERIODS];
        for (period, category, value) in entries {
            let slot = &mut seen[period.index()][category.index()];
            if *slot {
                return Err(SimError::InvalidConfiguration(format!(
                    "multiplier cell ({period}, {category:?}) set twice"
                )));
            }
            *slot = true;
            table.set_multiplier(period, category, value);
        }
        for period in TimePeriod::ALL {
            for category in WeatherCategory::ALL {
                if !seen[period.index()][category.index()] {
                    return Err(SimError::InvalidConfiguration(format!(
                        "multiplier cell ({period}, {category:?}) is missing"
                    )));
                }
            }
        }
        Ok(table)
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn set_multiplier(&mut self, period: TimePeriod, category: WeatherCategory, value: u32) {
        self.cells[period.index()][category.index()] = value;
    }

    /// Builder form of [`set_multiplier`](Self::set_multiplier).
    pub fn with(mut self, period: TimePeriod, category: WeatherCategory, value: u32) -> Self {
        self.set_multiplier(period, category, value);
        self
    }

    /// Set one period's value for every weather category.
    pub fn with_period(mut self, period: TimePeriod, value: u32) -> Self {
        self.cells[period.index()] = [value; CATEGORIES];
        self
    }

    pub fn multiplier(&self, period: TimePeriod, category: WeatherCategory) -> u32 {
        self.cells[period.index()][category.index()]
    }

    pub fn evaluate(&self, period: TimePeriod, weather: Weather) -> u32 {
        self.base
            .saturating_mul(self.multiplier(period, weather.category()))
    }

    pub fn evaluate_current(&self, world: &WorldState) -> u32 {
        let snapshot = world.snapshot();
        self.evaluate(snapshot.period(), snapshot.weather)
    }
}

fn validate_base(base: u32) -> Result<()> {
    if base == 0 {
        return Err(SimError::InvalidConfiguration(
            "base multiplier must be at least 1".to_string(),
        ));
    }
    Ok(())
}

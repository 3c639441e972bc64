use std::fmt;

use rand::RngCore;

use crate::error::{Result, SimError};
use crate::model::{CallCategory, TimePeriod};
use crate::sampling::WeightedSampler;

/// A named area of a region with its own call volume and call mix.
///
/// `expected_calls` is the number of calls the zone should produce over one
/// six-hour period, indexed by [`TimePeriod::index`].
pub struct Zone {
    name: String,
    expected_calls: [u32; 4],
    categories: WeightedSampler<CallCategory>,
}

impl Zone {
    pub fn new(name: impl Into<String>, expected_calls: [u32; 4]) -> Self {
        Self {
            name: name.into(),
            expected_calls,
            categories: WeightedSampler::new(),
        }
    }

    /// Builder form of [`Zone::add_category`].
    pub fn with_category(mut self, category: CallCategory, weight: u32) -> Self {
        self.add_category(category, weight);
        self
    }

    pub fn add_category(&mut self, category: CallCategory, weight: u32) {
        self.categories.add(category, weight);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected_calls(&self, period: TimePeriod) -> u32 {
        self.expected_calls[period.index()]
    }

    pub fn categories(&self) -> &WeightedSampler<CallCategory> {
        &self.categories
    }

    pub fn draw_category(&self, rng: &mut dyn RngCore) -> Result<CallCategory> {
        self.categories.draw(rng).copied().map_err(|err| {
            if err.is_sampling_failure() {
                SimError::NoEligibleEvent {
                    zone: self.name.clone(),
                }
            } else {
                err
            }
        })
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("name", &self.name)
            .field("expected_calls", &self.expected_calls)
            .field("categories", &self.categories.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn expected_calls_follow_period() {
        let zone = Zone::new("Vinewood", [4, 6, 9, 2]);
        assert_eq!(zone.expected_calls(TimePeriod::Morning), 4);
        assert_eq!(zone.expected_calls(TimePeriod::Night), 2);
    }

    #[test]
    fn zone_without_categories_has_no_eligible_event() {
        let zone = Zone::new("Vinewood", [1; 4]);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            zone.draw_category(&mut rng),
            Err(SimError::NoEligibleEvent {
                zone: "Vinewood".to_string()
            })
        );
    }

    #[test]
    fn single_category_always_drawn() {
        let zone = Zone::new("Vinewood", [1; 4]).with_category(CallCategory::Traffic, 3);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            assert_eq!(zone.draw_category(&mut rng), Ok(CallCategory::Traffic));
        }
    }
}

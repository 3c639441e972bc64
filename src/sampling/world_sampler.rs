use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use rand::RngCore;

use super::multiplier::WorldStateMultiplierTable;
use super::weighted::WeightedSampler;
use crate::error::Result;
use crate::observer::Subscription;
use crate::sync::lock;
use crate::world::{WorldSnapshot, WorldState, WorldStateEvent};

#[derive(Debug, Clone)]
pub struct WorldStateItem<T> {
    pub value: T,
    pub table: WorldStateMultiplierTable,
}

/// A weighted sampler whose weights follow the time of day and the weather.
///
/// Each item carries a multiplier table; its weight is re-evaluated against the
/// current world state whenever the period or the weather changes. The sampler
/// holds one subscription on the world-state hub and releases it when dropped.
pub struct WorldStateWeightedSampler<T> {
    inner: Arc<Mutex<WeightedSampler<WorldStateItem<T>>>>,
    world: Arc<WorldState>,
    _subscription: Subscription,
}

impl<T: Clone + Send + 'static> WorldStateWeightedSampler<T> {
    pub fn new(world: Arc<WorldState>) -> Self {
        let inner = Arc::new(Mutex::new(WeightedSampler::new()));
        let sampler: Weak<Mutex<WeightedSampler<WorldStateItem<T>>>> = Arc::downgrade(&inner);
        let hub: Weak<WorldState> = Arc::downgrade(&world);
        let subscription = world.subscribe(move |event| match event {
            WorldStateEvent::TimePeriodChanged { .. } | WorldStateEvent::WeatherChanged { .. } => {
                if let (Some(sampler), Some(hub)) = (sampler.upgrade(), hub.upgrade()) {
                    reweigh(&mut lock(&sampler), &hub.snapshot());
                }
            }
            WorldStateEvent::TimeScaleChanged { .. } => {}
        });
        Self {
            inner,
            world,
            _subscription: subscription,
        }
    }

    /// Add an item. Its weight is evaluated now and again on every rebuild.
    pub fn add(&self, value: T, table: WorldStateMultiplierTable) {
        let snapshot = self.world.snapshot();
        let weight = table.evaluate(snapshot.period(), snapshot.weather);
        lock(&self.inner).add(WorldStateItem { value, table }, weight);
    }

    pub fn clear(&self) {
        lock(&self.inner).clear();
    }

    /// Re-evaluate every item against the current world state.
    pub fn rebuild(&self) {
        let snapshot = self.world.snapshot();
        reweigh(&mut lock(&self.inner), &snapshot);
    }

    pub fn draw(&self, rng: &mut dyn RngCore) -> Result<T> {
        lock(&self.inner).draw(rng).map(|item| item.value.clone())
    }

    pub fn try_draw(&self, rng: &mut dyn RngCore) -> Option<T> {
        self.draw(rng).ok()
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).is_empty()
    }

    pub fn total(&self) -> u64 {
        lock(&self.inner).total()
    }

    /// Current weights in insertion order.
    pub fn weights(&self) -> Vec<u32> {
        lock(&self.inner).items().iter().map(|i| i.weight()).collect()
    }

    /// Deterministic lookup of the item owning `roll`.
    pub fn select(&self, roll: u64) -> Option<T> {
        lock(&self.inner).select(roll).map(|item| item.value.clone())
    }
}

fn reweigh<T>(sampler: &mut WeightedSampler<WorldStateItem<T>>, snapshot: &WorldSnapshot) {
    let period = snapshot.period();
    let weather = snapshot.weather;
    sampler.reweight(|item| item.table.evaluate(period, weather));
}

impl<T> fmt::Debug for WorldStateWeightedSampler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("WorldStateWeightedSampler")
            .field("items", &inner.len())
            .field("total", &inner.total())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::{SimTime, TimePeriod, Weather, WeatherCategory};

    fn world_at(hour: u64, weather: Weather) -> Arc<WorldState> {
        Arc::new(WorldState::new(SimTime::new(0, hour, 0), weather, 30).unwrap())
    }

    #[test]
    fn add_evaluates_current_state() {
        let world = world_at(8, Weather::Clear);
        let sampler = WorldStateWeightedSampler::new(world);
        let table = WorldStateMultiplierTable::new(2)
            .unwrap()
            .with(TimePeriod::Morning, WeatherCategory::Clear, 5);
        sampler.add("jogger", table);
        assert_eq!(sampler.weights(), vec![10]);
    }

    #[test]
    fn weather_change_rebuilds() {
        let world = world_at(8, Weather::Clear);
        let sampler = WorldStateWeightedSampler::new(world.clone());
        sampler.add(
            "crash",
            WorldStateMultiplierTable::new(1)
                .unwrap()
                .with(TimePeriod::Morning, WeatherCategory::Clear, 1)
                .with(TimePeriod::Morning, WeatherCategory::Rain, 9),
        );
        assert_eq!(sampler.total(), 1);
        world.set_weather(Weather::Raining);
        assert_eq!(sampler.total(), 9);
    }

    #[test]
    fn time_scale_change_does_not_rebuild() {
        let world = world_at(8, Weather::Clear);
        let sampler = WorldStateWeightedSampler::new(world.clone());
        sampler.add("x", WorldStateMultiplierTable::uniform(1, 3).unwrap());
        world.set_time_scale(60).unwrap();
        assert_eq!(sampler.weights(), vec![3]);
    }

    #[test]
    fn drop_unsubscribes() {
        let world = world_at(8, Weather::Clear);
        let sampler: WorldStateWeightedSampler<u8> = WorldStateWeightedSampler::new(world.clone());
        assert_eq!(world.observer_count(), 1);
        drop(sampler);
        assert_eq!(world.observer_count(), 0);
    }

    #[test]
    fn all_zero_draw_fails_but_try_draw_is_none() {
        let world = world_at(8, Weather::Clear);
        let sampler = WorldStateWeightedSampler::new(world);
        sampler.add(1u8, WorldStateMultiplierTable::new(1).unwrap());
        sampler.add(2u8, WorldStateMultiplierTable::new(1).unwrap());
        let mut rng = StdRng::seed_from_u64(3);
        assert!(sampler.draw(&mut rng).is_err());
        assert_eq!(sampler.try_draw(&mut rng), None);
    }
}

use bevy_ecs::resource::Resource;
use bevy_ecs::system::{Res, ResMut};

use super::resources::DispatchServices;
use crate::model::SimTime;

/// Simulation clock resource tracking the current time and tick count.
///
/// `advance_clock` moves the clock forward at the end of each tick (in
/// `DispatchPhase::Last`), so systems see the current time before it advances.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SimClock {
    pub time: SimTime,
    pub tick_count: u64,
    pub seconds_per_tick: u64,
}

impl SimClock {
    pub fn new(start: SimTime, seconds_per_tick: u64) -> Self {
        Self {
            time: start,
            tick_count: 0,
            seconds_per_tick: seconds_per_tick.max(1),
        }
    }

    pub fn advance(&mut self) {
        self.time = self.time.plus_seconds(self.seconds_per_tick);
        self.tick_count += 1;
    }
}

/// Advances the clock by one tick. Registered in `DispatchPhase::Last`.
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}

/// Pushes the clock into the shared world state so period observers (region
/// schedulers, world-state samplers) see the same time as the units.
pub fn sync_world_time(clock: Res<SimClock>, services: Res<DispatchServices>) {
    if services.world.current_time() != clock.time {
        services.world.set_time(clock.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_by_step() {
        let mut clock = SimClock::new(SimTime::new(0, 5, 59), 30);
        clock.advance();
        clock.advance();
        assert_eq!(clock.time, SimTime::new(0, 6, 0));
        assert_eq!(clock.tick_count, 2);
    }

    #[test]
    fn zero_step_is_raised_to_one_second() {
        let mut clock = SimClock::new(SimTime::default(), 0);
        clock.advance();
        assert_eq!(clock.time.as_seconds(), 1);
    }
}

use bevy_app::App;
use bevy_ecs::message::MessageRegistry;
use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs};
use rand::rngs::StdRng;

use super::clock::SimClock;
use super::events::UnitStatusChanged;
use super::resources::{DispatchServices, TickRng};
use super::schedule::{DispatchPhase, configure_dispatch_schedule};
use super::systems::{advance_units, assign_pending_calls};

/// Build a headless Bevy app that drives units against the shared registry.
///
/// The clock starts at the world state's current time.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use dispatch_sim::ecs::DispatchTick;
/// # use dispatch_sim::model::{SimTime, Weather};
/// # use dispatch_sim::{DispatchConfig, EventType, SimulationContext, WorldState};
/// let world = Arc::new(WorldState::new(SimTime::default(), Weather::Clear, 30).unwrap());
/// let mut ctx =
///     SimulationContext::new(DispatchConfig::default(), world, Vec::<EventType>::new()).unwrap();
/// let mut app = ctx.build_tick_app();
/// for _ in 0..3_600 {
///     app.world_mut().run_schedule(DispatchTick);
/// }
/// ```
pub fn build_dispatch_app(services: DispatchServices, rng: StdRng) -> App {
    build_dispatch_app_with_executor(services, rng, ExecutorKind::SingleThreaded)
}

/// Build the app with a specific executor kind. Both unit systems mutate every
/// unit, so they serialize regardless; single-threaded avoids pool start-up.
pub fn build_dispatch_app_with_executor(
    services: DispatchServices,
    rng: StdRng,
    executor: ExecutorKind,
) -> App {
    let mut app = App::empty();

    app.insert_resource(SimClock::new(
        services.world.current_time(),
        services.config.seconds_per_tick,
    ));
    app.insert_resource(services);
    app.insert_resource(TickRng(rng));

    MessageRegistry::register_message::<UnitStatusChanged>(app.world_mut());

    let mut schedule = configure_dispatch_schedule(executor);
    schedule.add_systems(bevy_ecs::message::message_update_system.in_set(DispatchPhase::PreUpdate));
    schedule.add_systems(assign_pending_calls.in_set(DispatchPhase::Assign));
    schedule.add_systems(advance_units.in_set(DispatchPhase::Advance));
    app.add_schedule(schedule);
    app
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;

    use super::*;
    use crate::config::DispatchConfig;
    use crate::dispatch::CallRegistry;
    use crate::ecs::schedule::DispatchTick;
    use crate::id::IdGenerator;
    use crate::model::{SimTime, Weather};
    use crate::signal::SignalBus;
    use crate::world::WorldState;

    fn services(start: SimTime, seconds_per_tick: u64) -> DispatchServices {
        DispatchServices {
            registry: Arc::new(CallRegistry::new(
                IdGenerator::new(),
                Arc::new(SignalBus::new()),
            )),
            world: Arc::new(WorldState::new(start, Weather::Clear, 30).unwrap()),
            config: DispatchConfig {
                seconds_per_tick,
                ..DispatchConfig::default()
            },
        }
    }

    #[test]
    fn clock_starts_at_world_time() {
        let start = SimTime::new(2, 7, 15);
        let app = build_dispatch_app(services(start, 10), StdRng::seed_from_u64(1));
        let clock = app.world().resource::<SimClock>();
        assert_eq!(clock.time, start);
        assert_eq!(clock.tick_count, 0);
    }

    #[test]
    fn ticks_advance_clock_and_world() {
        let services = services(SimTime::new(0, 5, 59), 30);
        let world = services.world.clone();
        let mut app = build_dispatch_app(services, StdRng::seed_from_u64(1));
        for _ in 0..2 {
            app.world_mut().run_schedule(DispatchTick);
        }
        assert_eq!(app.world().resource::<SimClock>().time, SimTime::new(0, 6, 0));
        // the world is synced at the start of each tick, so it trails by one step
        assert_eq!(world.current_time(), SimTime::new(0, 5, 59).plus_seconds(30));
    }
}

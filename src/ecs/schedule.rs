use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, ScheduleLabel, SystemSet};

use super::clock::{advance_clock, sync_world_time};

/// Schedule label for one dispatch tick.
/// Run manually via `app.world_mut().run_schedule(DispatchTick)`.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct DispatchTick;

/// Ordered phases within each tick: PreUpdate < Assign < Advance < Last.
///
/// Assignment runs before units advance, so a unit freed this tick is only
/// matched to a new call on the next one.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispatchPhase {
    PreUpdate,
    Assign,
    Advance,
    Last,
}

/// Build a configured `DispatchTick` schedule with phase ordering and the clock.
pub fn configure_dispatch_schedule(executor: ExecutorKind) -> Schedule {
    let mut schedule = Schedule::new(DispatchTick);
    schedule.set_executor_kind(executor);
    schedule.configure_sets(
        (
            DispatchPhase::PreUpdate,
            DispatchPhase::Assign,
            DispatchPhase::Advance,
            DispatchPhase::Last,
        )
            .chain(),
    );
    schedule.add_systems(sync_world_time.in_set(DispatchPhase::PreUpdate));
    schedule.add_systems(advance_clock.in_set(DispatchPhase::Last));
    schedule
}

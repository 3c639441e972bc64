mod common;

use std::sync::{Arc, Mutex};

use bevy_ecs::message::MessageReader;
use bevy_ecs::schedule::IntoScheduleConfigs;
use dispatch_sim::SimulationContext;
use dispatch_sim::dispatch::UnitStatus;
use dispatch_sim::ecs::{DispatchPhase, DispatchTick, SimClock, Unit, UnitStatusChanged, spawn_unit};
use dispatch_sim::model::{CallOutcome, Location, LocationType, SimTime, Weather};
use dispatch_sim::{DispatchConfig, SimulatedUnit};

fn context(seconds_per_tick: u64) -> SimulationContext {
    let world = common::world_at(SimTime::new(0, 20, 0), Weather::Clear, 30);
    let config = DispatchConfig {
        seconds_per_tick,
        ..DispatchConfig::default()
    };
    SimulationContext::seeded(config, world, common::standard_events(), 99).unwrap()
}

fn create(ctx: &SimulationContext, event: &str, location_id: u64) -> u64 {
    let event = ctx.catalog().get(event).unwrap();
    let location = Location::new(location_id, "Forum Drive", LocationType::Street, [0.0; 3]);
    ctx.registry()
        .create_call(event, location, ctx.world().current_time())
}

#[test]
fn clock_drives_world_state() {
    let mut ctx = context(60);
    let mut app = ctx.build_tick_app();
    for _ in 0..10 {
        app.world_mut().run_schedule(DispatchTick);
    }
    let clock = *app.world().resource::<SimClock>();
    assert_eq!(clock.tick_count, 10);
    assert_eq!(clock.time, SimTime::new(0, 20, 10));
    // the world sees the time of the last tick that ran
    assert_eq!(ctx.world().current_time(), SimTime::new(0, 20, 9));
}

#[test]
fn code3_calls_are_assigned_first() {
    let mut ctx = context(1);
    let traffic = create(&ctx, "Traffic Stop", 1);
    let shots = create(&ctx, "Shots Fired", 2);

    let mut app = ctx.build_tick_app();
    let unit = spawn_unit(
        app.world_mut(),
        SimulatedUnit::new("2-ADAM-7", ctx.world().current_time()),
    );
    app.world_mut().run_schedule(DispatchTick);

    let assigned = app.world().get::<Unit>(unit).unwrap();
    assert_eq!(assigned.0.status(), UnitStatus::Dispatched);
    assert_eq!(assigned.0.current_call(), Some(shots));
    assert_eq!(ctx.registry().pending_calls()[0].id, traffic);
}

#[test]
fn one_unit_works_the_queue() {
    let mut ctx = context(60);
    let shots = create(&ctx, "Shots Fired", 1);
    let traffic = create(&ctx, "Traffic Stop", 2);

    let mut app = ctx.build_tick_app();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    app.add_systems(
        DispatchTick,
        (move |mut changed: MessageReader<UnitStatusChanged>| {
            for msg in changed.read() {
                sink.lock().unwrap().push(msg.transition.to);
            }
        })
        .in_set(DispatchPhase::Last),
    );
    spawn_unit(
        app.world_mut(),
        SimulatedUnit::new("2-ADAM-7", ctx.world().current_time()),
    );

    // 4 simulated hours at one minute per tick
    for _ in 0..240 {
        app.world_mut().run_schedule(DispatchTick);
    }

    let cycle = [
        UnitStatus::Dispatched,
        UnitStatus::OnScene,
        UnitStatus::MealBreak,
        UnitStatus::Available,
    ];
    assert_eq!(*seen.lock().unwrap(), [cycle, cycle].concat());

    let completed = ctx.registry().drain_completed();
    let order: Vec<u64> = completed.iter().map(|c| c.id).collect();
    assert_eq!(order, vec![shots, traffic]);
    assert!(completed.iter().all(|c| c.outcome == CallOutcome::Completed));
    assert_eq!(ctx.registry().active_count(), 0);
}

#[test]
fn player_unit_is_left_alone() {
    let mut ctx = context(60);
    create(&ctx, "Shots Fired", 1);
    let mut app = ctx.build_tick_app();
    let player = spawn_unit(
        app.world_mut(),
        SimulatedUnit::with_presence(
            "PLAYER",
            ctx.world().current_time(),
            Box::new(dispatch_sim::dispatch::PlayerPresence),
        ),
    );
    for _ in 0..30 {
        app.world_mut().run_schedule(DispatchTick);
    }
    assert!(app.world().get::<Unit>(player).unwrap().0.is_available());
    assert_eq!(ctx.registry().pending_calls().len(), 1);
}

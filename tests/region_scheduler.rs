mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::{NoVacancy, StreetGrid};
use dispatch_sim::model::{SimTime, Weather};
use dispatch_sim::region::SchedulerState;
use dispatch_sim::{DispatchConfig, DispatchSignal, SignalKind, SimError, SimulationContext};

fn fast_config() -> DispatchConfig {
    DispatchConfig {
        min_delay_ms: 1,
        ..DispatchConfig::default()
    }
}

fn record(ctx: &SimulationContext) -> (Arc<Mutex<Vec<DispatchSignal>>>, dispatch_sim::observer::Subscription) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let sub = ctx
        .signals()
        .subscribe(move |s| sink.lock().unwrap().push(s.clone()));
    (log, sub)
}

#[test]
fn region_stops_after_exactly_three_failures() {
    // 100000x: a whole period lasts 216 real ms, so every sleep is short
    let world = common::world_at(SimTime::new(0, 6, 0), Weather::Clear, 100_000);
    let mut ctx =
        SimulationContext::seeded(fast_config(), world, common::standard_events(), 17).unwrap();
    let (log, _sub) = record(&ctx);
    let provider = Arc::new(NoVacancy::default());
    let region = ctx
        .add_region("Paleto Bay", [common::busy_zone("Paleto Forest", 1_000)], provider.clone())
        .unwrap();

    region.begin();
    region.join();

    assert_eq!(region.state(), SchedulerState::Stopped);
    assert_eq!(region.consecutive_failures(), 3);
    // three iterations, ten location attempts each
    assert_eq!(provider.requests.load(Ordering::SeqCst), 30);

    let stops: Vec<_> = log
        .lock()
        .unwrap()
        .iter()
        .filter_map(|s| match &s.kind {
            SignalKind::RegionStopped { region, reason } => Some((region.clone(), reason.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].0, "Paleto Bay");
    assert_eq!(
        stops[0].1,
        SimError::SchedulerFault {
            region: "Paleto Bay".to_string(),
            failures: 3
        }
        .to_string()
    );
    assert_eq!(ctx.registry().active_count(), 0);
}

#[test]
fn running_region_generates_calls_until_ended() {
    let world = common::world_at(SimTime::new(0, 6, 0), Weather::Clear, 100_000);
    let mut ctx =
        SimulationContext::seeded(fast_config(), world, common::standard_events(), 23).unwrap();
    let (log, _sub) = record(&ctx);
    ctx.add_region(
        "Los Santos",
        [
            common::busy_zone("Davis", 1_000),
            common::busy_zone("Strawberry", 1_000),
        ],
        Arc::new(StreetGrid::default()),
    )
    .unwrap();

    ctx.begin_all();
    let deadline = Instant::now() + Duration::from_secs(20);
    while ctx.registry().active_count() < 5 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    ctx.end_all();

    let region = ctx.region("Los Santos").unwrap();
    assert_eq!(region.state(), SchedulerState::Stopped);
    let created = ctx.registry().active_count();
    assert!(created >= 5, "only {created} calls in 20 s");

    for call in ctx.registry().calls_by_priority() {
        assert!(call.event.location_filter.accepts(&call.location));
    }

    // no calls once the loop has been joined
    thread::sleep(Duration::from_millis(50));
    assert_eq!(ctx.registry().active_count(), created);

    let log = log.lock().unwrap();
    assert!(matches!(log[0].kind, SignalKind::CrimeSummary { .. }));
    assert!(log.iter().any(|s| matches!(s.kind, SignalKind::RegionStarted { .. })));
    let stops: Vec<_> = log
        .iter()
        .filter_map(|s| match &s.kind {
            SignalKind::RegionStopped { reason, .. } => Some(reason.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stops, vec!["requested"]);
}

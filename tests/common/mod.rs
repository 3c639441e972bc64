#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dispatch_sim::model::*;
use dispatch_sim::region::{LocationProvider, Zone};
use dispatch_sim::{EventType, WorldState, WorldStateMultiplierTable};
use rand::RngCore;

pub fn world_at(time: SimTime, weather: Weather, time_scale: u32) -> Arc<WorldState> {
    Arc::new(WorldState::new(time, weather, time_scale).unwrap())
}

pub fn event_type(
    name: &str,
    category: CallCategory,
    priority: CallPriority,
    response: ResponseCode,
    kind: LocationType,
) -> EventType {
    EventType {
        name: name.to_string(),
        parent: name.to_string(),
        category,
        priority,
        response,
        location_filter: LocationFilter::single(kind),
        on_scene: DurationRange::from_minutes(10, 20).unwrap(),
        spawn_weight: WorldStateMultiplierTable::uniform(1, 1).unwrap(),
    }
}

/// A small catalog: one traffic, one violence and one property event.
pub fn standard_events() -> Vec<EventType> {
    vec![
        event_type(
            "Traffic Stop",
            CallCategory::Traffic,
            CallPriority::Routine,
            ResponseCode::Code2,
            LocationType::Street,
        ),
        event_type(
            "Shots Fired",
            CallCategory::Violence,
            CallPriority::Immediate,
            ResponseCode::Code3,
            LocationType::Street,
        ),
        event_type(
            "Burglary Report",
            CallCategory::Property,
            CallPriority::Expedited,
            ResponseCode::Code2,
            LocationType::Residence,
        ),
    ]
}

pub fn busy_zone(name: &str, expected: u32) -> Zone {
    Zone::new(name, [expected; 4])
        .with_category(CallCategory::Traffic, 50)
        .with_category(CallCategory::Violence, 20)
        .with_category(CallCategory::Property, 30)
}

/// Generates fresh locations of every kind in rotation, never repeating an id.
#[derive(Default)]
pub struct StreetGrid {
    next: AtomicUsize,
    pub requests: AtomicUsize,
}

impl LocationProvider for StreetGrid {
    fn find_location(&self, zone: &Zone, filter: &LocationFilter) -> Option<Location> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let kinds = filter.kinds();
        let kind = kinds[n % kinds.len()];
        Some(Location::new(
            n as u64 + 1,
            format!("{} #{}", zone.name(), n + 1),
            kind,
            [n as f32, 0.0, 0.0],
        ))
    }
}

/// Never finds anything.
#[derive(Default)]
pub struct NoVacancy {
    pub requests: AtomicUsize,
}

impl LocationProvider for NoVacancy {
    fn find_location(&self, _zone: &Zone, _filter: &LocationFilter) -> Option<Location> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        None
    }
}

/// Wraps an RNG and counts how often it is consulted.
pub struct CountingRng<R> {
    pub inner: R,
    pub calls: usize,
}

impl<R> CountingRng<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, calls: 0 }
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.calls += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.calls += 1;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.calls += 1;
        self.inner.fill_bytes(dst)
    }
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Two closed calls: one worked by two units, one cancelled before anyone arrived.
pub fn completed_calls() -> Vec<CompletedCall> {
    use dispatch_sim::{CallRegistry, IdGenerator, SignalBus};

    let registry = CallRegistry::new(IdGenerator::starting_from(40), Arc::new(SignalBus::new()));
    let events = standard_events();
    let start = SimTime::new(2, 21, 30);

    let shots = registry.create_call(
        Arc::new(events[1].clone()),
        Location::new(7, "Grove Street\tcul-de-sac", LocationType::Street, [1.0, 2.0, 3.0]),
        start,
    );
    registry.mark_dispatched(shots, "1-ADAM-12", start.plus_seconds(30)).unwrap();
    registry.mark_dispatched(shots, "1-LINCOLN-3", start.plus_seconds(45)).unwrap();
    registry.mark_on_scene("1-ADAM-12", shots, start.plus_seconds(300)).unwrap();
    registry
        .mark_complete(shots, CallOutcome::Completed, start.plus_seconds(1_500))
        .unwrap();

    let burglary = registry.create_call(
        Arc::new(events[2].clone()),
        Location::new(8, "Mirror Park", LocationType::Residence, [0.0; 3]),
        start.plus_seconds(60),
    );
    registry
        .mark_complete(burglary, CallOutcome::Cancelled, start.plus_seconds(120))
        .unwrap();

    registry.drain_completed()
}

//! Per-region event generation.
//!
//! Each running region owns one OS thread. An iteration picks a zone, a call
//! category and an event type, looks for a free location and registers the
//! call; the thread then sleeps for a delay drawn from the region's current
//! pacing. Failed iterations are counted, and a region that fails
//! `max_consecutive_failures` times in a row stops itself.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;

use super::stats::{CrimeLevel, DelayRange, Pacing, RegionCrimeStatistics, derive_delay};
use super::zone::Zone;
use crate::catalog::EventCatalog;
use crate::config::DispatchConfig;
use crate::dispatch::CallRegistry;
use crate::error::{Result, SimError};
use crate::model::{CallId, Location, LocationFilter, TimePeriod};
use crate::observer::Subscription;
use crate::sampling::WeightedSampler;
use crate::signal::SignalKind;
use crate::sync::lock;
use crate::world::{WorldState, WorldStateEvent};

/// Source of concrete places for new calls, supplied by the host.
pub trait LocationProvider: Send + Sync {
    /// Propose a location in `zone` matching `filter`, or `None` if the zone has
    /// nothing suitable right now. Proposals are re-checked by the scheduler.
    fn find_location(&self, zone: &Zone, filter: &LocationFilter) -> Option<Location>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Shared collaborators every region scheduler needs.
#[derive(Clone)]
pub struct RegionServices {
    pub world: Arc<WorldState>,
    pub catalog: Arc<EventCatalog>,
    pub registry: Arc<CallRegistry>,
    pub config: DispatchConfig,
}

struct PacingState {
    statistics: RegionCrimeStatistics,
    level: CrimeLevel,
    delay: DelayRange,
}

struct Shared {
    name: String,
    services: RegionServices,
    locations: Arc<dyn LocationProvider>,
    zones: Mutex<WeightedSampler<Arc<Zone>>>,
    levels: WeightedSampler<CrimeLevel>,
    pacing: Mutex<PacingState>,
    state: Mutex<SchedulerState>,
    wake: Condvar,
    failures: AtomicU32,
    rng: Mutex<StdRng>,
    subscription: Mutex<Option<Subscription>>,
}

pub struct RegionEventScheduler {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RegionEventScheduler {
    /// Build a stopped region. A region needs at least one zone.
    pub fn new(
        name: impl Into<String>,
        zones: impl IntoIterator<Item = Zone>,
        locations: Arc<dyn LocationProvider>,
        services: RegionServices,
        rng: StdRng,
    ) -> Result<Self> {
        let name = name.into();
        let period = services.world.current_period();
        let mut sampler = WeightedSampler::new();
        for zone in zones {
            let weight = zone.expected_calls(period);
            sampler.add(Arc::new(zone), weight);
        }
        if sampler.is_empty() {
            return Err(SimError::InvalidConfiguration(format!(
                "region {name} has no zones"
            )));
        }
        let statistics = RegionCrimeStatistics::compute(
            sampler.items().iter().map(|item| &item.value),
            services.world.time_scale(),
        );
        let level = CrimeLevel::Moderate;
        let delay = derive_delay(Pacing {
            statistics: &statistics,
            level,
            now: services.world.current_time(),
            time_scale: services.world.time_scale(),
            min_delay_ms: services.config.min_delay_ms,
        });
        Ok(Self {
            shared: Arc::new(Shared {
                name,
                services,
                locations,
                zones: Mutex::new(sampler),
                levels: CrimeLevel::sampler(),
                pacing: Mutex::new(PacingState {
                    statistics,
                    level,
                    delay,
                }),
                state: Mutex::new(SchedulerState::Stopped),
                wake: Condvar::new(),
                failures: AtomicU32::new(0),
                rng: Mutex::new(rng),
                subscription: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> SchedulerState {
        *lock(&self.shared.state)
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub fn crime_level(&self) -> CrimeLevel {
        lock(&self.shared.pacing).level
    }

    pub fn delay_range(&self) -> DelayRange {
        lock(&self.shared.pacing).delay
    }

    pub fn statistics(&self) -> RegionCrimeStatistics {
        lock(&self.shared.pacing).statistics
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.failures.load(Ordering::SeqCst)
    }

    pub fn zone_count(&self) -> usize {
        lock(&self.shared.zones).len()
    }

    pub fn add_zone(&self, zone: Zone) {
        let period = self.shared.services.world.current_period();
        let weight = zone.expected_calls(period);
        lock(&self.shared.zones).add(Arc::new(zone), weight);
        self.shared.refresh_pacing(false);
    }

    /// Remove every zone named `name`. Returns whether anything was removed.
    pub fn remove_zone(&self, name: &str) -> bool {
        let removed = {
            let mut zones = lock(&self.shared.zones);
            let before = zones.len();
            zones.retain(|zone| zone.name() != name);
            zones.len() != before
        };
        if removed {
            self.shared.refresh_pacing(false);
        }
        removed
    }

    /// Start generating events. Does nothing if the region is already running.
    pub fn begin(&self) {
        let shared = &self.shared;
        // Holding the worker slot serializes concurrent callers.
        let mut worker = lock(&self.worker);
        if shared.is_running() {
            return;
        }
        // A previous loop may still be finishing its last iteration.
        if let Some(previous) = worker.take() {
            if previous.join().is_err() {
                tracing::error!("region {} loop thread panicked", shared.name);
            }
        }
        *lock(&shared.state) = SchedulerState::Running;

        shared.failures.store(0, Ordering::SeqCst);
        let weak: Weak<Shared> = Arc::downgrade(shared);
        let subscription = shared.services.world.subscribe(move |event| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match event {
                WorldStateEvent::TimePeriodChanged { new, .. } => shared.on_period_changed(*new),
                WorldStateEvent::TimeScaleChanged { .. } => shared.refresh_pacing(false),
                WorldStateEvent::WeatherChanged { .. } => {}
            }
        });
        *lock(&shared.subscription) = Some(subscription);
        shared.on_period_changed(shared.services.world.current_period());

        tracing::info!("region {} started", shared.name);
        shared.services.registry.signals().emit(
            shared.services.world.current_time(),
            SignalKind::RegionStarted {
                region: shared.name.clone(),
            },
        );

        let looping = Arc::clone(shared);
        let spawned = thread::Builder::new()
            .name(format!("region-{}", shared.name))
            .spawn(move || looping.run_loop());
        match spawned {
            Ok(handle) => *worker = Some(handle),
            Err(err) => {
                drop(worker);
                tracing::error!("region {} could not start its thread: {err}", shared.name);
                shared.stop(&format!("thread spawn failed: {err}"));
            }
        }
    }

    /// Stop generating events. Safe from any thread; a sleeping loop wakes up
    /// immediately, an iteration in flight finishes first.
    pub fn end(&self) {
        self.shared.stop("requested");
    }

    /// Wait for the loop thread to exit. Returns immediately if none is running.
    pub fn join(&self) {
        let Some(handle) = lock(&self.worker).take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::error!("region {} loop thread panicked", self.shared.name);
        }
    }

    /// Run one iteration on the calling thread.
    ///
    /// Returns the id of the created call, or `None` when the region expects no
    /// calls in the current period. Errors are counted toward the failure ceiling;
    /// reaching it stops the region and returns `SchedulerFault`.
    pub fn run_iteration(&self) -> Result<Option<CallId>> {
        self.shared.run_iteration()
    }
}

impl Drop for RegionEventScheduler {
    fn drop(&mut self) {
        self.end();
        self.join();
    }
}

impl fmt::Debug for RegionEventScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionEventScheduler")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("crime_level", &self.crime_level())
            .field("delay", &self.delay_range())
            .finish()
    }
}

impl Shared {
    fn is_running(&self) -> bool {
        *lock(&self.state) == SchedulerState::Running
    }

    fn run_loop(self: Arc<Self>) {
        tracing::debug!("region {} loop entered", self.name);
        while self.is_running() {
            // Failures are logged and counted inside; the ceiling flips the state.
            let _ = self.run_iteration();

            let delay = {
                let range = lock(&self.pacing).delay;
                range.draw(&mut *lock(&self.rng))
            };
            let guard = lock(&self.state);
            drop(
                self.wake
                    .wait_timeout_while(guard, Duration::from_millis(delay), |state| {
                        *state == SchedulerState::Running
                    })
                    .unwrap_or_else(PoisonError::into_inner),
            );
        }
        tracing::debug!("region {} loop exited", self.name);
    }

    fn run_iteration(&self) -> Result<Option<CallId>> {
        let period = self.services.world.current_period();
        if lock(&self.pacing).statistics.expected_calls(period) == 0 {
            tracing::debug!("region {} expects no calls during {period}", self.name);
            return Ok(None);
        }

        match self.generate() {
            Ok(id) => {
                self.failures.store(0, Ordering::SeqCst);
                Ok(Some(id))
            }
            Err(err) => {
                let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                let ceiling = self.services.config.max_consecutive_failures;
                tracing::warn!(
                    "region {} iteration failed ({failures}/{ceiling}): {err}",
                    self.name
                );
                if failures < ceiling {
                    return Err(err);
                }
                let fault = SimError::SchedulerFault {
                    region: self.name.clone(),
                    failures,
                };
                tracing::error!("{fault}");
                self.stop(&fault.to_string());
                Err(fault)
            }
        }
    }

    fn generate(&self) -> Result<CallId> {
        let mut rng = lock(&self.rng);
        let zone = Arc::clone(lock(&self.zones).draw(&mut *rng)?);
        let category = zone.draw_category(&mut *rng)?;
        let event = self
            .services
            .catalog
            .draw(category, &mut *rng)
            .map_err(|err| {
                if err.is_sampling_failure() {
                    SimError::NoEligibleEvent {
                        zone: zone.name().to_string(),
                    }
                } else {
                    err
                }
            })?;
        drop(rng);

        let location = self.find_location(&zone, &event.location_filter)?;
        let now = self.services.world.current_time();
        tracing::debug!(
            "region {} spawning {} at {} in {}",
            self.name,
            event.name,
            location.name,
            zone.name()
        );
        Ok(self.services.registry.create_call(event, location, now))
    }

    fn find_location(&self, zone: &Zone, filter: &LocationFilter) -> Result<Location> {
        let attempts = self.services.config.max_location_attempts;
        for _ in 0..attempts {
            let Some(location) = self.locations.find_location(zone, filter) else {
                continue;
            };
            if filter.accepts(&location)
                && !self.services.registry.is_location_occupied(location.id)
            {
                return Ok(location);
            }
        }
        tracing::warn!(
            "region {}: no free location in {} after {attempts} attempts",
            self.name,
            zone.name()
        );
        Err(SimError::LocationSearchExhausted {
            zone: zone.name().to_string(),
            attempts,
        })
    }

    /// New period: fresh crime level, zone weights for the period, new pacing.
    fn on_period_changed(&self, period: TimePeriod) {
        lock(&self.zones).reweight(|zone| zone.expected_calls(period));
        self.refresh_pacing(true);
    }

    fn refresh_pacing(&self, redraw_level: bool) {
        let world = self.services.world.snapshot();
        let statistics = RegionCrimeStatistics::compute(
            lock(&self.zones).items().iter().map(|item| &item.value),
            world.time_scale,
        );
        let drawn = if redraw_level {
            let mut rng = lock(&self.rng);
            self.levels.draw(&mut *rng).ok().copied()
        } else {
            None
        };

        let (level, delay) = {
            let mut pacing = lock(&self.pacing);
            if let Some(level) = drawn {
                pacing.level = level;
            }
            pacing.statistics = statistics;
            pacing.delay = derive_delay(Pacing {
                statistics: &statistics,
                level: pacing.level,
                now: world.time,
                time_scale: world.time_scale,
                min_delay_ms: self.services.config.min_delay_ms,
            });
            (pacing.level, pacing.delay)
        };

        let period = world.period();
        let expected = statistics.expected_calls(period);
        if redraw_level {
            tracing::info!(
                "region {} {period}: crime level {level}, {expected} calls expected, delay {}..={} ms",
                self.name,
                delay.min_ms,
                delay.max_ms
            );
            self.services.registry.signals().emit(
                world.time,
                SignalKind::CrimeSummary {
                    region: self.name.clone(),
                    period,
                    level,
                    expected_calls: f64::from(expected),
                    min_delay_ms: delay.min_ms,
                    max_delay_ms: delay.max_ms,
                },
            );
        } else {
            tracing::debug!(
                "region {} pacing refreshed: delay {}..={} ms",
                self.name,
                delay.min_ms,
                delay.max_ms
            );
        }
    }

    /// Running → Stopped. Emits `RegionStopped` only on an actual transition.
    fn stop(&self, reason: &str) {
        drop(lock(&self.subscription).take());
        let was_running = {
            let mut state = lock(&self.state);
            std::mem::replace(&mut *state, SchedulerState::Stopped) == SchedulerState::Running
        };
        self.wake.notify_all();
        if was_running {
            tracing::info!("region {} stopped: {reason}", self.name);
            self.services.registry.signals().emit(
                self.services.world.current_time(),
                SignalKind::RegionStopped {
                    region: self.name.clone(),
                    reason: reason.to_string(),
                },
            );
        }
    }
}

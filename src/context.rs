//! Everything one simulation session owns.

use std::sync::Arc;

use bevy_app::App;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{EventCatalog, EventType};
use crate::config::DispatchConfig;
use crate::dispatch::CallRegistry;
use crate::ecs::{DispatchServices, build_dispatch_app};
use crate::error::{Result, SimError};
use crate::id::IdGenerator;
use crate::region::{LocationProvider, RegionEventScheduler, RegionServices, Zone};
use crate::signal::SignalBus;
use crate::world::WorldState;

/// Owns the world-state hub, the event catalog, the call registry, the signal
/// bus, the master RNG and every region scheduler of a session.
///
/// Regions and the tick driver receive their own generators forked from the
/// master, so a seeded context replays the same draws per consumer.
pub struct SimulationContext {
    config: DispatchConfig,
    world: Arc<WorldState>,
    catalog: Arc<EventCatalog>,
    registry: Arc<CallRegistry>,
    signals: Arc<SignalBus>,
    rng: StdRng,
    regions: Vec<RegionEventScheduler>,
}

impl SimulationContext {
    /// A context seeded from the operating system.
    pub fn new(
        config: DispatchConfig,
        world: Arc<WorldState>,
        events: impl IntoIterator<Item = EventType>,
    ) -> Result<Self> {
        Self::with_rng(config, world, events, StdRng::from_os_rng())
    }

    /// A reproducible context.
    pub fn seeded(
        config: DispatchConfig,
        world: Arc<WorldState>,
        events: impl IntoIterator<Item = EventType>,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(config, world, events, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: DispatchConfig,
        world: Arc<WorldState>,
        events: impl IntoIterator<Item = EventType>,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(EventCatalog::new(world.clone(), events)?);
        let signals = Arc::new(SignalBus::new());
        let registry = Arc::new(CallRegistry::new(
            IdGenerator::random_start(&mut rng),
            signals.clone(),
        ));
        Ok(Self {
            config,
            world,
            catalog,
            registry,
            signals,
            rng,
            regions: Vec::new(),
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn world(&self) -> &Arc<WorldState> {
        &self.world
    }

    pub fn catalog(&self) -> &Arc<EventCatalog> {
        &self.catalog
    }

    pub fn registry(&self) -> &Arc<CallRegistry> {
        &self.registry
    }

    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    /// The master generator, for one-off draws on the caller's thread.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// A child generator seeded from the master.
    pub fn fork_rng(&mut self) -> StdRng {
        StdRng::from_rng(&mut self.rng)
    }

    pub fn region_services(&self) -> RegionServices {
        RegionServices {
            world: self.world.clone(),
            catalog: self.catalog.clone(),
            registry: self.registry.clone(),
            config: self.config.clone(),
        }
    }

    /// Register a new, stopped region. Names must be unique and the region needs
    /// at least one zone.
    pub fn add_region(
        &mut self,
        name: impl Into<String>,
        zones: impl IntoIterator<Item = Zone>,
        locations: Arc<dyn LocationProvider>,
    ) -> Result<&RegionEventScheduler> {
        let name = name.into();
        if self.region(&name).is_some() {
            return Err(SimError::InvalidConfiguration(format!(
                "region {name} is already registered"
            )));
        }
        let rng = self.fork_rng();
        let scheduler =
            RegionEventScheduler::new(name, zones, locations, self.region_services(), rng)?;
        tracing::info!(
            "region {} registered with {} zones",
            scheduler.name(),
            scheduler.zone_count()
        );
        self.regions.push(scheduler);
        let index = self.regions.len() - 1;
        Ok(&self.regions[index])
    }

    pub fn region(&self, name: &str) -> Option<&RegionEventScheduler> {
        self.regions.iter().find(|region| region.name() == name)
    }

    pub fn regions(&self) -> &[RegionEventScheduler] {
        &self.regions
    }

    pub fn begin_all(&self) {
        for region in &self.regions {
            region.begin();
        }
    }

    /// Stop every region and wait for their threads.
    pub fn end_all(&self) {
        for region in &self.regions {
            region.end();
        }
        for region in &self.regions {
            region.join();
        }
    }

    /// A tick driver wired to this context's registry and world state.
    pub fn build_tick_app(&mut self) -> App {
        let services = DispatchServices {
            registry: self.registry.clone(),
            world: self.world.clone(),
            config: self.config.clone(),
        };
        let rng = self.fork_rng();
        build_dispatch_app(services, rng)
    }
}

impl Drop for SimulationContext {
    fn drop(&mut self) {
        self.end_all();
    }
}

pub mod catalog;
pub mod config;
pub mod context;
pub mod db;
pub mod dispatch;
pub mod ecs;
pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod observer;
pub mod region;
pub mod sampling;
pub mod signal;
mod sync;
pub mod world;

pub use catalog::{EventCatalog, EventType};
pub use config::DispatchConfig;
pub use context::SimulationContext;
pub use dispatch::{CallRegistry, SimulatedUnit, UnitStatus};
pub use error::{Result, SimError};
pub use id::IdGenerator;
pub use region::{CrimeLevel, LocationProvider, RegionEventScheduler, Zone};
pub use sampling::{WeightedSampler, WorldStateMultiplierTable, WorldStateWeightedSampler};
pub use signal::{DispatchSignal, SignalBus, SignalKind};
pub use world::{WorldState, WorldStateEvent};

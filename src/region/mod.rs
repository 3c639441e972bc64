//! Event generation for groups of zones.

pub mod scheduler;
pub mod stats;
pub mod zone;

pub use scheduler::{LocationProvider, RegionEventScheduler, RegionServices, SchedulerState};
pub use stats::{CrimeLevel, DelayRange, Pacing, RegionCrimeStatistics, derive_delay};
pub use zone::Zone;

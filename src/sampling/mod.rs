pub mod multiplier;
pub mod weighted;
pub mod world_sampler;

pub use multiplier::WorldStateMultiplierTable;
pub use weighted::{WeightedItem, WeightedSampler};
pub use world_sampler::{WorldStateItem, WorldStateWeightedSampler};

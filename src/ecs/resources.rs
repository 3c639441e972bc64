use std::sync::Arc;

use bevy_ecs::resource::Resource;
use rand::rngs::StdRng;

use crate::config::DispatchConfig;
use crate::dispatch::CallRegistry;
use crate::world::WorldState;

/// Handles to the shared dispatch core. The same registry and world state the
/// region schedulers write to.
#[derive(Resource, Clone)]
pub struct DispatchServices {
    pub registry: Arc<CallRegistry>,
    pub world: Arc<WorldState>,
    pub config: DispatchConfig,
}

/// RNG used by unit systems. Forked from the simulation context's master RNG.
#[derive(Resource)]
pub struct TickRng(pub StdRng);

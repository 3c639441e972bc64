use bevy_ecs::entity::Entity;
use bevy_ecs::world::World;

use super::components::Unit;
use crate::dispatch::SimulatedUnit;

pub fn spawn_unit(world: &mut World, unit: SimulatedUnit) -> Entity {
    tracing::debug!("spawning unit {}", unit.call_sign());
    world.spawn(Unit(unit)).id()
}

use bevy_ecs::component::Component;

use crate::dispatch::SimulatedUnit;

/// A responding unit living in the ECS world.
#[derive(Component, Debug)]
pub struct Unit(pub SimulatedUnit);

use bevy_ecs::entity::Entity;
use bevy_ecs::message::Message;

use crate::dispatch::StatusTransition;

/// Emitted by the unit systems whenever a unit entity changes status.
#[derive(Message, Clone, Debug)]
pub struct UnitStatusChanged {
    pub entity: Entity,
    pub transition: StatusTransition,
}

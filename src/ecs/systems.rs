//! Unit systems.
//!
//! 1. `assign_pending_calls` (Assign): match queued calls to free units
//! 2. `advance_units` (Advance): move every unit along its timers

use bevy_ecs::entity::Entity;
use bevy_ecs::message::MessageWriter;
use bevy_ecs::system::{Query, Res, ResMut};

use super::clock::SimClock;
use super::components::Unit;
use super::events::UnitStatusChanged;
use super::resources::{DispatchServices, TickRng};
use crate::dispatch::UnitContext;
use crate::model::ResponseCode;

/// Hand the most urgent queued calls to available AI units.
///
/// Code 3 calls go first, then by priority and age. Units are taken in call-sign
/// order so a seeded run assigns the same units every time.
pub fn assign_pending_calls(
    clock: Res<SimClock>,
    services: Res<DispatchServices>,
    mut rng: ResMut<TickRng>,
    mut units: Query<(Entity, &mut Unit)>,
    mut changed: MessageWriter<UnitStatusChanged>,
) {
    let mut pending = services.registry.pending_calls();
    if pending.is_empty() {
        return;
    }
    pending.sort_by_key(|call| {
        (
            call.response() != ResponseCode::Code3,
            call.priority(),
            call.created_at,
            call.id,
        )
    });

    let mut idle: Vec<_> = units
        .iter_mut()
        .filter(|(_, unit)| unit.0.is_available() && unit.0.is_timer_driven())
        .collect();
    idle.sort_by(|(_, a), (_, b)| a.0.call_sign().cmp(b.0.call_sign()));

    let mut ctx = UnitContext {
        registry: &services.registry,
        config: &services.config,
        rng: &mut rng.0,
    };
    for (call, (entity, mut unit)) in pending.iter().zip(idle) {
        match unit.0.assign(call, clock.time, &mut ctx) {
            Ok(transition) => {
                changed.write(UnitStatusChanged { entity, transition });
            }
            Err(err) => {
                tracing::warn!("could not assign {} to call {}: {err}", unit.0.call_sign(), call.id);
            }
        }
    }
}

pub fn advance_units(
    clock: Res<SimClock>,
    services: Res<DispatchServices>,
    mut rng: ResMut<TickRng>,
    mut units: Query<(Entity, &mut Unit)>,
    mut changed: MessageWriter<UnitStatusChanged>,
) {
    let mut ctx = UnitContext {
        registry: &services.registry,
        config: &services.config,
        rng: &mut rng.0,
    };
    for (entity, mut unit) in &mut units {
        let due = unit
            .0
            .next_status_change()
            .is_some_and(|next| next <= clock.time);
        if !due {
            continue;
        }
        for transition in unit.0.advance(clock.time, &mut ctx) {
            changed.write(UnitStatusChanged { entity, transition });
        }
    }
}

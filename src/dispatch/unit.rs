//! Lifecycle of a simulated responding unit.
//!
//! ```text
//! Available ─assign─▶ Dispatched ─travel elapsed─▶ OnScene ─Completed─▶ MealBreak ─30 min─▶ Available
//!                         │                          │
//!                         └──────── cancel / divert ─┴─────────────────────────────────────▶ Available
//! ```
//!
//! The machine is tick-driven: nothing happens until [`SimulatedUnit::advance`]
//! is called with the current simulated time, and it never sleeps.

use std::fmt;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::registry::CallRegistry;
use crate::config::DispatchConfig;
use crate::error::{Result, SimError};
use crate::model::{Call, CallId, CallOutcome, DurationRange, ResponseCode, SimTime};
use crate::signal::SignalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    Available,
    Dispatched,
    OnScene,
    MealBreak,
    OutOfService,
    ReturningToStation,
}

impl UnitStatus {
    /// States that end on a timer. `next_status_change` is meaningless otherwise.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::Dispatched | Self::OnScene | Self::MealBreak)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub call_sign: String,
    pub from: UnitStatus,
    pub to: UnitStatus,
    pub at: SimTime,
    pub call_id: Option<CallId>,
}

/// What a unit remembers about the call it is working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub call_id: CallId,
    pub response: ResponseCode,
    pub on_scene: DurationRange,
}

impl Assignment {
    pub fn from_call(call: &Call) -> Self {
        Self {
            call_id: call.id,
            response: call.response(),
            on_scene: call.event.on_scene,
        }
    }
}

/// How a unit exists outside the state machine.
///
/// The state machine itself never knows whether an actor is rendered; that
/// knowledge lives in the strategy object.
pub trait UnitPresence: Send + Sync {
    /// True when the unit's timers move it along. False when an outside actor
    /// (the player) reports arrival and completion.
    fn is_timer_driven(&self) -> bool;

    /// Called after every status change.
    fn drive_presence(&mut self, transition: &StatusTransition);

    /// Whether a concrete actor currently exists in the rendered world.
    fn render_presence(&self) -> bool;
}

/// An AI unit that lives only in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualPresence;

impl UnitPresence for VirtualPresence {
    fn is_timer_driven(&self) -> bool {
        true
    }

    fn drive_presence(&mut self, _transition: &StatusTransition) {}

    fn render_presence(&self) -> bool {
        false
    }
}

/// The player's own unit. Status changes come from the player, not from timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerPresence;

impl UnitPresence for PlayerPresence {
    fn is_timer_driven(&self) -> bool {
        false
    }

    fn drive_presence(&mut self, _transition: &StatusTransition) {}

    fn render_presence(&self) -> bool {
        true
    }
}

/// Collaborators a unit needs while changing state.
pub struct UnitContext<'a> {
    pub registry: &'a CallRegistry,
    pub config: &'a DispatchConfig,
    pub rng: &'a mut dyn RngCore,
}

pub struct SimulatedUnit {
    call_sign: String,
    status: UnitStatus,
    assignment: Option<Assignment>,
    last_status_change: SimTime,
    next_status_change: Option<SimTime>,
    presence: Box<dyn UnitPresence>,
}

impl SimulatedUnit {
    pub fn new(call_sign: impl Into<String>, now: SimTime) -> Self {
        Self::with_presence(call_sign, now, Box::new(VirtualPresence))
    }

    pub fn with_presence(
        call_sign: impl Into<String>,
        now: SimTime,
        presence: Box<dyn UnitPresence>,
    ) -> Self {
        Self {
            call_sign: call_sign.into(),
            status: UnitStatus::Available,
            assignment: None,
            last_status_change: now,
            next_status_change: None,
            presence,
        }
    }

    pub fn call_sign(&self) -> &str {
        &self.call_sign
    }

    pub fn status(&self) -> UnitStatus {
        self.status
    }

    pub fn current_call(&self) -> Option<CallId> {
        self.assignment.map(|a| a.call_id)
    }

    pub fn assignment(&self) -> Option<&Assignment> {
        self.assignment.as_ref()
    }

    pub fn last_status_change(&self) -> SimTime {
        self.last_status_change
    }

    /// Only `Some` while in a transient state.
    pub fn next_status_change(&self) -> Option<SimTime> {
        self.next_status_change
    }

    pub fn is_available(&self) -> bool {
        self.status == UnitStatus::Available
    }

    pub fn is_timer_driven(&self) -> bool {
        self.presence.is_timer_driven()
    }

    pub fn is_rendered(&self) -> bool {
        self.presence.render_presence()
    }

    /// Send this unit to `call`. Travel time depends on the call's response code.
    pub fn assign(
        &mut self,
        call: &Call,
        now: SimTime,
        ctx: &mut UnitContext<'_>,
    ) -> Result<StatusTransition> {
        self.require(UnitStatus::Available, UnitStatus::Dispatched)?;
        ctx.registry.mark_dispatched(call.id, &self.call_sign, now)?;
        let assignment = Assignment::from_call(call);
        let travel = ctx.config.travel_range(assignment.response).draw(ctx.rng);
        self.assignment = Some(assignment);
        let transition = self.transition(
            UnitStatus::Dispatched,
            now,
            Some(now.plus_seconds(travel)),
            Some(call.id),
        );
        publish(ctx, &transition);
        Ok(transition)
    }

    /// Assign as if the unit had already been responding for a while, e.g. when
    /// the simulation starts up or fast-forwards. Most of the time the unit is
    /// already on scene, partway through its on-scene time; otherwise it is still
    /// travelling with part of the trip behind it.
    pub fn assign_with_random_completion(
        &mut self,
        call: &Call,
        now: SimTime,
        ctx: &mut UnitContext<'_>,
    ) -> Result<StatusTransition> {
        self.require(UnitStatus::Available, UnitStatus::Dispatched)?;
        ctx.registry.mark_dispatched(call.id, &self.call_sign, now)?;
        let assignment = Assignment::from_call(call);

        let transition = if ctx.rng.random_bool(ctx.config.on_scene_probability) {
            ctx.registry.mark_on_scene(&self.call_sign, call.id, now)?;
            let duration = assignment.on_scene.draw(ctx.rng);
            let elapsed = ctx.rng.random_range(0..duration);
            let started = now.minus_seconds(elapsed);
            self.assignment = Some(assignment);
            self.transition(
                UnitStatus::OnScene,
                started,
                Some(started.plus_seconds(duration)),
                Some(call.id),
            )
        } else {
            let travel = ctx.config.travel_range(assignment.response).draw(ctx.rng);
            let remaining = ctx.rng.random_range(1..=travel);
            let started = now.minus_seconds(travel - remaining);
            self.assignment = Some(assignment);
            self.transition(
                UnitStatus::Dispatched,
                started,
                Some(now.plus_seconds(remaining)),
                Some(call.id),
            )
        };
        publish(ctx, &transition);
        Ok(transition)
    }

    /// Move the unit forward to `now`.
    ///
    /// Every threshold that has passed is processed in order at its own
    /// threshold time, so a large jump still walks through OnScene.
    pub fn advance(&mut self, now: SimTime, ctx: &mut UnitContext<'_>) -> Vec<StatusTransition> {
        let mut transitions = Vec::new();
        if !self.presence.is_timer_driven() {
            return transitions;
        }
        while let Some(due) = self.next_status_change {
            if due > now {
                break;
            }
            let step = match self.status {
                UnitStatus::Dispatched => self.arrive(due, ctx).map(|t| vec![t]),
                UnitStatus::OnScene => self.complete(CallOutcome::Completed, due, ctx),
                UnitStatus::MealBreak => {
                    let t = self.transition(UnitStatus::Available, due, None, None);
                    publish(ctx, &t);
                    Ok(vec![t])
                }
                _ => {
                    self.next_status_change = None;
                    Ok(Vec::new())
                }
            };
            match step {
                Ok(mut done) => transitions.append(&mut done),
                Err(err) => {
                    tracing::warn!("unit {} lost its call: {err}", self.call_sign);
                    self.assignment = None;
                    let t = self.transition(UnitStatus::Available, due, None, None);
                    publish(ctx, &t);
                    transitions.push(t);
                }
            }
        }
        transitions
    }

    /// Dispatched → OnScene. Draws the on-scene duration from the call's event type.
    pub fn arrive(&mut self, now: SimTime, ctx: &mut UnitContext<'_>) -> Result<StatusTransition> {
        self.require(UnitStatus::Dispatched, UnitStatus::OnScene)?;
        let assignment = self.assignment.ok_or_else(|| self.invalid(UnitStatus::OnScene))?;
        ctx.registry
            .mark_on_scene(&self.call_sign, assignment.call_id, now)?;
        let duration = assignment.on_scene.draw(ctx.rng);
        let transition = self.transition(
            UnitStatus::OnScene,
            now,
            Some(now.plus_seconds(duration)),
            Some(assignment.call_id),
        );
        publish(ctx, &transition);
        Ok(transition)
    }

    /// Finish or abandon the current call.
    ///
    /// `Completed` needs the unit on scene and earns a meal break. `Cancelled`
    /// closes the call; `Diverted` only detaches this unit. Both return the unit
    /// straight to Available.
    pub fn complete(
        &mut self,
        outcome: CallOutcome,
        now: SimTime,
        ctx: &mut UnitContext<'_>,
    ) -> Result<Vec<StatusTransition>> {
        let assignment = self
            .assignment
            .ok_or_else(|| self.invalid(UnitStatus::Available))?;
        let call_id = assignment.call_id;

        let registered = match outcome {
            CallOutcome::Completed => {
                self.require(UnitStatus::OnScene, UnitStatus::MealBreak)?;
                ctx.registry.mark_complete(call_id, outcome, now).map(|_| ())
            }
            CallOutcome::Cancelled => ctx.registry.mark_complete(call_id, outcome, now).map(|_| ()),
            CallOutcome::Diverted => ctx.registry.release_unit(call_id, &self.call_sign),
        };
        match registered {
            Ok(()) => {}
            // Another unit on the same call already closed it.
            Err(SimError::UnknownCall(_)) => {
                tracing::debug!("call {call_id} already closed before {} finished", self.call_sign);
            }
            Err(err) => return Err(err),
        }

        self.assignment = None;
        let transition = if outcome == CallOutcome::Completed {
            let rest = ctx.config.meal_break_secs;
            self.transition(
                UnitStatus::MealBreak,
                now,
                Some(now.plus_seconds(rest)),
                Some(call_id),
            )
        } else {
            self.transition(UnitStatus::Available, now, None, Some(call_id))
        };
        publish(ctx, &transition);
        Ok(vec![transition])
    }

    pub fn set_out_of_service(&mut self, now: SimTime) -> Result<StatusTransition> {
        self.require_idle(UnitStatus::OutOfService)?;
        Ok(self.transition(UnitStatus::OutOfService, now, None, None))
    }

    pub fn return_to_station(&mut self, now: SimTime) -> Result<StatusTransition> {
        self.require_idle(UnitStatus::ReturningToStation)?;
        Ok(self.transition(UnitStatus::ReturningToStation, now, None, None))
    }

    pub fn return_to_service(&mut self, now: SimTime) -> Result<StatusTransition> {
        match self.status {
            UnitStatus::OutOfService | UnitStatus::ReturningToStation => {
                Ok(self.transition(UnitStatus::Available, now, None, None))
            }
            _ => Err(self.invalid(UnitStatus::Available)),
        }
    }

    fn require(&self, expected: UnitStatus, to: UnitStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid(to))
        }
    }

    fn require_idle(&self, to: UnitStatus) -> Result<()> {
        if self.assignment.is_some() || self.status.is_transient() {
            return Err(self.invalid(to));
        }
        Ok(())
    }

    fn invalid(&self, to: UnitStatus) -> SimError {
        SimError::InvalidTransition {
            subject: format!("unit {}", self.call_sign),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    fn transition(
        &mut self,
        to: UnitStatus,
        at: SimTime,
        next: Option<SimTime>,
        call_id: Option<CallId>,
    ) -> StatusTransition {
        let transition = StatusTransition {
            call_sign: self.call_sign.clone(),
            from: self.status,
            to,
            at,
            call_id,
        };
        self.status = to;
        self.last_status_change = at;
        self.next_status_change = next.filter(|_| to.is_transient());
        tracing::debug!(
            "unit {} {} -> {} at {at}",
            self.call_sign,
            transition.from,
            transition.to
        );
        self.presence.drive_presence(&transition);
        transition
    }
}

fn publish(ctx: &UnitContext<'_>, transition: &StatusTransition) {
    ctx.registry.signals().emit(
        transition.at,
        SignalKind::UnitStatusChanged {
            call_sign: transition.call_sign.clone(),
            from: transition.from,
            to: transition.to,
            call_id: transition.call_id,
        },
    );
}

impl fmt::Debug for SimulatedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedUnit")
            .field("call_sign", &self.call_sign)
            .field("status", &self.status)
            .field("assignment", &self.assignment)
            .field("last_status_change", &self.last_status_change)
            .field("next_status_change", &self.next_status_change)
            .finish()
    }
}

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::location::Location;
use super::time::SimTime;
use crate::catalog::EventType;
use crate::error::{Result, SimError};

pub type CallId = u64;

/// Dispatch priority. Ordered most urgent first, so sorting ascending puts
/// `Immediate` calls at the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CallPriority {
    Immediate,
    Emergency,
    Expedited,
    Routine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    /// Routine response at normal road speed.
    Code2,
    /// Lights and sirens.
    Code3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CallCategory {
    Traffic,
    Violence,
    Property,
    Disturbance,
    Assistance,
    Alarm,
}

impl CallCategory {
    pub const ALL: [CallCategory; 6] = [
        CallCategory::Traffic,
        CallCategory::Violence,
        CallCategory::Property,
        CallCategory::Disturbance,
        CallCategory::Assistance,
        CallCategory::Alarm,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStatus {
    Created,
    Dispatched,
    OnScene,
    Completed,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a call ended. Only `Completed` earns the responding unit a meal break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallOutcome {
    Completed,
    Cancelled,
    Diverted,
}

/// Inclusive range of simulated seconds. `min >= 1` so a drawn duration always
/// moves a timer strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDurationRange")]
pub struct DurationRange {
    min_secs: u64,
    max_secs: u64,
}

#[derive(Deserialize)]
struct RawDurationRange {
    min_secs: u64,
    max_secs: u64,
}

impl TryFrom<RawDurationRange> for DurationRange {
    type Error = SimError;

    fn try_from(raw: RawDurationRange) -> Result<Self> {
        Self::new(raw.min_secs, raw.max_secs)
    }
}

impl DurationRange {
    pub fn new(min_secs: u64, max_secs: u64) -> Result<Self> {
        if min_secs == 0 || min_secs > max_secs {
            return Err(SimError::InvalidConfiguration(format!(
                "duration range {min_secs}..={max_secs} must be non-empty and start at 1s or later"
            )));
        }
        Ok(Self { min_secs, max_secs })
    }

    /// For compile-time defaults that are known to be valid.
    pub(crate) const fn fixed(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn from_minutes(min: u64, max: u64) -> Result<Self> {
        Self::new(min * 60, max * 60)
    }

    pub fn min_secs(&self) -> u64 {
        self.min_secs
    }

    pub fn max_secs(&self) -> u64 {
        self.max_secs
    }

    pub fn is_valid(&self) -> bool {
        self.min_secs >= 1 && self.min_secs <= self.max_secs
    }

    pub fn draw(&self, rng: &mut dyn RngCore) -> u64 {
        rng.random_range(self.min_secs..=self.max_secs)
    }
}

/// A call for service. Owned by the `CallRegistry`; units hold only its id.
#[derive(Debug, Clone)]
pub struct Call {
    pub id: CallId,
    pub event: Arc<EventType>,
    pub location: Location,
    pub status: CallStatus,
    pub created_at: SimTime,
    pub dispatched_at: Option<SimTime>,
    pub on_scene_at: Option<SimTime>,
    /// Assigned call signs in assignment order. The first is the primary unit.
    pub units: Vec<String>,
}

impl Call {
    pub fn new(id: CallId, event: Arc<EventType>, location: Location, created_at: SimTime) -> Self {
        Self {
            id,
            event,
            location,
            status: CallStatus::Created,
            created_at,
            dispatched_at: None,
            on_scene_at: None,
            units: Vec::new(),
        }
    }

    pub fn priority(&self) -> CallPriority {
        self.event.priority
    }

    pub fn response(&self) -> ResponseCode {
        self.event.response
    }

    pub fn primary_unit(&self) -> Option<&str> {
        self.units.first().map(String::as_str)
    }

    pub fn is_assigned(&self, call_sign: &str) -> bool {
        self.units.iter().any(|u| u == call_sign)
    }
}

/// Archived record of a finished call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedCall {
    pub id: CallId,
    pub event_name: String,
    pub parent_event: String,
    pub category: CallCategory,
    pub priority: CallPriority,
    pub response: ResponseCode,
    pub location_id: u64,
    pub location_name: String,
    pub created_at: SimTime,
    pub dispatched_at: Option<SimTime>,
    pub on_scene_at: Option<SimTime>,
    pub completed_at: SimTime,
    pub outcome: CallOutcome,
    pub units: Vec<String>,
}

impl CompletedCall {
    pub fn from_call(call: &Call, outcome: CallOutcome, completed_at: SimTime) -> Self {
        Self {
            id: call.id,
            event_name: call.event.name.clone(),
            parent_event: call.event.parent.clone(),
            category: call.event.category,
            priority: call.event.priority,
            response: call.event.response,
            location_id: call.location.id,
            location_name: call.location.name.clone(),
            created_at: call.created_at,
            dispatched_at: call.dispatched_at,
            on_scene_at: call.on_scene_at,
            completed_at,
            outcome,
            units: call.units.clone(),
        }
    }

    pub fn primary_unit(&self) -> Option<&str> {
        self.units.first().map(String::as_str)
    }

    /// One row per responding unit, in assignment order.
    pub fn unit_rows(&self) -> impl Iterator<Item = CallUnitRow<'_>> {
        self.units
            .iter()
            .enumerate()
            .map(move |(position, call_sign)| CallUnitRow {
                call_id: self.id,
                call_sign,
                position: position as u32,
                primary: position == 0,
            })
    }
}

/// Normalized call/unit pairing used by the call-log exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallUnitRow<'a> {
    pub call_id: CallId,
    pub call_sign: &'a str,
    pub position: u32,
    pub primary: bool,
}

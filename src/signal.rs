use serde::{Deserialize, Serialize};

use crate::dispatch::UnitStatus;
use crate::model::{CallId, CallOutcome, CallPriority, SimTime, TimePeriod};
use crate::observer::{ObserverList, Subscription};
use crate::region::CrimeLevel;

/// A notification emitted by the dispatch core for the UI layer and other
/// observers. Carries the simulated time it happened at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSignal {
    pub at: SimTime,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalKind {
    /// A call entered the registry.
    CallCreated {
        call_id: CallId,
        event_name: String,
        location_name: String,
        priority: CallPriority,
    },

    /// A unit was attached to a call. The first unit attached is the primary.
    UnitDispatched {
        call_id: CallId,
        call_sign: String,
        primary: bool,
    },

    /// A unit reached the scene.
    UnitOnScene { call_id: CallId, call_sign: String },

    /// A call left the registry.
    CallCompleted { call_id: CallId, outcome: CallOutcome },

    UnitStatusChanged {
        call_sign: String,
        from: UnitStatus,
        to: UnitStatus,
        call_id: Option<CallId>,
    },

    RegionStarted { region: String },

    /// Event generation stopped for a region, either on request or after
    /// repeated failures.
    RegionStopped { region: String, reason: String },

    /// Periodic crime statistics for a region, emitted at each period change.
    CrimeSummary {
        region: String,
        period: TimePeriod,
        level: CrimeLevel,
        expected_calls: f64,
        min_delay_ms: u64,
        max_delay_ms: u64,
    },

    /// Extensible: hosts can route their own notifications through the bus.
    Custom {
        name: String,
        data: serde_json::Value,
    },
}

/// Ordered observer list for [`DispatchSignal`]s.
#[derive(Default)]
pub struct SignalBus {
    observers: ObserverList<DispatchSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&DispatchSignal) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    pub fn emit(&self, at: SimTime, kind: SignalKind) {
        self.observers.notify(&DispatchSignal { at, kind });
    }

    pub fn emit_all(&self, signals: impl IntoIterator<Item = DispatchSignal>) {
        for signal in signals {
            self.observers.notify(&signal);
        }
    }
}

//! The queue of active calls.
//!
//! Shared by every region scheduler, every unit and any manual call-creation
//! path. Each public operation is a single critical section: no other actor
//! can observe a call half-registered or half-completed. Signals are emitted
//! after the lock is released.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::catalog::EventType;
use crate::error::{Result, SimError};
use crate::id::IdGenerator;
use crate::model::{Call, CallId, CallOutcome, CallStatus, CompletedCall, Location, SimTime};
use crate::signal::{SignalBus, SignalKind};
use crate::sync::lock;

struct RegistryState {
    ids: IdGenerator,
    calls: BTreeMap<CallId, Call>,
    completed: Vec<CompletedCall>,
}

impl RegistryState {
    /// Next generated id not already taken by a manually added call.
    fn allocate_id(&mut self) -> CallId {
        loop {
            let id = self.ids.next_id();
            if !self.calls.contains_key(&id) {
                return id;
            }
        }
    }
}

pub struct CallRegistry {
    state: Mutex<RegistryState>,
    signals: Arc<SignalBus>,
}

impl CallRegistry {
    pub fn new(ids: IdGenerator, signals: Arc<SignalBus>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                ids,
                calls: BTreeMap::new(),
                completed: Vec::new(),
            }),
            signals,
        }
    }

    pub fn signals(&self) -> &Arc<SignalBus> {
        &self.signals
    }

    /// Reserve a fresh id for a call built outside the registry.
    pub fn allocate_call_id(&self) -> CallId {
        lock(&self.state).allocate_id()
    }

    /// Register a call built elsewhere (e.g. manual invocation from the UI layer).
    pub fn add_call(&self, call: Call) -> Result<CallId> {
        let (id, kind, at) = {
            let mut state = lock(&self.state);
            if state.calls.contains_key(&call.id) {
                return Err(SimError::DuplicateCall(call.id));
            }
            let kind = created_signal(&call);
            let (id, at) = (call.id, call.created_at);
            state.calls.insert(id, call);
            (id, kind, at)
        };
        self.signals.emit(at, kind);
        Ok(id)
    }

    /// Allocate an id and register a new call in one step.
    pub fn create_call(
        &self,
        event: Arc<EventType>,
        location: Location,
        now: SimTime,
    ) -> CallId {
        let (id, kind) = {
            let mut state = lock(&self.state);
            let id = state.allocate_id();
            let call = Call::new(id, event, location, now);
            let kind = created_signal(&call);
            state.calls.insert(id, call);
            (id, kind)
        };
        tracing::info!("call {id} created at {now}");
        self.signals.emit(now, kind);
        id
    }

    /// Attach a unit to a call. Returns whether the unit became the primary.
    /// Attaching an already-attached unit is a no-op.
    pub fn mark_dispatched(&self, call_id: CallId, call_sign: &str, now: SimTime) -> Result<bool> {
        let primary = {
            let mut state = lock(&self.state);
            let call = state
                .calls
                .get_mut(&call_id)
                .ok_or(SimError::UnknownCall(call_id))?;
            if call.is_assigned(call_sign) {
                return Ok(call.primary_unit() == Some(call_sign));
            }
            call.units.push(call_sign.to_string());
            if call.status == CallStatus::Created {
                call.status = CallStatus::Dispatched;
                call.dispatched_at = Some(now);
            }
            call.units.len() == 1
        };
        tracing::info!("unit {call_sign} dispatched to call {call_id} (primary: {primary})");
        self.signals.emit(
            now,
            SignalKind::UnitDispatched {
                call_id,
                call_sign: call_sign.to_string(),
                primary,
            },
        );
        Ok(primary)
    }

    /// Record a unit's arrival. The first arrival moves the call on scene.
    pub fn mark_on_scene(&self, call_sign: &str, call_id: CallId, now: SimTime) -> Result<()> {
        {
            let mut state = lock(&self.state);
            let call = state
                .calls
                .get_mut(&call_id)
                .ok_or(SimError::UnknownCall(call_id))?;
            if !call.is_assigned(call_sign) {
                return Err(SimError::InvalidTransition {
                    subject: format!("unit {call_sign}"),
                    from: "unassigned".to_string(),
                    to: format!("on scene at call {call_id}"),
                });
            }
            if call.status != CallStatus::OnScene {
                call.status = CallStatus::OnScene;
                call.on_scene_at = Some(now);
            }
        }
        tracing::info!("unit {call_sign} on scene at call {call_id}");
        self.signals.emit(
            now,
            SignalKind::UnitOnScene {
                call_id,
                call_sign: call_sign.to_string(),
            },
        );
        Ok(())
    }

    /// Close a call and move it to the completed archive.
    pub fn mark_complete(
        &self,
        call_id: CallId,
        outcome: CallOutcome,
        now: SimTime,
    ) -> Result<CompletedCall> {
        let record = {
            let mut state = lock(&self.state);
            let call = state
                .calls
                .remove(&call_id)
                .ok_or(SimError::UnknownCall(call_id))?;
            let record = CompletedCall::from_call(&call, outcome, now);
            state.completed.push(record.clone());
            record
        };
        tracing::info!("call {call_id} closed: {outcome:?}");
        self.signals
            .emit(now, SignalKind::CallCompleted { call_id, outcome });
        Ok(record)
    }

    /// Detach a diverted unit. A call left with no units goes back to the queue.
    pub fn release_unit(&self, call_id: CallId, call_sign: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let call = state
            .calls
            .get_mut(&call_id)
            .ok_or(SimError::UnknownCall(call_id))?;
        call.units.retain(|u| u != call_sign);
        if call.units.is_empty() && call.status != CallStatus::Created {
            call.status = CallStatus::Created;
            call.dispatched_at = None;
            call.on_scene_at = None;
            tracing::info!("call {call_id} returned to the queue after {call_sign} was diverted");
        }
        Ok(())
    }

    pub fn get(&self, call_id: CallId) -> Option<Call> {
        lock(&self.state).calls.get(&call_id).cloned()
    }

    pub fn contains(&self, call_id: CallId) -> bool {
        lock(&self.state).calls.contains_key(&call_id)
    }

    /// Active calls, most urgent first, oldest first within a priority.
    pub fn calls_by_priority(&self) -> Vec<Call> {
        let mut calls: Vec<Call> = lock(&self.state).calls.values().cloned().collect();
        calls.sort_by_key(|c| (c.priority(), c.created_at, c.id));
        calls
    }

    pub fn calls_with_status(&self, status: CallStatus) -> Vec<Call> {
        let mut calls: Vec<Call> = lock(&self.state)
            .calls
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect();
        calls.sort_by_key(|c| (c.priority(), c.created_at, c.id));
        calls
    }

    /// Calls waiting for a unit, most urgent first.
    pub fn pending_calls(&self) -> Vec<Call> {
        self.calls_with_status(CallStatus::Created)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.state).calls.len()
    }

    /// True if an active call already uses this location.
    pub fn is_location_occupied(&self, location_id: u64) -> bool {
        lock(&self.state)
            .calls
            .values()
            .any(|c| c.location.id == location_id)
    }

    pub fn completed_count(&self) -> usize {
        lock(&self.state).completed.len()
    }

    /// Hand over archived records, e.g. for JSONL or Postgres export.
    pub fn drain_completed(&self) -> Vec<CompletedCall> {
        std::mem::take(&mut lock(&self.state).completed)
    }
}

fn created_signal(call: &Call) -> SignalKind {
    SignalKind::CallCreated {
        call_id: call.id,
        event_name: call.event.name.clone(),
        location_name: call.location.name.clone(),
        priority: call.priority(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{
        CallCategory, CallPriority, DurationRange, LocationFilter, LocationType, ResponseCode,
    };
    use crate::sampling::WorldStateMultiplierTable;
    use crate::signal::DispatchSignal;

    fn event(name: &str, priority: CallPriority) -> Arc<EventType> {
        Arc::new(EventType {
            name: name.to_string(),
            parent: name.to_string(),
            category: CallCategory::Violence,
            priority,
            response: ResponseCode::Code3,
            location_filter: LocationFilter::single(LocationType::Street),
            on_scene: DurationRange::from_minutes(5, 10).unwrap(),
            spawn_weight: WorldStateMultiplierTable::uniform(1, 1).unwrap(),
        })
    }

    fn location(id: u64) -> Location {
        Location::new(id, format!("Street {id}"), LocationType::Street, [0.0; 3])
    }

    fn registry() -> (CallRegistry, Arc<Mutex<Vec<DispatchSignal>>>) {
        let bus = Arc::new(SignalBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        // Leak the subscription for the lifetime of the test.
        std::mem::forget(bus.subscribe(move |s| sink.lock().unwrap().push(s.clone())));
        (CallRegistry::new(IdGenerator::starting_from(500), bus), seen)
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let (reg, _) = registry();
        let a = reg.create_call(event("Assault", CallPriority::Emergency), location(1), SimTime::default());
        let b = reg.create_call(event("Assault", CallPriority::Emergency), location(2), SimTime::default());
        assert_eq!((a, b), (500, 501));
        assert_eq!(reg.active_count(), 2);
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let (reg, _) = registry();
        let call = Call::new(7, event("Fight", CallPriority::Emergency), location(1), SimTime::default());
        reg.add_call(call.clone()).unwrap();
        assert_eq!(reg.add_call(call), Err(SimError::DuplicateCall(7)));
    }

    #[test]
    fn first_dispatched_unit_is_primary() {
        let (reg, _) = registry();
        let id = reg.create_call(event("Shots fired", CallPriority::Immediate), location(1), SimTime::default());
        assert!(reg.mark_dispatched(id, "1-ADAM-12", SimTime::from_seconds(5)).unwrap());
        assert!(!reg.mark_dispatched(id, "1-LINCOLN-18", SimTime::from_seconds(6)).unwrap());
        // re-dispatch is a no-op that still reports primacy
        assert!(reg.mark_dispatched(id, "1-ADAM-12", SimTime::from_seconds(7)).unwrap());

        let call = reg.get(id).unwrap();
        assert_eq!(call.status, CallStatus::Dispatched);
        assert_eq!(call.primary_unit(), Some("1-ADAM-12"));
        assert_eq!(call.units.len(), 2);
        assert_eq!(call.dispatched_at, Some(SimTime::from_seconds(5)));
    }

    #[test]
    fn on_scene_requires_assignment() {
        let (reg, _) = registry();
        let id = reg.create_call(event("Fight", CallPriority::Emergency), location(1), SimTime::default());
        assert!(matches!(
            reg.mark_on_scene("1-ADAM-12", id, SimTime::default()),
            Err(SimError::InvalidTransition { .. })
        ));
        reg.mark_dispatched(id, "1-ADAM-12", SimTime::default()).unwrap();
        reg.mark_on_scene("1-ADAM-12", id, SimTime::from_seconds(60)).unwrap();
        assert_eq!(reg.get(id).unwrap().status, CallStatus::OnScene);
    }

    #[test]
    fn complete_archives_and_removes() {
        let (reg, seen) = registry();
        let id = reg.create_call(event("Fight", CallPriority::Emergency), location(3), SimTime::default());
        assert!(reg.is_location_occupied(3));
        reg.mark_dispatched(id, "1-ADAM-12", SimTime::default()).unwrap();
        let record = reg
            .mark_complete(id, CallOutcome::Completed, SimTime::from_seconds(900))
            .unwrap();
        assert_eq!(record.primary_unit(), Some("1-ADAM-12"));
        assert!(!reg.contains(id));
        assert!(!reg.is_location_occupied(3));
        assert_eq!(reg.mark_complete(id, CallOutcome::Completed, SimTime::default()), Err(SimError::UnknownCall(id)));

        let drained = reg.drain_completed();
        assert_eq!(drained.len(), 1);
        assert_eq!(reg.completed_count(), 0);

        let kinds: Vec<&str> = seen
            .lock()
            .unwrap()
            .iter()
            .map(|s| match s.kind {
                SignalKind::CallCreated { .. } => "created",
                SignalKind::UnitDispatched { .. } => "dispatched",
                SignalKind::CallCompleted { .. } => "completed",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["created", "dispatched", "completed"]);
    }

    #[test]
    fn queries_sort_by_priority() {
        let (reg, _) = registry();
        let routine = reg.create_call(event("Noise", CallPriority::Routine), location(1), SimTime::from_seconds(1));
        let urgent = reg.create_call(event("Shots", CallPriority::Immediate), location(2), SimTime::from_seconds(2));
        let ids: Vec<CallId> = reg.calls_by_priority().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![urgent, routine]);

        reg.mark_dispatched(urgent, "1-ADAM-12", SimTime::default()).unwrap();
        let pending: Vec<CallId> = reg.pending_calls().iter().map(|c| c.id).collect();
        assert_eq!(pending, vec![routine]);
    }

    #[test]
    fn releasing_last_unit_requeues() {
        let (reg, _) = registry();
        let id = reg.create_call(event("Fight", CallPriority::Emergency), location(1), SimTime::default());
        reg.mark_dispatched(id, "1-ADAM-12", SimTime::default()).unwrap();
        reg.release_unit(id, "1-ADAM-12").unwrap();
        let call = reg.get(id).unwrap();
        assert_eq!(call.status, CallStatus::Created);
        assert!(call.units.is_empty());
    }

    #[test]
    fn releasing_last_unit_on_scene_requeues() {
        let (reg, _) = registry();
        let id = reg.create_call(event("Fight", CallPriority::Emergency), location(4), SimTime::default());
        reg.mark_dispatched(id, "1-ADAM-12", SimTime::from_seconds(10)).unwrap();
        reg.mark_on_scene("1-ADAM-12", id, SimTime::from_seconds(200)).unwrap();
        reg.release_unit(id, "1-ADAM-12").unwrap();

        let call = reg.get(id).unwrap();
        assert_eq!(call.status, CallStatus::Created);
        assert_eq!(call.on_scene_at, None);
        let pending: Vec<CallId> = reg.pending_calls().iter().map(|c| c.id).collect();
        assert_eq!(pending, vec![id]);
    }

    #[test]
    fn generated_ids_skip_manual_calls() {
        let bus = Arc::new(SignalBus::new());
        let reg = CallRegistry::new(IdGenerator::starting_from(10), bus);
        let manual = Call::new(10, event("Fight", CallPriority::Emergency), location(1), SimTime::default());
        reg.add_call(manual).unwrap();
        reg.add_call(Call::new(12, event("Fight", CallPriority::Emergency), location(2), SimTime::default()))
            .unwrap();

        let a = reg.create_call(event("Noise", CallPriority::Routine), location(3), SimTime::default());
        let b = reg.allocate_call_id();
        assert_eq!((a, b), (11, 13));
        assert_eq!(reg.active_count(), 3);
        assert_eq!(reg.get(10).unwrap().location.id, 1);
        assert_eq!(reg.get(11).unwrap().location.id, 3);
    }
}

//! Read-only registry of event types, keyed by category and by parent event.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::model::{CallCategory, CallPriority, DurationRange, LocationFilter, ResponseCode};
use crate::sampling::{WorldStateMultiplierTable, WorldStateWeightedSampler};
use crate::world::WorldState;

/// Descriptor for one kind of incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    pub name: String,
    /// Name of the parent event this variant belongs to (e.g. "Burglary" for
    /// "Burglary in progress" and "Burglary report").
    pub parent: String,
    pub category: CallCategory,
    pub priority: CallPriority,
    pub response: ResponseCode,
    pub location_filter: LocationFilter,
    /// Simulated time a responding unit spends on scene.
    pub on_scene: DurationRange,
    pub spawn_weight: WorldStateMultiplierTable,
}

pub struct EventCatalog {
    by_category: BTreeMap<CallCategory, WorldStateWeightedSampler<Arc<EventType>>>,
    by_parent: BTreeMap<String, Vec<Arc<EventType>>>,
    by_name: HashMap<String, Arc<EventType>>,
}

impl EventCatalog {
    pub fn new(world: Arc<WorldState>, events: impl IntoIterator<Item = EventType>) -> Result<Self> {
        let mut by_category: BTreeMap<CallCategory, WorldStateWeightedSampler<Arc<EventType>>> =
            BTreeMap::new();
        let mut by_parent: BTreeMap<String, Vec<Arc<EventType>>> = BTreeMap::new();
        let mut by_name = HashMap::new();

        for event in events {
            if by_name.contains_key(&event.name) {
                return Err(SimError::InvalidConfiguration(format!(
                    "event type {} is defined twice",
                    event.name
                )));
            }
            if !event.on_scene.is_valid() {
                return Err(SimError::InvalidConfiguration(format!(
                    "event type {} has an empty on-scene range {}..={}s",
                    event.name,
                    event.on_scene.min_secs(),
                    event.on_scene.max_secs()
                )));
            }
            let event = Arc::new(event);
            by_category
                .entry(event.category)
                .or_insert_with(|| WorldStateWeightedSampler::new(world.clone()))
                .add(event.clone(), event.spawn_weight.clone());
            by_parent
                .entry(event.parent.clone())
                .or_default()
                .push(event.clone());
            by_name.insert(event.name.clone(), event);
        }

        tracing::info!(
            "event catalog loaded: {} event types in {} categories",
            by_name.len(),
            by_category.len()
        );
        Ok(Self {
            by_category,
            by_parent,
            by_name,
        })
    }

    /// Draw an event type of `category`, weighted by the current world state.
    pub fn draw(&self, category: CallCategory, rng: &mut dyn RngCore) -> Result<Arc<EventType>> {
        self.by_category
            .get(&category)
            .ok_or(SimError::EmptyCollection)?
            .draw(rng)
    }

    pub fn try_draw(&self, category: CallCategory, rng: &mut dyn RngCore) -> Option<Arc<EventType>> {
        self.draw(category, rng).ok()
    }

    pub fn get(&self, name: &str) -> Option<Arc<EventType>> {
        self.by_name.get(name).cloned()
    }

    pub fn by_parent(&self, parent: &str) -> &[Arc<EventType>] {
        self.by_parent.get(parent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = CallCategory> + '_ {
        self.by_category.keys().copied()
    }

    /// Current weight total for a category; 0 when nothing is eligible.
    pub fn category_total(&self, category: CallCategory) -> u64 {
        self.by_category.get(&category).map_or(0, |s| s.total())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

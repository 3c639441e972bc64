use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    Residence,
    Business,
    Street,
    ParkingLot,
    Highway,
    Park,
    GasStation,
    Bank,
}

/// A place an incident can happen, as handed out by the location provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub name: String,
    pub kind: LocationType,
    pub position: [f32; 3],
}

impl Location {
    pub fn new(id: u64, name: impl Into<String>, kind: LocationType, position: [f32; 3]) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            position,
        }
    }
}

/// Location types an event type accepts. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    kinds: Vec<LocationType>,
}

impl LocationFilter {
    pub fn new(kinds: impl IntoIterator<Item = LocationType>) -> Result<Self> {
        let mut unique: Vec<LocationType> = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        let kinds = unique;
        if kinds.is_empty() {
            return Err(SimError::InvalidConfiguration(
                "location filter must accept at least one location type".to_string(),
            ));
        }
        Ok(Self { kinds })
    }

    pub fn single(kind: LocationType) -> Self {
        Self { kinds: vec![kind] }
    }

    pub fn kinds(&self) -> &[LocationType] {
        &self.kinds
    }

    pub fn accepts(&self, location: &Location) -> bool {
        self.kinds.contains(&location.kind)
    }
}

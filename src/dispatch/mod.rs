//! Call queue and the simulated units that work it.

pub mod registry;
pub mod unit;

pub use registry::CallRegistry;
pub use unit::{
    Assignment, PlayerPresence, SimulatedUnit, StatusTransition, UnitContext, UnitPresence,
    UnitStatus, VirtualPresence,
};

//! Headless Bevy tick driver for simulated units.

pub mod app;
pub mod clock;
pub mod components;
pub mod events;
pub mod resources;
pub mod schedule;
pub mod spawn;
pub mod systems;

pub use app::{build_dispatch_app, build_dispatch_app_with_executor};
pub use clock::SimClock;
pub use components::Unit;
pub use events::UnitStatusChanged;
pub use resources::{DispatchServices, TickRng};
pub use schedule::{DispatchPhase, DispatchTick, configure_dispatch_schedule};
pub use spawn::spawn_unit;

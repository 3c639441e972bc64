pub mod call;
pub mod location;
pub mod time;
pub mod world_state;

pub use call::{
    Call, CallCategory, CallId, CallOutcome, CallPriority, CallStatus, CallUnitRow, CompletedCall,
    DurationRange, ResponseCode,
};
pub use location::{Location, LocationFilter, LocationType};
pub use time::SimTime;
pub use world_state::{TimePeriod, Weather, WeatherCategory};

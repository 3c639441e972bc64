//! The core's view of the host game's world state.
//!
//! The host pushes time, weather and time-scale updates into [`WorldState`];
//! the hub stores them and notifies observers when the time-of-day period,
//! the weather or the time scale actually changes.

use std::sync::RwLock;

use crate::error::{Result, SimError};
use crate::model::{SimTime, TimePeriod, Weather};
use crate::observer::{ObserverList, Subscription};
use crate::sync::{read, write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub time: SimTime,
    pub weather: Weather,
    /// Simulated seconds that pass per real second.
    pub time_scale: u32,
}

impl WorldSnapshot {
    pub fn period(&self) -> TimePeriod {
        self.time.period()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldStateEvent {
    TimePeriodChanged { old: TimePeriod, new: TimePeriod },
    WeatherChanged { old: Weather, new: Weather },
    TimeScaleChanged { old: u32, new: u32 },
}

pub struct WorldState {
    snapshot: RwLock<WorldSnapshot>,
    observers: ObserverList<WorldStateEvent>,
}

impl WorldState {
    pub fn new(time: SimTime, weather: Weather, time_scale: u32) -> Result<Self> {
        validate_time_scale(time_scale)?;
        Ok(Self {
            snapshot: RwLock::new(WorldSnapshot {
                time,
                weather,
                time_scale,
            }),
            observers: ObserverList::new(),
        })
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        *read(&self.snapshot)
    }

    pub fn current_time(&self) -> SimTime {
        read(&self.snapshot).time
    }

    pub fn current_period(&self) -> TimePeriod {
        self.current_time().period()
    }

    pub fn current_weather(&self) -> Weather {
        read(&self.snapshot).weather
    }

    pub fn time_scale(&self) -> u32 {
        read(&self.snapshot).time_scale
    }

    /// Advance (or rewind) the simulated clock. Emits `TimePeriodChanged` when the
    /// new time falls in a different period.
    pub fn set_time(&self, time: SimTime) {
        let (old, new) = {
            let mut snapshot = write(&self.snapshot);
            let old = snapshot.period();
            snapshot.time = time;
            (old, snapshot.period())
        };
        if old != new {
            tracing::debug!("time period changed {old} -> {new} at {time}");
            self.observers
                .notify(&WorldStateEvent::TimePeriodChanged { old, new });
        }
    }

    pub fn set_weather(&self, weather: Weather) {
        let old = {
            let mut snapshot = write(&self.snapshot);
            std::mem::replace(&mut snapshot.weather, weather)
        };
        if old != weather {
            tracing::debug!("weather changed {old:?} -> {weather:?}");
            self.observers.notify(&WorldStateEvent::WeatherChanged { old, new: weather });
        }
    }

    pub fn set_time_scale(&self, time_scale: u32) -> Result<()> {
        validate_time_scale(time_scale)?;
        let old = {
            let mut snapshot = write(&self.snapshot);
            std::mem::replace(&mut snapshot.time_scale, time_scale)
        };
        if old != time_scale {
            tracing::debug!("time scale changed {old} -> {time_scale}");
            self.observers.notify(&WorldStateEvent::TimeScaleChanged {
                old,
                new: time_scale,
            });
        }
        Ok(())
    }

    pub fn subscribe(
        &self,
        callback: impl Fn(&WorldStateEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Real milliseconds that elapse while `game_seconds` pass in game.
    pub fn real_ms_for(&self, game_seconds: u64) -> u64 {
        real_ms_for(game_seconds, self.time_scale())
    }
}

pub fn real_ms_for(game_seconds: u64, time_scale: u32) -> u64 {
    game_seconds.saturating_mul(1_000) / u64::from(time_scale.max(1))
}

fn validate_time_scale(time_scale: u32) -> Result<()> {
    if time_scale == 0 {
        return Err(SimError::InvalidConfiguration(
            "time scale must be at least 1".to_string(),
        ));
    }
    Ok(())
}

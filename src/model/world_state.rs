use std::fmt;

use serde::{Deserialize, Serialize};

/// Four six-hour periods of the in-game day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    Morning, // 06:00–11:59
    Day,     // 12:00–17:59
    Evening, // 18:00–23:59
    Night,   // 00:00–05:59
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Day,
        TimePeriod::Evening,
        TimePeriod::Night,
    ];

    pub fn from_hour(hour: u64) -> Self {
        match hour % 24 {
            6..=11 => Self::Morning,
            12..=17 => Self::Day,
            18..=23 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Dense index used by per-period tables.
    pub fn index(self) -> usize {
        match self {
            Self::Morning => 0,
            Self::Day => 1,
            Self::Evening => 2,
            Self::Night => 3,
        }
    }

    pub fn start_hour(self) -> u64 {
        match self {
            Self::Morning => 6,
            Self::Day => 12,
            Self::Evening => 18,
            Self::Night => 0,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Morning => Self::Day,
            Self::Day => Self::Evening,
            Self::Evening => Self::Night,
            Self::Night => Self::Morning,
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Weather as reported by the host game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weather {
    ExtraSunny,
    #[default]
    Clear,
    Clouds,
    Smog,
    Foggy,
    Overcast,
    Raining,
    ThunderStorm,
    Clearing,
    Neutral,
    Snowing,
    Blizzard,
    SnowLight,
    Christmas,
    Halloween,
    Unknown,
}

impl Weather {
    /// Fixed classification into the coarse categories used by multiplier tables.
    /// Total: values without an obvious bucket fall back to `Clear`.
    pub fn category(self) -> WeatherCategory {
        match self {
            Self::Raining | Self::Clearing => WeatherCategory::Rain,
            Self::ThunderStorm | Self::Halloween => WeatherCategory::Storm,
            Self::Snowing | Self::Blizzard | Self::SnowLight | Self::Christmas => {
                WeatherCategory::Snow
            }
            Self::Clouds | Self::Smog | Self::Foggy | Self::Overcast => WeatherCategory::Overcast,
            Self::ExtraSunny | Self::Clear | Self::Neutral | Self::Unknown => WeatherCategory::Clear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeatherCategory {
    Clear,
    Rain,
    Snow,
    Overcast,
    Storm,
}

impl WeatherCategory {
    pub const ALL: [WeatherCategory; 5] = [
        WeatherCategory::Clear,
        WeatherCategory::Rain,
        WeatherCategory::Snow,
        WeatherCategory::Overcast,
        WeatherCategory::Storm,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Clear => 0,
            Self::Rain => 1,
            Self::Snow => 2,
            Self::Overcast => 3,
            Self::Storm => 4,
        }
    }
}

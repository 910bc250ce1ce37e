// Timeouts, region geometry, mapping profiles, serial settings
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encoder::WireFormat;

// Runtime loop: terminal poll timeout (~50Hz like a teleop loop)
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

// Minimum gap between accepted send attempts
pub const MIN_SEND_INTERVAL_MS: u64 = 500;

// Joystick region (pixels of the original page, reused as pad units)
pub const REGION_SIZE: f32 = 200.0;
pub const REGION_MARGIN: f32 = 36.0;
pub const REGION_MIN_OFFSET: f32 = 34.0;
pub const INDICATOR_SIZE: f32 = 60.0;
pub const REST_OFFSET: f32 = 6.5;

// Servo neutral and the dead zone flattened onto it
pub const STEERING_NEUTRAL: i32 = 90;
pub const DEAD_ZONE: (f32, f32) = (90.0, 100.0);

// Serial link
pub const DEFAULT_PORT: &str = "/dev/rfcomm0";
pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const WRITE_TIMEOUT_MS: u64 = 1000;
pub const INBOUND_DELIMITER: u8 = b'\n';

// Terminal cell -> pad unit scaling
pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Geometry of the square joystick region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub size: f32,
    pub margin: f32,
    pub min_offset: f32,
    pub indicator_size: f32,
    pub rest_offset: f32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            size: REGION_SIZE,
            margin: REGION_MARGIN,
            min_offset: REGION_MIN_OFFSET,
            indicator_size: INDICATOR_SIZE,
            rest_offset: REST_OFFSET,
        }
    }
}

/// Linear steering coefficients and the direction tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    pub steering_min: f32,
    pub steering_max: f32,
    pub tolerance: f32,
}

impl MapperConfig {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Classic => Self {
                steering_min: 45.0,
                steering_max: 135.0,
                tolerance: 6.5,
            },
            Profile::Wide => Self {
                steering_min: 40.0,
                steering_max: 137.5,
                tolerance: 20.0,
            },
        }
    }
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self::for_profile(Profile::Classic)
    }
}

/// The two coefficient sets seen on deployed controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Classic,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub min_interval_ms: u64,
}

impl GateConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: MIN_SEND_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub port: String,
    pub baudrate: u32,
    pub write_timeout_ms: u64,
    pub format: WireFormat,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            write_timeout_ms: WRITE_TIMEOUT_MS,
            format: WireFormat::Csv,
        }
    }
}

/// Where the joystick pad sits in the terminal and how big a cell is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    pub origin_col: u16,
    pub origin_row: u16,
    pub cell_width: f32,
    pub cell_height: f32,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            origin_col: 0,
            origin_row: 0,
            cell_width: CELL_WIDTH,
            cell_height: CELL_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub region: RegionConfig,
    pub mapper: MapperConfig,
    pub gate: GateConfig,
    pub link: LinkConfig,
    pub pad: PadConfig,
}

impl RuntimeConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "region.size",
                reason: format!("must be positive, got {}", self.region.size),
            });
        }
        if self.region.size + self.region.margin - self.region.indicator_size
            < self.region.min_offset
        {
            return Err(ConfigError::Invalid {
                field: "region.indicator_size",
                reason: "indicator does not fit inside the region".to_string(),
            });
        }
        if self.mapper.steering_max <= self.mapper.steering_min {
            return Err(ConfigError::Invalid {
                field: "mapper.steering_max",
                reason: "must exceed steering_min".to_string(),
            });
        }
        if self.mapper.tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "mapper.tolerance",
                reason: "must not be negative".to_string(),
            });
        }
        if self.pad.cell_width <= 0.0 || self.pad.cell_height <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "pad",
                reason: "cell size must be positive".to_string(),
            });
        }
        Ok(())
    }
}

//! Process-wide simulator settings
//!
//! All settings are fixed at startup. Defaults match the test setup of the
//! firmware; each one can be overridden from the environment:
//!
//! | Variable | Setting | Default |
//! |---|---|---|
//! | `IMU_SIM_ENDPOINT` | listen address | `0.0.0.0:5555` |
//! | `IMU_SIM_DEVICE_ADDRESS` | I2C device address (hex) | `0x7f` |
//! | `IMU_SIM_ODR_SECONDS` | output data rate in seconds | `0.04` (25 Hz) |
//! | `IMU_SIM_DATASET` | dataset file | `TestData/ImuLog.csv` |

use std::path::PathBuf;
use std::time::Duration;

use crate::bus::parse_hex_byte;
use crate::error::ConfigError;
use crate::DEFAULT_DEVICE_ADDRESS;

/// Default listen address
pub const DEFAULT_ENDPOINT: &str = "0.0.0.0:5555";

/// Default output data rate (25 Hz)
pub const DEFAULT_OUTPUT_DATA_RATE: Duration = Duration::from_millis(40);

/// Default dataset location
pub const DEFAULT_DATASET_PATH: &str = "TestData/ImuLog.csv";

const ENDPOINT_VAR: &str = "IMU_SIM_ENDPOINT";
const DEVICE_ADDRESS_VAR: &str = "IMU_SIM_DEVICE_ADDRESS";
const ODR_VAR: &str = "IMU_SIM_ODR_SECONDS";
const DATASET_VAR: &str = "IMU_SIM_DATASET";

/// Simulator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Address the transport listens on
    pub endpoint: String,
    /// I2C address the simulated device answers to
    pub device_address: u8,
    /// Interval between two acquired samples
    pub output_data_rate: Duration,
    /// Dataset replayed into the data registers
    pub dataset_path: PathBuf,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            device_address: DEFAULT_DEVICE_ADDRESS,
            output_data_rate: DEFAULT_OUTPUT_DATA_RATE,
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
        }
    }
}

impl SimulatorConfig {
    /// Defaults overridden by the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by `lookup(variable)`
    ///
    /// # Errors
    ///
    /// Returns an error if a looked up value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            config.endpoint = endpoint;
        }
        if let Some(address) = lookup(DEVICE_ADDRESS_VAR) {
            config.device_address = parse_device_address(&address)?;
        }
        if let Some(odr) = lookup(ODR_VAR) {
            config.output_data_rate = parse_output_data_rate(&odr)?;
        }
        if let Some(path) = lookup(DATASET_VAR) {
            config.dataset_path = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_device_address(value: &str) -> Result<u8, ConfigError> {
    parse_hex_byte(value.trim()).map_err(|source| ConfigError::InvalidDeviceAddress {
        value: value.to_owned(),
        source,
    })
}

fn parse_output_data_rate(value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
        .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
        .ok_or_else(|| ConfigError::InvalidOutputDataRate(value.to_owned()))
}

//! Timing-gated data acquisition
//!
//! The simulated accelerometer produces one sample every output data rate
//! (ODR) interval while it is enabled. Nothing runs in the background: the
//! engine only advances when the firmware polls the data-ready status, which
//! is exactly how a driver discovers new data on the real part.
//!
//! # Scheduling
//!
//! On each readiness check the next acquisition is due at
//! `last_acquisition + odr`. When that timepoint is strictly in the past, the
//! next dataset sample is latched into the data registers and
//! `last_acquisition` moves to the *scheduled* timepoint, not to "now", so the
//! sample clock does not drift with polling latency. A poller that falls
//! behind sees one ready flag per poll until it has caught up.

use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::dataset::{Dataset, Sample};

/// Scale of the accelerometer fixed-point encoding (LSB per g)
pub const ACCEL_SENSITIVITY: f64 = 16384.0;

/// Number of bytes latched per sample (three axes, two bytes each)
pub const DATA_REGISTER_COUNT: usize = 6;

/// Data register contents before the first sample is acquired
pub const INITIAL_DATA_REGISTERS: [u8; DATA_REGISTER_COUNT] = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];

/// Encode one axis value (in g) into its raw 16-bit register representation
///
/// The value is scaled by [`ACCEL_SENSITIVITY`], rounded to the nearest
/// integer and truncated to the low 16 bits (two's complement wrap).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn encode_axis(value: f64) -> u16 {
    (value * ACCEL_SENSITIVITY).round() as i64 as u16
}

/// Encode a sample into the six data register bytes
///
/// Layout: X high, X low, Y high, Y low, Z high, Z low.
#[must_use]
pub fn encode_sample(sample: &Sample) -> [u8; DATA_REGISTER_COUNT] {
    let mut bytes = [0u8; DATA_REGISTER_COUNT];
    for (chunk, value) in bytes.chunks_exact_mut(2).zip(sample.axes()) {
        chunk.copy_from_slice(&encode_axis(value).to_be_bytes());
    }
    bytes
}

/// Accelerometer data acquisition engine
#[derive(Debug)]
pub struct DataAcquisition<C> {
    clock: C,
    output_data_rate: Duration,
    last_acquisition: Option<Instant>,
    dataset: Dataset,
    data: [u8; DATA_REGISTER_COUNT],
}

impl<C: Clock> DataAcquisition<C> {
    /// Create a disabled engine replaying `dataset` every `output_data_rate`
    pub fn new(dataset: Dataset, output_data_rate: Duration, clock: C) -> Self {
        Self {
            clock,
            output_data_rate,
            last_acquisition: None,
            dataset,
            data: INITIAL_DATA_REGISTERS,
        }
    }

    /// Start acquiring; the first sample is due one ODR interval from now
    pub fn enable(&mut self) {
        self.last_acquisition = Some(self.clock.now());
        log::info!("Data acquisition enabled");
    }

    /// Stop acquiring; data registers keep their last values
    pub fn disable(&mut self) {
        self.last_acquisition = None;
        log::info!("Data acquisition disabled");
    }

    /// Whether acquisition is running
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.last_acquisition.is_some()
    }

    /// Configured output data rate
    #[must_use]
    pub fn output_data_rate(&self) -> Duration {
        self.output_data_rate
    }

    /// Check for, and latch, a new sample
    ///
    /// **Side effect:** when the scheduled acquisition time has passed, this
    /// pulls the next dataset sample into the data registers and advances the
    /// schedule by one ODR interval. Returns `true` only for the call that
    /// latched the sample. While disabled, always returns `false`.
    pub fn is_new_data_ready(&mut self) -> bool {
        let Some(last) = self.last_acquisition else {
            return false;
        };

        let scheduled = last + self.output_data_rate;
        if scheduled >= self.clock.now() {
            return false;
        }

        let sample = self.dataset.next_sample();
        self.data = encode_sample(&sample);
        self.last_acquisition = Some(scheduled);
        log::debug!("New acquired data: {sample:?} -> {:02x?}", self.data);
        true
    }

    /// Latched byte of data register `index` (0 = X high ... 5 = Z low)
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`DATA_REGISTER_COUNT`].
    #[must_use]
    pub fn data_register(&self, index: usize) -> u8 {
        self.data[index]
    }

    /// All latched data register bytes
    #[must_use]
    pub fn data_registers(&self) -> [u8; DATA_REGISTER_COUNT] {
        self.data
    }
}

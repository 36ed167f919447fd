//! Recorded motion dataset
//!
//! A dataset is a comma-separated text file: one header row, then one row per
//! sample with at least three numeric columns (x, y, z acceleration in g).
//! Extra columns are ignored. The whole file is loaded up front and replayed
//! cyclically: after the last sample, playback restarts at the first one.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DatasetError;

/// One acceleration sample in g
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// X-axis acceleration
    pub x: f64,
    /// Y-axis acceleration
    pub y: f64,
    /// Z-axis acceleration
    pub z: f64,
}

impl Sample {
    /// Create a sample from its three axes
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Axes in register order (X, Y, Z)
    #[must_use]
    pub const fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Non-empty, endlessly repeating sequence of samples
#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
    cursor: usize,
}

impl Dataset {
    /// Build a dataset from already decoded samples
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Empty`] if `samples` is empty.
    pub fn new(samples: Vec<Sample>) -> Result<Self, DatasetError> {
        if samples.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { samples, cursor: 0 })
    }

    /// Load a dataset file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or any row is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_reader(BufReader::new(file)).map_err(|err| match err {
            DatasetError::Io { source, .. } => DatasetError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse a dataset from any buffered reader
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the header is missing, a row is
    /// malformed or there are no samples.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DatasetError> {
        let mut lines = reader.lines().enumerate();

        // Header
        match lines.next() {
            Some((_, Ok(_))) => {}
            Some((_, Err(source))) => {
                return Err(DatasetError::Io {
                    path: "<reader>".into(),
                    source,
                });
            }
            None => return Err(DatasetError::MissingHeader),
        }

        let mut samples = Vec::new();
        for (index, line) in lines {
            let line = line.map_err(|source| DatasetError::Io {
                path: "<reader>".into(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            samples.push(parse_row(&line, index + 1)?);
        }

        log::debug!("Loaded {} samples", samples.len());
        Self::new(samples)
    }

    /// Number of samples in one playback cycle
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a dataset holds at least one sample
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples in playback order
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Return the next sample, wrapping to the first after the last
    pub fn next_sample(&mut self) -> Sample {
        let sample = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        sample
    }
}

fn parse_row(line: &str, line_number: usize) -> Result<Sample, DatasetError> {
    let mut fields = line.split(',').map(str::trim);
    let mut axes = [0.0_f64; 3];

    for (axis, name) in axes.iter_mut().zip(["x", "y", "z"]) {
        let field = fields.next().ok_or_else(|| DatasetError::InvalidRow {
            line: line_number,
            reason: format!("missing {name} column"),
        })?;
        *axis = field
            .parse()
            .ok()
            .filter(|value: &f64| value.is_finite())
            .ok_or_else(|| DatasetError::InvalidRow {
                line: line_number,
                reason: format!("{name} value {field:?} is not a finite number"),
            })?;
    }

    let [x, y, z] = axes;
    Ok(Sample::new(x, y, z))
}

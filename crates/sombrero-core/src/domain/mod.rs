pub mod errors;

pub use errors::{ExitMapping, SombreroError, SombreroErrorCategory, SombreroResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Dispersion above this value marks the known series as inconsistent.
pub const HIGH_DISPERSION_THRESHOLD: f64 = 1.0;

/// One greyscale reading per calibration patch, in patch order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementSeries(Vec<f64>);

impl MeasurementSeries {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }
}

impl From<Vec<f64>> for MeasurementSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl<const N: usize> From<[f64; N]> for MeasurementSeries {
    fn from(values: [f64; N]) -> Self {
        Self::new(values.to_vec())
    }
}

/// A `values` line of a compilation file, located by its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanRecord {
    Present {
        line_number: usize,
        series: MeasurementSeries,
    },
    Missing {
        line_number: usize,
    },
}

impl ScanRecord {
    pub fn line_number(&self) -> usize {
        match self {
            Self::Present { line_number, .. } | Self::Missing { line_number } => *line_number,
        }
    }

    pub fn series(&self) -> Option<&MeasurementSeries> {
        match self {
            Self::Present { series, .. } => Some(series),
            Self::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusResult {
    pub series: MeasurementSeries,
    pub dispersion: f64,
}

impl ConsensusResult {
    pub fn is_high_dispersion(&self) -> bool {
        self.dispersion > HIGH_DISPERSION_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreyscaleSource {
    Average,
    Fixture,
}

impl GreyscaleSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Average => "average",
            Self::Fixture => "fixture",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "average" => Some(Self::Average),
            "fixture" => Some(Self::Fixture),
            _ => None,
        }
    }
}

impl Display for GreyscaleSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepairScope {
    #[default]
    MissingOnly,
    All,
}

impl RepairScope {
    pub const fn from_replace_all(replace_all: bool) -> Self {
        if replace_all { Self::All } else { Self::MissingOnly }
    }

    pub const fn replaces_present(self) -> bool {
        matches!(self, Self::All)
    }
}

/// Replacement series and scope handed to the repair writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairPlan {
    pub source: GreyscaleSource,
    pub series: MeasurementSeries,
    pub scope: RepairScope,
}

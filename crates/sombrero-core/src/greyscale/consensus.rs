use crate::domain::{ConsensusResult, MeasurementSeries, SombreroError};

pub use crate::domain::HIGH_DISPERSION_THRESHOLD;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("at least one greyscale series is required")]
    Empty,
    #[error("greyscale series {index} has {found} values, expected {expected}")]
    LengthMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

impl From<ConsensusError> for SombreroError {
    fn from(error: ConsensusError) -> Self {
        SombreroError::input_validation("INPUT.GREYSCALE_SERIES_SHAPE", error.to_string())
    }
}

fn ensure_uniform_length(series: &[MeasurementSeries]) -> Result<usize, ConsensusError> {
    let expected = series.first().ok_or(ConsensusError::Empty)?.len();
    match series
        .iter()
        .enumerate()
        .find(|(_, candidate)| candidate.len() != expected)
    {
        Some((index, candidate)) => Err(ConsensusError::LengthMismatch {
            index,
            expected,
            found: candidate.len(),
        }),
        None => Ok(expected),
    }
}

/// Per-patch mean of all series, together with the aggregate standard
/// deviation `sqrt(sum_i var_i / len)` where `var_i` is the population
/// variance of patch `i` across series.
pub fn average(series: &[MeasurementSeries]) -> Result<ConsensusResult, ConsensusError> {
    let len = ensure_uniform_length(series)?;
    let count = series.len() as f64;

    let mut means = Vec::with_capacity(len);
    let mut variance_sum = 0.0;
    for patch in 0..len {
        let mean = series.iter().map(|s| s.values()[patch]).sum::<f64>() / count;
        variance_sum += series
            .iter()
            .map(|s| (s.values()[patch] - mean).powi(2))
            .sum::<f64>()
            / count;
        means.push(mean);
    }

    let dispersion = if len == 0 {
        0.0
    } else {
        (variance_sum / len as f64).sqrt()
    };

    Ok(ConsensusResult {
        series: MeasurementSeries::new(means),
        dispersion,
    })
}

pub fn delta(
    series: &MeasurementSeries,
    reference: &MeasurementSeries,
) -> Result<MeasurementSeries, ConsensusError> {
    if series.len() != reference.len() {
        return Err(ConsensusError::LengthMismatch {
            index: 0,
            expected: reference.len(),
            found: series.len(),
        });
    }

    Ok(MeasurementSeries::new(
        series
            .iter()
            .zip(reference.iter())
            .map(|(value, reference)| value - reference)
            .collect(),
    ))
}

//! Numeric series behind the three greyscale plots: raw values, deltas to
//! the average and deltas to the fixture. Drawing them is left to the caller.

use super::consensus::delta;
use crate::domain::{ConsensusResult, GreyscaleSource, MeasurementSeries};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawPanel {
    pub series: Vec<MeasurementSeries>,
    pub average: Option<MeasurementSeries>,
    pub fixture: Option<MeasurementSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaPanel {
    pub reference: GreyscaleSource,
    /// Each compilation series minus the reference.
    pub series: Vec<MeasurementSeries>,
    /// The other source minus the reference, when available.
    pub counterpart: Option<MeasurementSeries>,
    pub baseline: MeasurementSeries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreyscalePanels {
    pub raw: RawPanel,
    pub dispersion: Option<f64>,
    pub delta_to_average: Option<DeltaPanel>,
    pub delta_to_fixture: Option<DeltaPanel>,
}

impl GreyscalePanels {
    pub fn build(
        series: Option<&[MeasurementSeries]>,
        consensus: Option<&ConsensusResult>,
        fixture: Option<&MeasurementSeries>,
    ) -> Self {
        let average = consensus.map(|consensus| &consensus.series);

        let delta_to_average = match (series, average) {
            (Some(series), Some(average)) => delta_panel(
                GreyscaleSource::Average,
                series,
                average,
                fixture,
            ),
            _ => None,
        };
        let delta_to_fixture = fixture.and_then(|fixture| {
            delta_panel(
                GreyscaleSource::Fixture,
                series.unwrap_or_default(),
                fixture,
                average,
            )
        });

        Self {
            raw: RawPanel {
                series: series.map(<[_]>::to_vec).unwrap_or_default(),
                average: average.cloned(),
                fixture: fixture.cloned(),
            },
            dispersion: consensus.map(|consensus| consensus.dispersion),
            delta_to_average,
            delta_to_fixture,
        }
    }
}

/// `None` when a compilation series disagrees in length with the reference;
/// a mismatched counterpart is only left out.
fn delta_panel(
    reference_source: GreyscaleSource,
    series: &[MeasurementSeries],
    reference: &MeasurementSeries,
    counterpart: Option<&MeasurementSeries>,
) -> Option<DeltaPanel> {
    let series = series
        .iter()
        .map(|candidate| delta(candidate, reference).ok())
        .collect::<Option<Vec<_>>>()?;
    let counterpart = counterpart.and_then(|other| delta(other, reference).ok());

    Some(DeltaPanel {
        reference: reference_source,
        series,
        counterpart,
        baseline: MeasurementSeries::zeros(reference.len()),
    })
}

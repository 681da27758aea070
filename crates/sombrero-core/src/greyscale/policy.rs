use crate::domain::{
    ConsensusResult, GreyscaleSource, MeasurementSeries, RepairPlan, RepairScope, SombreroError,
    SombreroResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePreferences {
    pub average: bool,
    pub fixture: bool,
    pub interactive: bool,
}

impl SourcePreferences {
    pub const fn any_enabled(self) -> bool {
        self.average || self.fixture || self.interactive
    }

    pub const fn wants_average(self) -> bool {
        self.average || self.interactive
    }

    pub const fn wants_fixture(self) -> bool {
        self.fixture || self.interactive
    }
}

/// Replacement series that could be read or computed for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceCandidates {
    pub series: Option<Vec<MeasurementSeries>>,
    pub consensus: Option<ConsensusResult>,
    pub fixture: Option<MeasurementSeries>,
}

impl SourceCandidates {
    pub fn series_for(&self, source: GreyscaleSource) -> Option<&MeasurementSeries> {
        match source {
            GreyscaleSource::Average => self.consensus.as_ref().map(|consensus| &consensus.series),
            GreyscaleSource::Fixture => self.fixture.as_ref(),
        }
    }

    pub fn available(&self) -> Vec<GreyscaleSource> {
        [GreyscaleSource::Average, GreyscaleSource::Fixture]
            .into_iter()
            .filter(|source| self.series_for(*source).is_some())
            .collect()
    }

    pub fn is_high_dispersion(&self) -> bool {
        self.consensus
            .as_ref()
            .is_some_and(ConsensusResult::is_high_dispersion)
    }
}

/// Default offered to the operator: the average unless the known series
/// disagree, then the fixture. Falls back to whichever one exists.
pub fn suggest_source(candidates: &SourceCandidates) -> Option<GreyscaleSource> {
    let average = candidates.consensus.is_some();
    let fixture = candidates.fixture.is_some();
    if average && !candidates.is_high_dispersion() {
        Some(GreyscaleSource::Average)
    } else if fixture {
        Some(GreyscaleSource::Fixture)
    } else if average {
        Some(GreyscaleSource::Average)
    } else {
        None
    }
}

/// Average before fixture, each only when the operator enabled it.
pub fn resolve_non_interactive(
    preferences: SourcePreferences,
    candidates: &SourceCandidates,
) -> Option<GreyscaleSource> {
    if preferences.average && candidates.consensus.is_some() {
        Some(GreyscaleSource::Average)
    } else if preferences.fixture && candidates.fixture.is_some() {
        Some(GreyscaleSource::Fixture)
    } else {
        None
    }
}

/// Replace-all default offered interactively: only when the series disagree.
pub fn default_replace_all(candidates: &SourceCandidates) -> bool {
    candidates.is_high_dispersion()
}

pub fn needs_repair(scope: RepairScope, has_missing: bool) -> bool {
    has_missing || scope.replaces_present()
}

pub fn plan_for_source(
    candidates: &SourceCandidates,
    source: GreyscaleSource,
    scope: RepairScope,
) -> SombreroResult<RepairPlan> {
    let series = candidates.series_for(source).cloned().ok_or_else(|| {
        SombreroError::unresolvable_source(
            "SOURCE.UNAVAILABLE",
            format!("no {source} greyscale values available to fill in missing values"),
        )
    })?;

    Ok(RepairPlan {
        source,
        series,
        scope,
    })
}

//! One `interpolate` run: check preconditions, gather the candidate
//! replacement series, settle the repair scope and source, then repair.
//!
//! Operator input is only ever requested through [`OperatorPrompt`]; warnings
//! are returned as [`RunNotice`] values for the caller to report.

use super::consensus::average;
use super::detect::content_has_missing;
use super::filesystem::RepairFileSystem;
use super::format::{first_series, format_error, read_series};
use super::policy::{
    SourceCandidates, SourcePreferences, default_replace_all, needs_repair, plan_for_source,
    resolve_non_interactive, suggest_source,
};
use super::repair::{RepairReport, replace};
use crate::domain::{
    GreyscaleSource, MeasurementSeries, RepairPlan, RepairScope, SombreroError, SombreroResult,
};
use crate::project::ProjectLayout;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait OperatorPrompt {
    fn confirm_replace_all(&mut self, default: bool) -> bool;

    /// `choices` is never empty and always contains `suggested`.
    fn choose_source(
        &mut self,
        candidates: &SourceCandidates,
        choices: &[GreyscaleSource],
        suggested: GreyscaleSource,
    ) -> GreyscaleSource;
}

/// Accepts every default without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptDefaults;

impl OperatorPrompt for AcceptDefaults {
    fn confirm_replace_all(&mut self, default: bool) -> bool {
        default
    }

    fn choose_source(
        &mut self,
        _candidates: &SourceCandidates,
        _choices: &[GreyscaleSource],
        suggested: GreyscaleSource,
    ) -> GreyscaleSource {
        suggested
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpolateRequest {
    pub preferences: SourcePreferences,
    /// `None` leaves the choice to the operator in interactive runs.
    pub replace_all: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunNotice {
    NoCompilationSeries { compilation: PathBuf },
    AverageComputed { series_count: usize, dispersion: f64 },
    HighDispersion { dispersion: f64 },
    FixtureMissing { fixture_config: PathBuf },
    FixtureEmpty { fixture_config: PathBuf },
    FixtureRead { fixture_config: PathBuf },
    FixtureLengthMismatch { fixture_len: usize, average_len: usize },
}

impl RunNotice {
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::AverageComputed { .. } | Self::FixtureRead { .. })
    }
}

impl Display for RunNotice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCompilationSeries { compilation } => write!(
                f,
                "no greyscale values found in compilation '{}'",
                compilation.display()
            ),
            Self::AverageComputed {
                series_count,
                dispersion,
            } => write!(
                f,
                "average greyscale values generated from {series_count} series (dispersion {dispersion:.2})"
            ),
            Self::HighDispersion { dispersion } => write!(
                f,
                "high standard deviation ({dispersion:.2}) in compilation greyscale values"
            ),
            Self::FixtureMissing { fixture_config } => write!(
                f,
                "no fixture config file found at '{}'; continuing without it",
                fixture_config.display()
            ),
            Self::FixtureEmpty { fixture_config } => write!(
                f,
                "no greyscale values found in fixture config '{}'",
                fixture_config.display()
            ),
            Self::FixtureRead { fixture_config } => write!(
                f,
                "greyscale values read from fixture config '{}'",
                fixture_config.display()
            ),
            Self::FixtureLengthMismatch {
                fixture_len,
                average_len,
            } => write!(
                f,
                "fixture holds {fixture_len} greyscale values but the compilation series hold {average_len}"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterpolateOutcome {
    NothingToDo,
    Repaired {
        plan: RepairPlan,
        report: RepairReport,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterpolateReport {
    pub outcome: InterpolateOutcome,
    pub notices: Vec<RunNotice>,
}

pub fn check_preconditions(
    fs: &dyn RepairFileSystem,
    layout: &ProjectLayout,
    preferences: SourcePreferences,
) -> SombreroResult<()> {
    if !preferences.any_enabled() {
        return Err(SombreroError::input_validation(
            "INPUT.NO_SOURCE_ENABLED",
            "at least one of average, fixture or interactive must be enabled",
        ));
    }
    if !fs.exists(&layout.compilation) {
        return Err(SombreroError::not_found(
            "NOT_FOUND.COMPILATION",
            format!(
                "no compilation file found at '{}'",
                layout.compilation.display()
            ),
        ));
    }
    if fs.exists(&layout.backup) {
        return Err(SombreroError::precondition_conflict(
            "PRECONDITION.BACKUP_EXISTS",
            format!(
                "restore or remove backup '{}' before proceeding",
                layout.backup.display()
            ),
        ));
    }
    Ok(())
}

pub fn interpolate(
    fs: &dyn RepairFileSystem,
    layout: &ProjectLayout,
    request: InterpolateRequest,
    operator: &mut dyn OperatorPrompt,
) -> SombreroResult<InterpolateReport> {
    let preferences = request.preferences;
    check_preconditions(fs, layout, preferences)?;

    let mut notices = Vec::new();
    let compilation_content = read_project_file(fs, &layout.compilation, "compilation")?;
    let mut candidates = SourceCandidates::default();

    if preferences.wants_average() {
        match read_series(&compilation_content)
            .map_err(|error| format_error(&layout.compilation, error))?
        {
            None => notices.push(RunNotice::NoCompilationSeries {
                compilation: layout.compilation.clone(),
            }),
            Some(series) => {
                let consensus = average(&series)?;
                notices.push(RunNotice::AverageComputed {
                    series_count: series.len(),
                    dispersion: consensus.dispersion,
                });
                if consensus.is_high_dispersion() {
                    notices.push(RunNotice::HighDispersion {
                        dispersion: consensus.dispersion,
                    });
                }
                candidates.series = Some(series);
                candidates.consensus = Some(consensus);
            }
        }
    }

    let replace_all = match request.replace_all {
        Some(explicit) => explicit,
        None if preferences.interactive && candidates.series.is_some() => {
            operator.confirm_replace_all(default_replace_all(&candidates))
        }
        None => false,
    };
    let scope = RepairScope::from_replace_all(replace_all);

    if !needs_repair(scope, content_has_missing(&compilation_content)) {
        debug!(compilation = %layout.compilation.display(), "no missing greyscale values");
        return Ok(InterpolateReport {
            outcome: InterpolateOutcome::NothingToDo,
            notices,
        });
    }

    if preferences.wants_fixture() {
        candidates.fixture = read_fixture(fs, layout, &mut notices)?;
        if let (Some(fixture), Some(consensus)) = (&candidates.fixture, &candidates.consensus) {
            if fixture.len() != consensus.series.len() {
                notices.push(RunNotice::FixtureLengthMismatch {
                    fixture_len: fixture.len(),
                    average_len: consensus.series.len(),
                });
            }
        }
    }

    let source = if preferences.interactive {
        let choices = candidates.available();
        let suggested = suggest_source(&candidates).ok_or_else(no_source_error)?;
        let chosen = operator.choose_source(&candidates, &choices, suggested);
        if !choices.contains(&chosen) {
            return Err(SombreroError::unresolvable_source(
                "SOURCE.UNAVAILABLE",
                format!("chosen source '{chosen}' has no greyscale values"),
            ));
        }
        chosen
    } else {
        resolve_non_interactive(preferences, &candidates).ok_or_else(no_source_error)?
    };

    let plan = plan_for_source(&candidates, source, scope)?;
    debug!(source = %plan.source, scope = ?plan.scope, "resolved repair plan");
    let report = replace(
        fs,
        &layout.compilation,
        &layout.backup,
        &plan.series,
        plan.scope,
    )?;

    Ok(InterpolateReport {
        outcome: InterpolateOutcome::Repaired { plan, report },
        notices,
    })
}

fn read_fixture(
    fs: &dyn RepairFileSystem,
    layout: &ProjectLayout,
    notices: &mut Vec<RunNotice>,
) -> SombreroResult<Option<MeasurementSeries>> {
    let fixture_config = &layout.fixture_config;
    if !fs.exists(fixture_config) {
        notices.push(RunNotice::FixtureMissing {
            fixture_config: fixture_config.clone(),
        });
        return Ok(None);
    }

    let content = read_project_file(fs, fixture_config, "fixture config")?;
    let fixture = first_series(&content).map_err(|error| format_error(fixture_config, error))?;
    notices.push(match &fixture {
        Some(_) => RunNotice::FixtureRead {
            fixture_config: fixture_config.clone(),
        },
        None => RunNotice::FixtureEmpty {
            fixture_config: fixture_config.clone(),
        },
    });
    Ok(fixture)
}

fn read_project_file(
    fs: &dyn RepairFileSystem,
    path: &Path,
    artifact: &str,
) -> SombreroResult<String> {
    fs.read_to_string(path).map_err(|source| {
        SombreroError::io_system(
            "IO.GREYSCALE_SOURCE_READ",
            format!("failed to read {} '{}': {}", artifact, path.display(), source),
        )
    })
}

fn no_source_error() -> SombreroError {
    SombreroError::unresolvable_source(
        "SOURCE.UNRESOLVED",
        "no greyscale values available to fill in missing values",
    )
}

#[cfg(test)]
mod tests {
    use super::{
        AcceptDefaults, InterpolateOutcome, InterpolateRequest, OperatorPrompt, RunNotice,
        interpolate,
    };
    use crate::domain::{GreyscaleSource, RepairScope, SombreroErrorCategory};
    use crate::greyscale::filesystem::StdFileSystem;
    use crate::greyscale::policy::{SourceCandidates, SourcePreferences};
    use crate::project::ProjectLayout;
    use std::fs;
    use tempfile::TempDir;

    struct ScriptedOperator {
        replace_all: Option<bool>,
        source: Option<GreyscaleSource>,
        asked_replace_all_default: Option<bool>,
        offered: Vec<GreyscaleSource>,
        suggested: Option<GreyscaleSource>,
    }

    impl ScriptedOperator {
        fn new(replace_all: Option<bool>, source: Option<GreyscaleSource>) -> Self {
            Self {
                replace_all,
                source,
                asked_replace_all_default: None,
                offered: Vec::new(),
                suggested: None,
            }
        }
    }

    impl OperatorPrompt for ScriptedOperator {
        fn confirm_replace_all(&mut self, default: bool) -> bool {
            self.asked_replace_all_default = Some(default);
            self.replace_all.unwrap_or(default)
        }

        fn choose_source(
            &mut self,
            _candidates: &SourceCandidates,
            choices: &[GreyscaleSource],
            suggested: GreyscaleSource,
        ) -> GreyscaleSource {
            self.offered = choices.to_vec();
            self.suggested = Some(suggested);
            self.source.unwrap_or(suggested)
        }
    }

    fn project(compilation: &str, fixture: Option<&str>) -> (TempDir, ProjectLayout) {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = temp.path().join("plate");
        fs::create_dir(&dir).expect("project dir should be created");
        let layout = ProjectLayout::for_project_dir(&dir).expect("layout");
        fs::write(&layout.compilation, compilation).expect("compilation should be written");
        if let Some(fixture) = fixture {
            fs::write(&layout.fixture_config, fixture).expect("fixture should be written");
        }
        (temp, layout)
    }

    fn request(average: bool, fixture: bool, interactive: bool) -> InterpolateRequest {
        InterpolateRequest {
            preferences: SourcePreferences {
                average,
                fixture,
                interactive,
            },
            replace_all: None,
        }
    }

    #[test]
    fn disabled_sources_are_rejected() {
        let (_temp, layout) = project("values\n", None);
        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(false, false, false),
            &mut AcceptDefaults,
        )
        .expect_err("no sources");
        assert_eq!(error.category(), SombreroErrorCategory::InputValidationError);
    }

    #[test]
    fn missing_compilation_is_not_found() {
        let (_temp, layout) = project("values\n", None);
        fs::remove_file(&layout.compilation).expect("compilation should be removed");

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(true, true, false),
            &mut AcceptDefaults,
        )
        .expect_err("no compilation");
        assert_eq!(error.category(), SombreroErrorCategory::NotFoundError);
    }

    #[test]
    fn existing_backup_blocks_the_run() {
        let (_temp, layout) = project("values = S'1.0'\nvalues\n", None);
        fs::write(&layout.backup, "previous").expect("backup should be written");

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(true, true, false),
            &mut AcceptDefaults,
        )
        .expect_err("backup exists");
        assert_eq!(error.category(), SombreroErrorCategory::PreconditionConflict);
        assert_eq!(fs::read_to_string(&layout.backup).expect("backup"), "previous");
    }

    #[test]
    fn fixture_fills_in_when_no_series_are_present() {
        let compilation = "scan 1\nvalues\nscan 2\nvalues\n";
        let (_temp, layout) = project(compilation, Some("values = S'15.0, 15.0, 35.0'\n"));

        let report = interpolate(
            &StdFileSystem,
            &layout,
            request(true, true, false),
            &mut AcceptDefaults,
        )
        .expect("repair should succeed");

        let InterpolateOutcome::Repaired { plan, report: repair } = report.outcome else {
            panic!("expected a repair");
        };
        assert_eq!(plan.source, GreyscaleSource::Fixture);
        assert_eq!(repair.replaced_missing, 2);
        assert!(report.notices.contains(&RunNotice::NoCompilationSeries {
            compilation: layout.compilation.clone()
        }));
        assert_eq!(
            fs::read_to_string(&layout.compilation).expect("compilation"),
            "scan 1\nvalues = S'15.0, 15.0, 35.0'\nscan 2\nvalues = S'15.0, 15.0, 35.0'\n"
        );
        assert_eq!(
            fs::read_to_string(&layout.backup).expect("backup"),
            compilation
        );
    }

    #[test]
    fn no_available_source_fails_without_touching_files() {
        let compilation = "values\n";
        let (_temp, layout) = project(compilation, None);

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(true, true, false),
            &mut AcceptDefaults,
        )
        .expect_err("nothing to fill with");

        assert_eq!(error.category(), SombreroErrorCategory::UnresolvableSource);
        assert!(!layout.backup.exists());
        assert_eq!(
            fs::read_to_string(&layout.compilation).expect("compilation"),
            compilation
        );
    }

    #[test]
    fn average_only_run_ignores_available_fixture() {
        let (_temp, layout) = project("values\n", Some("values = S'1.0'\n"));

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(true, false, false),
            &mut AcceptDefaults,
        )
        .expect_err("average is unavailable and fixture is disabled");
        assert_eq!(error.category(), SombreroErrorCategory::UnresolvableSource);
    }

    #[test]
    fn interactive_run_asks_for_scope_and_source() {
        let compilation = "values = S'0.0, 0.0'\nvalues = S'10.0, 10.0'\n";
        let (_temp, layout) = project(compilation, Some("values = S'4.0, 6.0'\n"));
        let mut operator = ScriptedOperator::new(None, None);

        let report = interpolate(
            &StdFileSystem,
            &layout,
            request(false, false, true),
            &mut operator,
        )
        .expect("repair should succeed");

        assert_eq!(operator.asked_replace_all_default, Some(true));
        assert_eq!(
            operator.offered,
            vec![GreyscaleSource::Average, GreyscaleSource::Fixture]
        );
        assert_eq!(operator.suggested, Some(GreyscaleSource::Fixture));
        assert!(
            report
                .notices
                .iter()
                .any(|notice| matches!(notice, RunNotice::HighDispersion { .. }))
        );

        let InterpolateOutcome::Repaired { plan, .. } = report.outcome else {
            panic!("expected a repair");
        };
        assert_eq!(plan.source, GreyscaleSource::Fixture);
        assert_eq!(plan.scope, RepairScope::All);
        assert_eq!(
            fs::read_to_string(&layout.compilation).expect("compilation"),
            "values = S'4.0, 6.0'\nvalues = S'4.0, 6.0'\n"
        );
    }

    #[test]
    fn explicit_replace_all_skips_the_scope_prompt() {
        let compilation = "values = S'1.0'\nvalues = S'3.0'\n";
        let (_temp, layout) = project(compilation, None);
        let mut operator = ScriptedOperator::new(Some(false), Some(GreyscaleSource::Average));

        let report = interpolate(
            &StdFileSystem,
            &layout,
            InterpolateRequest {
                replace_all: Some(true),
                ..request(false, false, true)
            },
            &mut operator,
        )
        .expect("repair should succeed");

        assert_eq!(operator.asked_replace_all_default, None);
        assert_eq!(operator.offered, vec![GreyscaleSource::Average]);
        assert!(matches!(report.outcome, InterpolateOutcome::Repaired { .. }));
        assert_eq!(
            fs::read_to_string(&layout.compilation).expect("compilation"),
            "values = S'2.0'\nvalues = S'2.0'\n"
        );
    }

    #[test]
    fn interactive_choice_of_absent_source_is_unresolvable() {
        let (_temp, layout) = project("values = S'1.0'\nvalues\n", None);
        let mut operator = ScriptedOperator::new(Some(false), Some(GreyscaleSource::Fixture));

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(false, false, true),
            &mut operator,
        )
        .expect_err("fixture is unavailable");
        assert_eq!(error.category(), SombreroErrorCategory::UnresolvableSource);
        assert!(!layout.backup.exists());
    }

    #[test]
    fn ragged_compilation_series_are_rejected() {
        let (_temp, layout) = project("values = S'1.0, 2.0'\nvalues = S'1.0'\nvalues\n", None);

        let error = interpolate(
            &StdFileSystem,
            &layout,
            request(true, false, false),
            &mut AcceptDefaults,
        )
        .expect_err("ragged input");
        assert_eq!(error.code(), "INPUT.GREYSCALE_SERIES_SHAPE");
    }

    #[test]
    fn mismatched_fixture_length_is_reported() {
        let (_temp, layout) = project(
            "values = S'1.0, 2.0'\nvalues\n",
            Some("values = S'1.0, 2.0, 3.0'\n"),
        );

        let report = interpolate(
            &StdFileSystem,
            &layout,
            request(true, true, false),
            &mut AcceptDefaults,
        )
        .expect("average still repairs");
        assert!(report.notices.contains(&RunNotice::FixtureLengthMismatch {
            fixture_len: 3,
            average_len: 2
        }));
    }
}

use super::CliError;
use anyhow::Context;
use serde::Serialize;
use sombrero_core::domain::{GreyscaleSource, MeasurementSeries, SombreroError};
use sombrero_core::greyscale::format::{VALUES_PREFIX, encode_series};
use sombrero_core::greyscale::{
    GreyscalePanels, OperatorPrompt, RunNotice, SourceCandidates, average,
    read_series_from_compilation, read_series_from_fixture,
};
use sombrero_core::project::{ProjectLayout, ProjectLayoutConfig, load_project_layout_config};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

pub(super) fn resolve_layout(
    project_dir: &Path,
    layout_config: Option<&Path>,
) -> Result<ProjectLayout, CliError> {
    let config = match layout_config {
        Some(path) => load_project_layout_config(path).map_err(SombreroError::from)?,
        None => ProjectLayoutConfig::default(),
    };
    Ok(ProjectLayout::with_config(project_dir, &config)?)
}

pub(super) fn log_notice(notice: &RunNotice) {
    if notice.is_warning() {
        warn!("{notice}");
    } else {
        info!("{notice}");
    }
}

/// Panels for the compilation and fixture as they are on disk. The compilation
/// must hold at least one series; a missing fixture config only drops the
/// fixture panels.
pub(super) fn collect_panels(layout: &ProjectLayout) -> Result<GreyscalePanels, CliError> {
    let series = read_series_from_compilation(&layout.compilation)?.ok_or_else(|| {
        SombreroError::not_found(
            "NOT_FOUND.COMPILATION_SERIES",
            format!(
                "no greyscale values found in compilation '{}'",
                layout.compilation.display()
            ),
        )
    })?;
    let consensus = average(&series).map_err(SombreroError::from)?;

    let fixture = if layout.fixture_config.exists() {
        read_series_from_fixture(&layout.fixture_config)?
    } else {
        log_notice(&RunNotice::FixtureMissing {
            fixture_config: layout.fixture_config.clone(),
        });
        None
    };

    Ok(GreyscalePanels::build(
        Some(series.as_slice()),
        Some(&consensus),
        fixture.as_ref(),
    ))
}

pub(super) fn render_json<T: Serialize>(value: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    Ok(rendered.context("failed to serialize greyscale panels")?)
}

/// Line-based prompts on any reader/writer pair. End of input or an IO
/// failure accepts the offered default.
pub(super) struct TerminalOperator<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalOperator<R, W> {
    pub(super) fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Option<String> {
        write!(self.output, "{prompt}").ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_ascii_lowercase()),
        }
    }

    fn say(&mut self, message: &str) {
        let _ = writeln!(self.output, "{message}");
    }

    fn describe(&mut self, candidates: &SourceCandidates) {
        if let Some(series) = &candidates.series {
            self.say(&format!("Compilation holds {} greyscale series:", series.len()));
            for known in series {
                self.say(&format!("  {}", render_series(known)));
            }
        }
        if let Some(consensus) = &candidates.consensus {
            self.say(&format!(
                "average: {} (dispersion {:.2})",
                render_series(&consensus.series),
                consensus.dispersion
            ));
        }
        if let Some(fixture) = &candidates.fixture {
            self.say(&format!("fixture: {}", render_series(fixture)));
        }
    }
}

impl<R: BufRead, W: Write> OperatorPrompt for TerminalOperator<R, W> {
    fn confirm_replace_all(&mut self, default: bool) -> bool {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let Some(answer) = self.ask(&format!(
                "Replace all greyscale values, not only missing ones? [{hint}]: "
            )) else {
                return default;
            };
            match answer.as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.say("Please answer y or n."),
            }
        }
    }

    fn choose_source(
        &mut self,
        candidates: &SourceCandidates,
        choices: &[GreyscaleSource],
        suggested: GreyscaleSource,
    ) -> GreyscaleSource {
        self.describe(candidates);
        let listed = choices
            .iter()
            .map(|choice| choice.as_str())
            .collect::<Vec<_>>()
            .join("/");

        loop {
            let Some(answer) = self.ask(&format!(
                "Greyscale source [{listed}] (default: {suggested}): "
            )) else {
                return suggested;
            };
            if answer.is_empty() {
                return suggested;
            }
            match GreyscaleSource::parse(&answer) {
                Some(source) if choices.contains(&source) => return source,
                _ => self.say(&format!("Please choose one of: {listed}.")),
            }
        }
    }
}

fn render_series(series: &MeasurementSeries) -> String {
    encode_series(series)
        .strip_prefix(VALUES_PREFIX)
        .map(str::to_string)
        .unwrap_or_default()
}

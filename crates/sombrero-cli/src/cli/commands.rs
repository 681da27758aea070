use super::CliError;
use super::helpers::{TerminalOperator, collect_panels, log_notice, render_json};
use sombrero_core::greyscale::{
    AcceptDefaults, InterpolateOutcome, InterpolateRequest, OperatorPrompt, SourcePreferences,
    StdFileSystem, interpolate, restore,
};
use sombrero_core::project::ProjectLayout;
use std::io;
use tracing::{info, warn};

#[derive(clap::Args, Debug, Default)]
pub(super) struct InterpolateArgs {
    /// Fill from the average of the compilation series (default)
    #[arg(long, overrides_with = "no_average")]
    average: bool,

    /// Never fill from the compilation average
    #[arg(long = "no-average", overrides_with = "average")]
    no_average: bool,

    /// Fill from the fixture config values (default)
    #[arg(long, overrides_with = "no_fixture")]
    fixture: bool,

    /// Never fill from the fixture config
    #[arg(long = "no-fixture", overrides_with = "fixture")]
    no_fixture: bool,

    /// Ask which source to use and whether to replace every series
    #[arg(long, overrides_with = "no_interactive")]
    interactive: bool,

    /// Decide without asking (default)
    #[arg(long = "no-interactive", overrides_with = "interactive")]
    no_interactive: bool,

    /// Replace every series, not only the missing ones
    #[arg(long, overrides_with = "replace_missing")]
    replace_all: bool,

    /// Replace only missing series
    #[arg(long, overrides_with = "replace_all")]
    replace_missing: bool,
}

impl InterpolateArgs {
    pub(super) fn request(&self) -> InterpolateRequest {
        let replace_all = if self.replace_all {
            Some(true)
        } else if self.replace_missing {
            Some(false)
        } else {
            None
        };

        InterpolateRequest {
            preferences: SourcePreferences {
                average: !self.no_average,
                fixture: !self.no_fixture,
                interactive: self.interactive && !self.no_interactive,
            },
            replace_all,
        }
    }
}

#[derive(clap::Args, Debug, Default)]
pub(super) struct VisualizeArgs {
    /// Single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

pub(super) fn run_interpolate_command(
    layout: &ProjectLayout,
    args: InterpolateArgs,
) -> Result<i32, CliError> {
    let request = args.request();
    let stdin = io::stdin();
    let mut terminal = TerminalOperator::new(stdin.lock(), io::stdout());
    let mut defaults = AcceptDefaults;
    let operator: &mut dyn OperatorPrompt = if request.preferences.interactive {
        &mut terminal
    } else {
        &mut defaults
    };

    let report = interpolate(&StdFileSystem, layout, request, operator)?;
    for notice in &report.notices {
        log_notice(notice);
    }

    match report.outcome {
        InterpolateOutcome::NothingToDo => {
            println!(
                "No missing greyscale values in '{}'; nothing to do.",
                layout.compilation.display()
            );
        }
        InterpolateOutcome::Repaired { plan, report } => {
            info!(
                source = %plan.source,
                replaced_missing = report.replaced_missing,
                replaced_present = report.replaced_present,
                "compilation repaired"
            );
            println!(
                "Replaced {} missing and {} present greyscale series in '{}' using {} values.",
                report.replaced_missing,
                report.replaced_present,
                report.compilation.display(),
                plan.source
            );
            println!("Original kept at '{}'.", report.backup.display());
        }
    }
    Ok(0)
}

pub(super) fn run_restore_command(layout: &ProjectLayout) -> Result<i32, CliError> {
    let report = restore(&StdFileSystem, &layout.compilation, &layout.backup)
        .map_err(sombrero_core::SombreroError::from)?;

    println!(
        "Restored '{}' from backup ({} bytes).",
        report.compilation.display(),
        report.bytes_restored
    );
    if let Some(error) = &report.cleanup_error {
        warn!(
            backup = %report.backup.display(),
            "backup could not be removed after restore: {error}"
        );
    }
    Ok(0)
}

pub(super) fn run_visualize_command(
    layout: &ProjectLayout,
    args: VisualizeArgs,
) -> Result<i32, CliError> {
    let panels = collect_panels(layout)?;
    println!("{}", render_json(&panels, args.compact)?);
    Ok(0)
}

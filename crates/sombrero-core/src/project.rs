//! Paths of the files a project directory holds.
//!
//! A project directory `<dir>` keeps its compilation at
//! `<dir>/<dir name>.project.compilation.original`, the fixture config at
//! `<dir>/fixture.config`, and the pre-repair backup next to the compilation.

use crate::domain::{SombreroError, SombreroResult};
use crate::greyscale::repair::TEMP_SUFFIX;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const COMPILATION_SUFFIX: &str = ".project.compilation.original";
pub const FIXTURE_CONFIG_NAME: &str = "fixture.config";
pub const BACKUP_SUFFIX: &str = ".backup_before_greyscale_fix";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectLayoutConfig {
    #[serde(rename = "compilationSuffix")]
    pub compilation_suffix: String,
    #[serde(rename = "fixtureConfigName")]
    pub fixture_config_name: String,
    #[serde(rename = "backupSuffix")]
    pub backup_suffix: String,
}

impl Default for ProjectLayoutConfig {
    fn default() -> Self {
        Self {
            compilation_suffix: COMPILATION_SUFFIX.to_string(),
            fixture_config_name: FIXTURE_CONFIG_NAME.to_string(),
            backup_suffix: BACKUP_SUFFIX.to_string(),
        }
    }
}

impl ProjectLayoutConfig {
    fn validate(&self) -> SombreroResult<()> {
        if self.backup_suffix.is_empty() {
            return Err(SombreroError::input_validation(
                "INPUT.LAYOUT_BACKUP_SUFFIX",
                "backup suffix must not be empty; the backup would overwrite the compilation",
            ));
        }
        if self.backup_suffix == TEMP_SUFFIX {
            return Err(SombreroError::input_validation(
                "INPUT.LAYOUT_BACKUP_SUFFIX",
                format!("backup suffix must differ from the staging suffix '{TEMP_SUFFIX}'"),
            ));
        }
        if self.fixture_config_name.is_empty()
            || self.fixture_config_name.contains(['/', '\\'])
        {
            return Err(SombreroError::input_validation(
                "INPUT.LAYOUT_FIXTURE_NAME",
                format!(
                    "fixture config name '{}' must be a plain file name",
                    self.fixture_config_name
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectLayoutConfigError {
    #[error("failed to read project layout config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse project layout config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ProjectLayoutConfigError> for SombreroError {
    fn from(error: ProjectLayoutConfigError) -> Self {
        match &error {
            ProjectLayoutConfigError::Read { .. } => {
                SombreroError::io_system("IO.LAYOUT_CONFIG_READ", error.to_string())
            }
            ProjectLayoutConfigError::Parse { .. } => {
                SombreroError::input_validation("INPUT.LAYOUT_CONFIG_PARSE", error.to_string())
            }
        }
    }
}

pub fn load_project_layout_config(
    config_path: impl AsRef<Path>,
) -> Result<ProjectLayoutConfig, ProjectLayoutConfigError> {
    let config_path = config_path.as_ref();
    let source =
        fs::read_to_string(config_path).map_err(|source| ProjectLayoutConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&source).map_err(|source| ProjectLayoutConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project_dir: PathBuf,
    pub compilation: PathBuf,
    pub fixture_config: PathBuf,
    pub backup: PathBuf,
}

impl ProjectLayout {
    pub fn for_project_dir(project_dir: impl Into<PathBuf>) -> SombreroResult<Self> {
        Self::with_config(project_dir, &ProjectLayoutConfig::default())
    }

    pub fn with_config(
        project_dir: impl Into<PathBuf>,
        config: &ProjectLayoutConfig,
    ) -> SombreroResult<Self> {
        config.validate()?;
        let project_dir = project_dir.into();
        let project_name = project_name(&project_dir)?;

        let mut compilation_name = project_name;
        compilation_name.push(&config.compilation_suffix);
        let compilation = project_dir.join(compilation_name);

        let mut backup_name = compilation
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        backup_name.push(&config.backup_suffix);
        let backup = compilation.with_file_name(backup_name);

        Ok(Self {
            fixture_config: project_dir.join(&config.fixture_config_name),
            compilation,
            backup,
            project_dir,
        })
    }
}

/// Directory name, resolving `.`-style paths through the filesystem.
fn project_name(project_dir: &Path) -> SombreroResult<OsString> {
    if let Some(name) = project_dir.file_name() {
        return Ok(name.to_os_string());
    }

    fs::canonicalize(project_dir)
        .ok()
        .and_then(|resolved| resolved.file_name().map(OsString::from))
        .ok_or_else(|| {
            SombreroError::input_validation(
                "INPUT.PROJECT_DIR",
                format!(
                    "cannot derive a project name from '{}'",
                    project_dir.display()
                ),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::{
        ProjectLayout, ProjectLayoutConfig, ProjectLayoutConfigError,
        load_project_layout_config,
    };
    use crate::domain::SombreroErrorCategory;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn default_layout_follows_project_naming() {
        let layout = ProjectLayout::for_project_dir("/scans/plate_07").expect("layout");

        assert_eq!(
            layout.compilation,
            PathBuf::from("/scans/plate_07/plate_07.project.compilation.original")
        );
        assert_eq!(
            layout.fixture_config,
            PathBuf::from("/scans/plate_07/fixture.config")
        );
        assert_eq!(
            layout.backup,
            PathBuf::from(
                "/scans/plate_07/plate_07.project.compilation.original.backup_before_greyscale_fix"
            )
        );
    }

    #[test]
    fn current_directory_resolves_to_its_name() {
        let temp = TempDir::new().expect("tempdir should be created");
        let project = temp.path().join("run_a");
        fs::create_dir(&project).expect("project dir should be created");

        let layout = ProjectLayout::for_project_dir(project.join(".")).expect("layout");
        assert!(
            layout
                .compilation
                .ends_with("run_a.project.compilation.original")
        );
    }

    #[test]
    fn config_overrides_file_names() {
        let config = ProjectLayoutConfig {
            compilation_suffix: ".compilation".to_string(),
            fixture_config_name: "rig.config".to_string(),
            backup_suffix: ".bak".to_string(),
        };
        let layout = ProjectLayout::with_config("/p/x", &config).expect("layout");

        assert_eq!(layout.compilation, PathBuf::from("/p/x/x.compilation"));
        assert_eq!(layout.fixture_config, PathBuf::from("/p/x/rig.config"));
        assert_eq!(layout.backup, PathBuf::from("/p/x/x.compilation.bak"));
    }

    #[test]
    fn empty_backup_suffix_is_rejected() {
        let config = ProjectLayoutConfig {
            backup_suffix: String::new(),
            ..ProjectLayoutConfig::default()
        };
        let error = ProjectLayout::with_config("/p/x", &config).expect_err("invalid config");
        assert_eq!(error.category(), SombreroErrorCategory::InputValidationError);
        assert_eq!(error.code(), "INPUT.LAYOUT_BACKUP_SUFFIX");
    }

    #[test]
    fn staging_suffix_is_rejected_as_backup_suffix() {
        let config = ProjectLayoutConfig {
            backup_suffix: ".tmp".to_string(),
            ..ProjectLayoutConfig::default()
        };
        let error = ProjectLayout::with_config("/p/x", &config).expect_err("invalid config");
        assert_eq!(error.code(), "INPUT.LAYOUT_BACKUP_SUFFIX");
        assert!(error.message().contains(".tmp"));
    }

    #[test]
    fn layout_config_loads_partial_json_with_defaults() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("layout.json");
        fs::write(&path, r#"{ "backupSuffix": ".pre_fix" }"#).expect("config should be written");

        let config = load_project_layout_config(&path).expect("config should load");
        assert_eq!(config.backup_suffix, ".pre_fix");
        assert_eq!(config.fixture_config_name, "fixture.config");
    }

    #[test]
    fn layout_config_errors_keep_their_source() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("layout.json");

        assert!(matches!(
            load_project_layout_config(&path),
            Err(ProjectLayoutConfigError::Read { .. })
        ));

        fs::write(&path, "{ not json").expect("config should be written");
        let error = load_project_layout_config(&path).expect_err("parse should fail");
        assert!(matches!(error, ProjectLayoutConfigError::Parse { .. }));
        assert_eq!(
            crate::domain::SombreroError::from(error).category(),
            SombreroErrorCategory::InputValidationError
        );
    }
}

//! Project configuration loading.
//!
//! A project is identified by the config file governing it: `lsbridge.toml`,
//! discovered by walking up from a document's directory. Engine options and
//! the declared file list come from that file. A handful of options are
//! forced after parsing so the engine never emits output or rejects the
//! generated markup, whatever the user configured.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File name searched for during project discovery.
pub const CONFIG_FILE_NAME: &str = "lsbridge.toml";

/// Engine options, merged from user configuration and forced values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineOptions {
    /// Enable the engine's strict checking mode.
    pub strict: bool,
    /// Language level the engine should assume, engine-defined.
    pub target: Option<String>,
    /// Ambient libraries the engine should load, engine-defined.
    pub libs: Vec<String>,
    /// Suppress all engine output generation.
    pub no_emit: bool,
    /// Produce declaration output.
    pub declarations: bool,
    /// Keep markup constructs intact in the engine's view.
    pub preserve_markup: bool,
    /// Skip checking of ambient library files.
    pub skip_library_checks: bool,
}

impl EngineOptions {
    /// Apply the forced options over whatever the user configured.
    ///
    /// The engine must never attempt to write files or strip the generated
    /// markup, so these always win.
    pub fn with_forced(mut self) -> Self {
        self.no_emit = true;
        self.declarations = false;
        self.preserve_markup = true;
        self.skip_library_checks = true;
        self
    }
}

/// Resolved project configuration: options plus the declared file list.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
    pub options: EngineOptions,
    /// Declared project files, resolved against the config file's directory.
    pub file_names: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Locates and parses project configuration.
///
/// Parse failures are reported, not handled, here; the engine registry
/// degrades them to default options so a usable engine always comes back.
pub trait ConfigLoader: Send + Sync {
    /// Search `dir` and its ancestors for a config file.
    fn find_config(&self, dir: &Path) -> Option<PathBuf>;

    /// Parse the config file at `path`.
    fn parse_config(&self, path: &Path) -> Result<ProjectConfig, ConfigError>;
}

/// On-disk layout of `lsbridge.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    engine: EngineOptions,
    project: ProjectSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectSection {
    files: Vec<String>,
}

/// Default loader: `lsbridge.toml` discovered up the directory tree.
#[derive(Debug, Default)]
pub struct TomlConfigLoader;

impl ConfigLoader for TomlConfigLoader {
    fn find_config(&self, dir: &Path) -> Option<PathBuf> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }

    fn parse_config(&self, path: &Path) -> Result<ProjectConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let parsed: ConfigFile = toml::from_str(&content)?;

        // Declared files are relative to the config file's directory.
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let file_names = parsed
            .project
            .files
            .into_iter()
            .map(|f| base.join(f).to_string_lossy().into_owned())
            .collect();

        Ok(ProjectConfig {
            options: parsed.engine,
            file_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_options_override_user_configuration() {
        let user: EngineOptions = toml::from_str(
            r#"
            strict = true
            no-emit = false
            declarations = true
            skip-library-checks = false
            "#,
        )
        .unwrap();

        let merged = user.with_forced();
        assert!(merged.strict); // user choice survives
        assert!(merged.no_emit);
        assert!(!merged.declarations);
        assert!(merged.preserve_markup);
        assert!(merged.skip_library_checks);
    }

    #[test]
    fn parses_engine_and_project_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
            [engine]
            strict = true
            target = "es2020"

            [project]
            files = ["lib/util.gen"]
            "#,
        )
        .unwrap();

        let config = TomlConfigLoader.parse_config(&path).unwrap();
        assert!(config.options.strict);
        assert_eq!(config.options.target.as_deref(), Some("es2020"));
        assert_eq!(config.file_names.len(), 1);
        assert!(config.file_names[0].ends_with("lib/util.gen"));
    }

    #[test]
    fn find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "").unwrap();
        let nested = dir.path().join("src/deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = TomlConfigLoader.find_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn find_config_misses_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TomlConfigLoader.find_config(dir.path()).is_none());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not [valid toml").unwrap();
        assert!(TomlConfigLoader.parse_config(&path).is_err());
    }
}

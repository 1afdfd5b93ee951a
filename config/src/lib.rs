//! Configuration loading and parsing for Verity.
//!
//! The file lives at `~/.verity/config.toml` unless `VERITY_CONFIG` points
//! elsewhere. Every section is optional; a missing file means defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use verity_feedback::{DocumentMatcher, FeedbackOptions, RunSummary, StyleSheet};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "VERITY_CONFIG";

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct VerityConfig {
    pub feedback: Option<FeedbackConfig>,
    pub style: Option<StyleConfig>,
    pub summary: Option<SummaryConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackConfig {
    /// Parent of per-run directories. `${VAR}` references are expanded.
    pub root: Option<String>,
    #[serde(default = "default_true")]
    pub delete_processed: bool,
    /// Unset means platform default (insensitive on Windows and macOS).
    pub case_insensitive_paths: Option<bool>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            root: None,
            delete_processed: true,
            case_insensitive_paths: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StyleConfig {
    pub icon_dir: Option<String>,
    pub icon_size: Option<String>,
    pub coverage_background: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub success: Option<String>,
    pub failure: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            success: None,
            failure: None,
        }
    }
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl VerityConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                tracing::warn!("Failed to read config at {}: {err}", path.display());
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match Self::parse(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {}: {err}", path.display());
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Resolve into the options a run lifecycle is built from.
    #[must_use]
    pub fn into_options(self) -> FeedbackOptions {
        let mut options = FeedbackOptions::default();

        let feedback = self.feedback.unwrap_or_default();
        if let Some(root) = feedback.root {
            options.root = PathBuf::from(expand_env_vars(&root));
        }
        options.delete_processed = feedback.delete_processed;
        if let Some(insensitive) = feedback.case_insensitive_paths {
            options.matcher = DocumentMatcher::new(insensitive);
        }

        let style = self.style.unwrap_or_default();
        let mut styles = StyleSheet::default();
        if let Some(dir) = style.icon_dir {
            styles = styles.with_icon_dir(expand_env_vars(&dir));
        }
        if let Some(size) = style.icon_size {
            styles = styles.with_icon_size(size);
        }
        if let Some(color) = style.coverage_background {
            styles = styles.with_coverage_background(color);
        }
        options.styles = styles;

        let summary = self.summary.unwrap_or_default();
        options.summary = summary.enabled.then(|| {
            let defaults = RunSummary::default();
            RunSummary {
                success: summary.success.unwrap_or(defaults.success),
                failure: summary.failure.unwrap_or(defaults.failure),
            }
        });

        options
    }
}

/// `VERITY_CONFIG` when set and non-empty, else `~/.verity/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".verity").join("config.toml"))
}

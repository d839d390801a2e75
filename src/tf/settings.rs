//! Layered settings
//!
//! `defaults/tfbuilder.default.toml` is embedded so that documentation and
//! runtime behaviour stay in sync. Callers layer user files and `key=value`
//! overrides on top via [`Loader`], then resolve the language preset with
//! [`Settings::language_config`].

use crate::tf::language::{LanguageConfig, LanguageOverrides};
use crate::tf::normalizing::RulesError;
use crate::tf::tabular::HeaderPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../../defaults/tfbuilder.default.toml");

#[derive(Debug)]
pub enum SettingsError {
    Config(ConfigError),
    UnknownLanguage(String),
    Rules(RulesError),
    InvalidOverride(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Config(err) => write!(f, "configuration error: {}", err),
            SettingsError::UnknownLanguage(name) => write!(f, "unknown language: {}", name),
            SettingsError::Rules(err) => write!(f, "{}", err),
            SettingsError::InvalidOverride(text) => {
                write!(f, "invalid override {:?}, expected key=value", text)
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Config(err) => Some(err),
            SettingsError::Rules(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SettingsError {
    fn from(err: ConfigError) -> Self {
        SettingsError::Config(err)
    }
}

impl From<RulesError> for SettingsError {
    fn from(err: RulesError) -> Self {
        SettingsError::Rules(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderSetting {
    Present,
    Absent,
    Detect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TabularSettings {
    pub header: HeaderSetting,
    /// Empty to sniff.
    pub delimiter: String,
    pub columns: Vec<String>,
}

impl TabularSettings {
    pub fn header_policy(&self) -> HeaderPolicy {
        match self.header {
            HeaderSetting::Present => HeaderPolicy::Present,
            HeaderSetting::Absent => HeaderPolicy::Absent(self.columns.clone()),
            HeaderSetting::Detect => HeaderPolicy::Detect,
        }
    }

    pub fn delimiter(&self) -> Option<char> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ if self.delimiter == "\\t" => Some('\t'),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub language: String,
    pub ignore_empty: bool,
    pub supply_accents: bool,
    pub lemma_table: Option<PathBuf>,
    pub jobs: usize,
    pub document_level: String,
    pub slot_type: String,
    pub tabular: TabularSettings,
    #[serde(default)]
    pub overrides: LanguageOverrides,
}

impl Settings {
    pub fn language_config(&self) -> Result<LanguageConfig, SettingsError> {
        let mut config = LanguageConfig::named(&self.language)?
            .ok_or_else(|| SettingsError::UnknownLanguage(self.language.clone()))?
            .with_overrides(self.overrides.clone());
        config.supply_accents = self.supply_accents;
        config.document_level = self.document_level.clone();
        config.slot_type = self.slot_type.clone();
        Ok(config)
    }
}

/// Layers user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a settings file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional settings file, ignored if absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, SettingsError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Applies a `key=value` override as given on the command line.
    pub fn set_assignment(self, assignment: &str) -> Result<Self, SettingsError> {
        let (key, value) = assignment
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .ok_or_else(|| SettingsError::InvalidOverride(assignment.to_string()))?;
        self.set_override(key.trim(), value.trim())
    }

    pub fn build(self) -> Result<Settings, SettingsError> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<Settings, SettingsError> {
    Loader::new().build()
}

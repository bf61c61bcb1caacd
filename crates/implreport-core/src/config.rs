//! Report configuration.
//!
//! Every field has a default matching the CSS Writing Modes Level 3 report
//! generated from a Blink checkout, so an empty (or absent) config file is
//! valid. `IMPLREPORT_HOME_ENGINE` overrides the home engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::{ReportError, Result};
use crate::domain::record::EngineAlias;
use crate::reporter::is_reserved_engine_name;

/// Environment variable overriding [`ReportConfig::home_engine`].
pub const HOME_ENGINE_ENV: &str = "IMPLREPORT_HOME_ENGINE";

/// Configuration for one report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Engine whose regression suite is imported.
    pub home_engine: String,

    /// Only expectation paths under this prefix concern the suite.
    pub suite_prefix: String,

    /// Directory names never descended into during discovery.
    pub skip_dirs: Vec<String>,

    /// Submission sources ranked as trusted; everyone else is anonymous.
    pub trusted_sources: Vec<String>,

    /// Engine identity folding for submissions.
    pub engine_alias: EngineAlias,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            home_engine: "blink".to_string(),
            suite_prefix: "imported/csswg-test/css-writing-modes-3/".to_string(),
            skip_dirs: vec!["support".to_string()],
            trusted_sources: Vec::new(),
            engine_alias: EngineAlias::default(),
        }
    }
}

impl ReportConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: ReportConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise defaults; then apply the
    /// environment override.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        if let Ok(engine) = std::env::var(HOME_ENGINE_ENV) {
            config.home_engine = engine;
            config.validate()?;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.home_engine.trim().is_empty() {
            return Err(ReportError::Config("home_engine must not be empty".into()));
        }
        if self.home_engine != self.home_engine.to_ascii_lowercase() {
            return Err(ReportError::Config(format!(
                "home_engine must be lower-case, got {:?}",
                self.home_engine
            )));
        }
        if is_reserved_engine_name(&self.home_engine) {
            return Err(ReportError::Config(format!(
                "home_engine {:?} is reserved in the JSON snapshot",
                self.home_engine
            )));
        }
        Ok(())
    }

    pub fn is_trusted(&self, source: &str) -> bool {
        let source = source.trim();
        self.trusted_sources
            .iter()
            .any(|trusted| trusted.eq_ignore_ascii_case(source))
    }
}

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::condition::LeniencySettings;
use crate::partition::PlannerKind;
use crate::power::Power;

/// How players declare compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Power,
    /// Discrete tiers; only identical tiers match.
    Bracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub mode: MatchMode,
    pub planner: PlannerKind,
    pub leniency: LeniencySettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn effective_leniency(&self) -> LeniencySettings {
        match self.mode {
            MatchMode::Power => self.leniency,
            MatchMode::Bracket => LeniencySettings { allow_leniency: false, ..self.leniency },
        }
    }

    pub fn plan(&self, head_count: usize) -> Vec<usize> {
        self.planner.plan(head_count)
    }

    /// Layer command-line flags over a loaded file.
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(tolerance) = overrides.leniency {
            self.leniency = if tolerance > Power::ZERO {
                LeniencySettings::lenient(tolerance)
            } else {
                LeniencySettings::strict()
            };
        }
        if overrides.super_leniency {
            self.leniency.allow_super_leniency = true;
        }
        if overrides.bracket {
            self.mode = MatchMode::Bracket;
        }
        if overrides.avoid_large_pods {
            self.planner = PlannerKind::AvoidLargePods;
        }
        self.leniency.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub leniency: Option<Power>,
    pub super_leniency: bool,
    pub bracket: bool,
    pub avoid_large_pods: bool,
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        config.leniency.validate()?;
        Ok(config)
    }
}

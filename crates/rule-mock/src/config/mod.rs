//! Configuration for a standalone rule mock server.
//!
//! A config file describes where to listen, the fallback response and the
//! rules in priority order. YAML and JSON are both accepted; the format is
//! picked from the file extension.

mod listen;
mod rules;

use crate::error::RuleError;
use crate::rule::RuleSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use listen::ListenConfig;
pub use rules::{HeaderMatch, ResponseConfig, RuleConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Dispatch every path instead of only `/`
    #[serde(default)]
    pub catch_all: bool,

    /// Fallback when no rule matches (default: 404 "Simon says Not Match")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_response: Option<ResponseConfig>,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            _ => serde_yaml::from_str(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.listen.validate()?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.apply(&RuleSet::new())
                .map_err(|e| anyhow::anyhow!("Invalid rule {}: {}", index, e))?;
        }
        if let Some(ref response) = self.default_response {
            response
                .to_action()
                .map_err(|e| anyhow::anyhow!("Invalid default_response: {}", e))?;
        }
        Ok(())
    }

    /// Compile the rules and fallback into a fresh [`RuleSet`].
    pub fn build_rule_set(&self) -> Result<RuleSet, RuleError> {
        let rule_set = RuleSet::new();
        for rule in &self.rules {
            rule.apply(&rule_set)?;
        }
        if let Some(ref response) = self.default_response {
            rule_set.set_default_action(response.to_action()?);
        }
        Ok(rule_set)
    }
}

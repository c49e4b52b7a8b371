//! Pipeline configuration
//!
//! Every fixed name set the passes consult lives here, built once and
//! handed to each stage by reference. Defaults reproduce the SV-COMP style
//! preparation; a JSON file can override any field.

use crate::oracle;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Pipeline stage, in the order the driver normally runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Report calls the verifier cannot model
    CheckUnsupported,
    /// Remove calls to undefined, untrusted functions
    DeleteUndefined,
    /// Strip oracle bodies, zero-initialize globals, publish the entry table
    Prepare,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 3] = [Stage::CheckUnsupported, Stage::DeleteUndefined, Stage::Prepare];

    /// Stage name as used on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CheckUnsupported => "check-unsupported",
            Stage::DeleteUndefined => "delete-undefined",
            Stage::Prepare => "prepare",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown stage '{}'", s)))
    }
}

/// What to do when the entry table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryTablePolicy {
    /// Leave the existing table untouched and report it
    #[default]
    Keep,
    /// Abort the run
    Reject,
}

/// Preparation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    /// Callees the verifier cannot model (reported, never removed by the check)
    pub unsupported_calls: Vec<String>,
    /// Any callee starting with this prefix is a verifier primitive
    pub oracle_prefix: String,
    /// Exact callee names whose undefined calls are kept
    pub leave_calls: Vec<String>,
    /// Oracle definitions whose bodies are stripped
    pub strip_bodies: Vec<String>,
    /// Function seeded into the entry table
    pub entry_function: String,
    /// Reserved name of the entry table global
    pub entry_table: String,
    /// Handling of a pre-existing entry table
    pub entry_table_policy: EntryTablePolicy,
    /// Stages to run, in order
    pub stages: Vec<Stage>,
    /// Verify the module before any stage runs
    pub verify_input: bool,
    /// Verify the module after the last stage
    pub verify_output: bool,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            unsupported_calls: vec!["pthread_create".to_string()],
            oracle_prefix: oracle::VERIFIER_PREFIX.to_string(),
            leave_calls: oracle::default_leave_set(),
            strip_bodies: oracle::default_strip_set(),
            entry_function: "main".to_string(),
            entry_table: "__ai_init_functions".to_string(),
            entry_table_policy: EntryTablePolicy::Keep,
            stages: Stage::ALL.to_vec(),
            verify_input: true,
            verify_output: true,
        }
    }
}

impl PrepareConfig {
    /// Decode a configuration from JSON; missing fields keep their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no stage can run with
    pub fn validate(&self) -> Result<()> {
        if self.stages.contains(&Stage::Prepare) {
            if self.entry_function.is_empty() {
                return Err(Error::config("entry_function must not be empty"));
            }
            if self.entry_table.is_empty() {
                return Err(Error::config("entry_table must not be empty"));
            }
        }
        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage) {
                return Err(Error::config(format!("stage '{}' listed twice", stage)));
            }
        }
        Ok(())
    }

    /// Stage is enabled
    pub fn runs(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}

/// Exact-match name set
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    names: HashSet<String>,
}

impl NameSet {
    /// Builds the set from configured names
    pub fn new<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self {
            names: names.into_iter().cloned().collect(),
        }
    }

    /// Case-sensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Callees that are trusted to exist at verification time
#[derive(Debug, Clone)]
pub struct AllowList {
    prefix: String,
    exact: NameSet,
}

impl AllowList {
    /// Built from the oracle prefix and the leave set
    pub fn from_config(config: &PrepareConfig) -> Self {
        Self {
            prefix: config.oracle_prefix.clone(),
            exact: NameSet::new(&config.leave_calls),
        }
    }

    /// Verifier primitive or well-understood library function
    pub fn allows(&self, name: &str) -> bool {
        (!self.prefix.is_empty() && name.starts_with(&self.prefix)) || self.exact.contains(name)
    }
}

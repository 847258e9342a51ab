//! Rule model
//!
//! A rule is an (operation, action, magnitude) triple. `RuleRow` is the
//! loosely typed shape a store hands back; `Rule` is the validated entry the
//! registry holds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};

/// Longest operation or action name a store accepts, in bytes
pub const MAX_NAME_LEN: usize = 100;

/// The fault a rule injects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Abort the operation and its transaction; session and process survive
    Fail,
    /// Take the whole process down
    Crash,
    /// Sleep `magnitude` seconds, then let the operation run
    Delay,
    /// End the session without completing the operation
    Terminate,
}

impl Action {
    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Fail => "fail",
            Action::Crash => "crash",
            Action::Delay => "delay",
            Action::Terminate => "terminate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = StoreError;

    /// Case-insensitive; the legacy names error/panic/wait/fatal are aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" | "error" => Ok(Action::Fail),
            "crash" | "panic" => Ok(Action::Crash),
            "delay" | "wait" => Ok(Action::Delay),
            "terminate" | "fatal" => Ok(Action::Terminate),
            _ => Err(StoreError::InvalidAction(s.to_string())),
        }
    }
}

/// A rule as persisted by a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRow {
    pub operation: String,
    pub action: String,
    #[serde(default)]
    pub magnitude: u32,
}

impl RuleRow {
    pub fn new(operation: impl Into<String>, action: impl Into<String>, magnitude: u32) -> Self {
        Self {
            operation: operation.into(),
            action: action.into(),
            magnitude,
        }
    }

    /// Whether two rows share the natural key
    pub fn same_operation(&self, other: &str) -> bool {
        self.operation.eq_ignore_ascii_case(other)
    }
}

/// A validated registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    operation: String,
    action: Action,
    magnitude: u32,
}

impl Rule {
    /// Build a rule, validating the operation name
    pub fn new(operation: impl Into<String>, action: Action, magnitude: u32) -> StoreResult<Self> {
        let operation = operation.into();
        validate_name("operation", &operation)?;
        Ok(Self {
            operation: operation.trim().to_string(),
            action,
            magnitude,
        })
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    /// Case-insensitive tag match
    pub fn matches(&self, tag: &str) -> bool {
        self.operation.eq_ignore_ascii_case(tag.trim())
    }

    /// The row a store persists for this rule
    pub fn to_row(&self) -> RuleRow {
        RuleRow::new(self.operation.clone(), self.action.as_str(), self.magnitude)
    }
}

impl TryFrom<&RuleRow> for Rule {
    type Error = StoreError;

    fn try_from(row: &RuleRow) -> Result<Self, Self::Error> {
        validate_name("action", &row.action)?;
        let action = row.action.parse()?;
        Rule::new(row.operation.clone(), action, row.magnitude)
    }
}

fn validate_name(field: &'static str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidRule {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if value.len() > MAX_NAME_LEN {
        return Err(StoreError::InvalidRule {
            field,
            reason: format!("longer than {} bytes", MAX_NAME_LEN),
        });
    }
    Ok(())
}

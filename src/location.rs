//! Location tags and the matcher that decides which record fields get counted.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::TokengateError;

/// Logical name of a text-bearing field within a record, plus the `Any` wildcard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Any,
    Instruction,
    Input,
    Output,
    Content,
    Text,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Any => "any",
            Location::Instruction => "instruction",
            Location::Input => "input",
            Location::Output => "output",
            Location::Content => "content",
            Location::Text => "text",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = TokengateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Location::Any),
            "instruction" => Ok(Location::Instruction),
            "input" => Ok(Location::Input),
            "output" => Ok(Location::Output),
            "content" => Ok(Location::Content),
            "text" => Ok(Location::Text),
            other => Err(TokengateError::Config(format!(
                "invalid location: {}",
                other
            ))),
        }
    }
}

/// Normalized set of configured locations, built once at initialization.
///
/// The configuration surface accepts a single tag or a collection of tags;
/// both collapse into this set so use sites never special-case scalars.
#[derive(Debug, Clone)]
pub struct LocationSpec {
    set: HashSet<Location>,
}

impl LocationSpec {
    pub fn new(tags: impl IntoIterator<Item = Location>) -> Result<Self, TokengateError> {
        let set: HashSet<Location> = tags.into_iter().collect();
        if set.is_empty() {
            return Err(TokengateError::Config(
                "at least one location must be configured".to_string(),
            ));
        }
        Ok(Self { set })
    }

    /// `Any` in the configured set matches every candidate; otherwise the
    /// candidate must be an exact member.
    pub fn matches(&self, candidate: Location) -> bool {
        self.set.contains(&Location::Any) || self.set.contains(&candidate)
    }
}

impl Default for LocationSpec {
    fn default() -> Self {
        Self {
            set: HashSet::from([Location::Any]),
        }
    }
}

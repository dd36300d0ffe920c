// ABOUTME: Organization names as they appear in rokka API paths.
// ABOUTME: Only rejects names that cannot stand as a single URL path segment.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrganizationError {
    #[error("organization name cannot be empty")]
    Empty,

    #[error("'{0}' is not an organization name")]
    DotSegment(String),

    #[error("invalid character in organization name: {0:?}")]
    InvalidChar(char),
}

/// The API decides which organizations exist. Locally a name only has to
/// survive being placed between two slashes of a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Organization(String);

impl Organization {
    pub fn new(value: &str) -> Result<Self, OrganizationError> {
        if value.is_empty() {
            return Err(OrganizationError::Empty);
        }
        if value == "." || value == ".." {
            return Err(OrganizationError::DotSegment(value.to_string()));
        }
        if let Some(c) = value
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | '?' | '#'))
        {
            return Err(OrganizationError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Organization {
    type Err = OrganizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Organization {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Organization {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}

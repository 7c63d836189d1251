use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RbsError, Result};

/// A selectable choice, identified by restaurant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arm(String);

impl Arm {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arm {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Arm {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Arm {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build an arm list from names, preserving order.
pub fn arms<I, S>(names: I) -> Vec<Arm>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Arm::new).collect()
}

/// Reject empty, blank or duplicated arm sets.
pub fn validate_arms(arms: &[Arm]) -> Result<()> {
    if arms.is_empty() {
        return Err(RbsError::InvalidArms("arm list cannot be empty".to_string()));
    }
    let mut seen = HashSet::with_capacity(arms.len());
    for arm in arms {
        if arm.as_str().trim().is_empty() {
            return Err(RbsError::InvalidArms("arm name cannot be blank".to_string()));
        }
        if !seen.insert(arm) {
            return Err(RbsError::InvalidArms(format!("duplicate arm '{arm}'")));
        }
    }
    Ok(())
}

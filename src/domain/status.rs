use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Governance verdict with severity ordering.
///
/// Statuses are ordered by severity from least to most severe.
/// When multiple rules trigger, the most severe status wins, which also
/// makes `Rejected` sticky: nothing can lower it once reached.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Status {
    /// Answer may be released
    #[default]
    Approved = 0,
    /// Answer is held for a human reviewer
    Pending = 1,
    /// Answer must not be released
    Rejected = 2,
}

impl Status {
    /// Returns the more severe of two statuses.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }

    /// Raise to `Pending` unless already more severe.
    #[inline]
    pub fn escalate(self) -> Self {
        self.max(Status::Pending)
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        *self == Status::Rejected
    }

    /// Returns the severity rank (0-2).
    #[inline]
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Approved => "approved",
            Status::Pending => "pending",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}', expected one of approved, pending, rejected")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Status::Approved),
            "pending" => Ok(Status::Pending),
            "rejected" => Ok(Status::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// How a tenant wants the verdict applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Verdict is applied as computed
    #[default]
    Enforce,
    /// Rejections are downgraded to pending
    Advisory,
}

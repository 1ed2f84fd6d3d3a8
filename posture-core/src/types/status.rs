use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating one rule against one resource or location.
///
/// `Unknown` is reserved for collection or query failures. A resource that was
/// evaluated and found non-compliant is always `Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultStatus {
    Ok,
    Warn,
    Fail,
    Unknown,
}

impl ResultStatus {
    pub const ALL: [ResultStatus; 4] = [
        ResultStatus::Ok,
        ResultStatus::Warn,
        ResultStatus::Fail,
        ResultStatus::Unknown,
    ];

    /// Stable numeric code used by downstream report consumers
    pub fn code(&self) -> u8 {
        match self {
            ResultStatus::Ok => 0,
            ResultStatus::Warn => 1,
            ResultStatus::Fail => 2,
            ResultStatus::Unknown => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Ok => write!(f, "OK"),
            ResultStatus::Warn => write!(f, "WARN"),
            ResultStatus::Fail => write!(f, "FAIL"),
            ResultStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, SystemTimeError};

/// A Unix timestamp in whole seconds.
///
/// Used when translating wall-clock deadlines into block heights: block
/// header times are compared against this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(pub u64);

impl UnixTimestamp {
    pub fn try_now() -> Result<Self, SystemTimeError> {
        let now = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH)?;
        Ok(Self(now.as_secs()))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl From<u64> for UnixTimestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

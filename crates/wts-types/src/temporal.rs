use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// File modification timestamp, split into seconds and nanoseconds since
/// the UNIX epoch.
///
/// The zero value means "unset": either the filesystem did not report a
/// time, or it reported the epoch itself.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModTime {
    /// Whole seconds since the UNIX epoch (negative before it).
    pub secs: i64,
    /// Sub-second part, `0..1_000_000_000`.
    pub nanos: u32,
}

impl ModTime {
    pub const fn new(secs: i64, nanos: u32) -> Self {
        Self { secs, nanos }
    }

    /// The unset timestamp.
    pub const fn zero() -> Self {
        Self { secs: 0, nanos: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                if d.subsec_nanos() == 0 {
                    Self::new(-(d.as_secs() as i64), 0)
                } else {
                    Self::new(-(d.as_secs() as i64) - 1, 1_000_000_000 - d.subsec_nanos())
                }
            }
        }
    }

    pub fn to_system_time(&self) -> SystemTime {
        if self.secs >= 0 {
            UNIX_EPOCH + Duration::new(self.secs as u64, self.nanos)
        } else {
            UNIX_EPOCH - Duration::from_secs(self.secs.unsigned_abs())
                + Duration::from_nanos(u64::from(self.nanos))
        }
    }

    /// Equality that tolerates one side having only whole-second precision.
    ///
    /// Seconds must agree. Nanoseconds are compared only when both sides
    /// carry them; a side with `nanos == 0` is treated as truncated. Any
    /// other difference is a mismatch.
    pub fn matches(&self, other: &ModTime) -> bool {
        if self.secs != other.secs {
            return false;
        }
        self.nanos == 0 || other.nanos == 0 || self.nanos == other.nanos
    }
}

impl From<SystemTime> for ModTime {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl fmt::Debug for ModTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModTime({}.{:09})", self.secs, self.nanos)
    }
}

impl fmt::Display for ModTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos)
    }
}

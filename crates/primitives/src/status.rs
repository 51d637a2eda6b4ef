use std::fmt;

use serde::{Deserialize, Serialize};

/// Health of a single status page component.
///
/// Serialized in the snake case form the Statuspage API uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusValue {
    /// Component is operational.
    Operational,
    /// Component is experiencing a major outage.
    MajorOutage,
}

impl StatusValue {
    /// Wire representation of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "operational",
            Self::MajorOutage => "major_outage",
        }
    }

    /// Returns `true` for [`StatusValue::Operational`].
    pub const fn is_operational(self) -> bool {
        matches!(self, Self::Operational)
    }

    /// Map a health body flag to a status. Only `"1"` counts as healthy.
    pub fn from_flag(flag: &str) -> Self {
        if flag == "1" { Self::Operational } else { Self::MajorOutage }
    }

    /// Parse a remote status string.
    ///
    /// Returns `None` for statuses this crate never produces (e.g. `degraded_performance`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "operational" => Some(Self::Operational),
            "major_outage" => Some(Self::MajorOutage),
            _ => None,
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_flag_is_operational() {
        assert_eq!(StatusValue::from_flag("1"), StatusValue::Operational);
        for flag in ["0", "", "true", "yes", "2", " 1"] {
            assert_eq!(StatusValue::from_flag(flag), StatusValue::MajorOutage, "flag {flag:?}");
        }
    }

    #[test]
    fn parse_rejects_unknown_remote_statuses() {
        assert_eq!(StatusValue::parse("operational"), Some(StatusValue::Operational));
        assert_eq!(StatusValue::parse("major_outage"), Some(StatusValue::MajorOutage));
        assert_eq!(StatusValue::parse("partial_outage"), None);
        assert_eq!(StatusValue::parse("under_maintenance"), None);
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&StatusValue::MajorOutage).unwrap(), r#""major_outage""#);
        let parsed: StatusValue = serde_json::from_str(r#""operational""#).unwrap();
        assert_eq!(parsed, StatusValue::Operational);
        assert_eq!(StatusValue::MajorOutage.to_string(), "major_outage");
    }
}

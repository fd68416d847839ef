//! Supported data warehouse platform kinds

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Closed set of supported warehouse platforms
///
/// DataWorks shares MaxCompute's connection semantics but stays a distinct
/// kind so its instances keep their own registry identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    MaxCompute,
    DataWorks,
    Hologres,
    MySql,
    PolarDb,
    Redshift,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 6] = [
        PlatformKind::MaxCompute,
        PlatformKind::DataWorks,
        PlatformKind::Hologres,
        PlatformKind::MySql,
        PlatformKind::PolarDb,
        PlatformKind::Redshift,
    ];

    /// Lowercase canonical name, used in instance keys and tool responses
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::MaxCompute => "maxcompute",
            PlatformKind::DataWorks => "dataworks",
            PlatformKind::Hologres => "hologres",
            PlatformKind::MySql => "mysql",
            PlatformKind::PolarDb => "polardb",
            PlatformKind::Redshift => "redshift",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = ();

    /// Case-insensitive; `HOLO` is accepted as a Hologres alias because the
    /// deployed env namespaces abbreviate it in key prefixes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maxcompute" => Ok(PlatformKind::MaxCompute),
            "dataworks" => Ok(PlatformKind::DataWorks),
            "hologres" | "holo" => Ok(PlatformKind::Hologres),
            "mysql" => Ok(PlatformKind::MySql),
            "polardb" => Ok(PlatformKind::PolarDb),
            "redshift" => Ok(PlatformKind::Redshift),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("MAXCOMPUTE".parse(), Ok(PlatformKind::MaxCompute));
        assert_eq!("MySQL".parse(), Ok(PlatformKind::MySql));
        assert_eq!("holo".parse(), Ok(PlatformKind::Hologres));
        assert_eq!("HOLOGRES".parse(), Ok(PlatformKind::Hologres));
        assert!("oracle".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in PlatformKind::ALL {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }
}

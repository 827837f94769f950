//! Platform tags
//!
//! Platform-conditional descriptor sections are keyed by an OS tag. The tag
//! is evaluated once when the pool is loaded, producing platform-resolved
//! descriptors; later stages never branch on the platform.

use std::fmt;
use std::str::FromStr;

/// Operating system tag used in descriptor `platform` conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux hosts
    Linux,
    /// macOS hosts
    MacOs,
}

impl Platform {
    /// The platform cellar is running on
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// The descriptor tag for this platform
    pub fn tag(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
        }
    }

    /// Whether an optional platform condition applies here.
    ///
    /// An absent condition matches every platform.
    pub fn matches(self, condition: Option<&str>) -> bool {
        condition.map_or(true, |tag| tag == self.tag())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Platform::Linux),
            "macos" => Ok(Platform::MacOs),
            other => Err(format!(
                "Unknown platform '{other}' (expected 'linux' or 'macos')"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconditional_matches_everywhere() {
        assert!(Platform::Linux.matches(None));
        assert!(Platform::MacOs.matches(None));
    }

    #[test]
    fn test_condition_matches_own_tag_only() {
        assert!(Platform::MacOs.matches(Some("macos")));
        assert!(!Platform::Linux.matches(Some("macos")));
        assert!(Platform::Linux.matches(Some("linux")));
    }

    #[test]
    fn test_from_str_roundtrip() {
        assert_eq!("linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("macos".parse::<Platform>().unwrap(), Platform::MacOs);
        assert!("windows".parse::<Platform>().is_err());
    }
}

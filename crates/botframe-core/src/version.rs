//! Version parsing, ordering and compatibility gating.
//!
//! Accepted form: `MAJOR.MINOR.PATCH`, optionally suffixed with `-alpha`,
//! `-beta` or `-rcN` (N >= 1). Anything else is a format error, including
//! forms that general semver would accept (`1.2.3-toto`, build metadata).
//!
//! Ordering: numeric triple first, then stage, where
//! `alpha < beta < rc1 < rc2 < ... < release`.

use std::fmt;
use std::str::FromStr;

use botframe_types::error::VersionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Release stage of a version. Variant order is the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Alpha,
    Beta,
    ReleaseCandidate(u32),
    Release,
}

/// A parsed version. Field order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub stage: Stage,
}

impl Version {
    /// A final release `major.minor.patch`.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            stage: Stage::Release,
        }
    }

    pub const fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn is_prerelease(&self) -> bool {
        self.stage != Stage::Release
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let format_error = |reason: String| VersionError::Format {
            input: input.to_string(),
            reason,
        };

        let (numbers, suffix) = match input.split_once('-') {
            Some((numbers, suffix)) => (numbers, Some(suffix)),
            None => (input, None),
        };

        let segments: Vec<&str> = numbers.split('.').collect();
        if segments.len() != 3 {
            return Err(format_error(format!(
                "expected 3 numeric segments, found {}",
                segments.len()
            )));
        }

        let mut triple = [0u32; 3];
        for (slot, segment) in triple.iter_mut().zip(&segments) {
            *slot = parse_number("segment", segment).map_err(format_error)?;
        }

        let stage = match suffix {
            None => Stage::Release,
            Some(tag) => parse_stage(tag).map_err(format_error)?,
        };

        Ok(Self {
            major: triple[0],
            minor: triple[1],
            patch: triple[2],
            stage,
        })
    }
}

/// Strict unsigned decimal: no sign, no whitespace, not empty, fits in `u32`.
fn parse_number(what: &str, segment: &str) -> Result<u32, String> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{what} '{segment}' is not numeric"));
    }
    segment
        .parse()
        .map_err(|_| format!("{what} '{segment}' is larger than {}", u32::MAX))
}

fn parse_stage(tag: &str) -> Result<Stage, String> {
    match tag {
        "alpha" => Ok(Stage::Alpha),
        "beta" => Ok(Stage::Beta),
        _ => {
            let Some(number) = tag.strip_prefix("rc") else {
                return Err(format!("unknown prerelease tag '{tag}'"));
            };
            if number.is_empty() {
                return Err("release candidate tag 'rc' requires a number".to_string());
            }
            match parse_number("release candidate number", number)? {
                0 => Err("release candidate number must be positive".to_string()),
                n => Ok(Stage::ReleaseCandidate(n)),
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.stage {
            Stage::Alpha => write!(f, "-alpha"),
            Stage::Beta => write!(f, "-beta"),
            Stage::ReleaseCandidate(n) => write!(f, "-rc{n}"),
            Stage::Release => Ok(()),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Version of the running framework.
pub fn framework_version() -> Result<Version, VersionError> {
    env!("CARGO_PKG_VERSION").parse()
}

/// Check `running` against optional inclusive bounds taken from plugin metadata.
///
/// Bounds are plain version strings; malformed bounds are format errors.
pub fn check_compatibility(
    running: &Version,
    min: Option<&str>,
    max: Option<&str>,
) -> Result<(), VersionError> {
    if let Some(min) = min {
        let min: Version = min.parse()?;
        if *running < min {
            return Err(VersionError::Incompatible {
                running: running.to_string(),
                constraint: format!("requires at least {min}"),
            });
        }
    }

    if let Some(max) = max {
        let max: Version = max.parse()?;
        if *running > max {
            return Err(VersionError::Incompatible {
                running: running.to_string(),
                constraint: format!("supports at most {max}"),
            });
        }
    }

    tracing::trace!(%running, ?min, ?max, "version compatible");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_ordering() {
        let pairs = [
            ("2.0.0", "2.0.1"),
            ("2.0.0", "2.1.0"),
            ("2.0.0", "3.0.0"),
            ("2.0.0-alpha", "2.0.0-beta"),
            ("2.0.0-beta", "2.0.0-rc1"),
            ("2.0.0-rc1", "2.0.0-rc2"),
            ("2.0.0-rc2", "2.0.0-rc3"),
            ("2.0.0-rc2", "2.0.0"),
            ("2.0.0-beta", "2.0.1"),
        ];
        for (lower, higher) in pairs {
            assert!(v(lower) < v(higher), "{lower} should sort before {higher}");
            assert!(v(higher) > v(lower), "{higher} should sort after {lower}");
        }
    }

    #[test]
    fn test_rc_orders_numerically() {
        assert!(v("1.0.0-rc2") < v("1.0.0-rc10"));
    }

    #[test]
    fn test_equal_inputs_compare_equal() {
        for s in ["0.0.0", "2.0.0-alpha", "2.0.0-rc7", "10.20.30"] {
            assert_eq!(v(s).cmp(&v(s)), std::cmp::Ordering::Equal);
        }
    }

    #[test]
    fn test_malformed_versions() {
        for bad in ["1.2.3.4", "1.2", "1.2.-beta", "1.2.3-toto", "1.2.3-rc"] {
            let err = bad.parse::<Version>().unwrap_err();
            assert!(
                matches!(err, VersionError::Format { ref input, .. } if input == bad),
                "expected format error for {bad}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_rejects_other_malformed_forms() {
        for bad in ["", "a.b.c", "1.2.3-rc0", "1.2.3-rcx", "+1.2.3", "1.2.3-beta-1", "1.2.3-"] {
            assert!(bad.parse::<Version>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_oversized_segment_is_reported_as_overflow() {
        let err = "99999999999.0.0".parse::<Version>().unwrap_err();
        let VersionError::Format { reason, .. } = err else {
            panic!("expected format error, got {err:?}");
        };
        assert!(reason.contains("larger than 4294967295"), "{reason}");
        assert!(!reason.contains("not numeric"), "{reason}");

        let err = "1.0.0-rc99999999999".parse::<Version>().unwrap_err();
        assert!(err.to_string().contains("larger than"), "{err}");
    }

    #[test]
    fn test_non_digit_segment_is_not_numeric() {
        let err = "1.x.0".parse::<Version>().unwrap_err();
        assert!(err.to_string().contains("'x' is not numeric"), "{err}");
    }

    #[test]
    fn test_display_roundtrip() {
        for s in ["1.2.3", "0.9.0-alpha", "4.0.0-beta", "2.0.0-rc12"] {
            assert_eq!(v(s).to_string(), s);
        }
    }

    #[test]
    fn test_is_prerelease() {
        assert!(v("1.0.0-beta").is_prerelease());
        assert!(!v("1.0.0").is_prerelease());
        assert_eq!(
            Version::new(1, 0, 0).with_stage(Stage::ReleaseCandidate(1)),
            v("1.0.0-rc1")
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("3.1.4-rc2")).unwrap();
        assert_eq!(json, "\"3.1.4-rc2\"");
        let parsed: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, v("3.1.4-rc2"));
        assert!(serde_json::from_str::<Version>("\"1.2\"").is_err());
    }

    #[test]
    fn test_framework_version_parses() {
        let version = framework_version().unwrap();
        assert_eq!(version.to_string(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_check_compatibility_within_bounds() {
        let running = v("2.1.0");
        assert!(check_compatibility(&running, Some("2.0.0"), Some("2.1.0")).is_ok());
        assert!(check_compatibility(&running, None, None).is_ok());
    }

    #[test]
    fn test_check_compatibility_too_old() {
        let err = check_compatibility(&v("2.0.0-rc1"), Some("2.0.0"), None).unwrap_err();
        match err {
            VersionError::Incompatible { running, constraint } => {
                assert_eq!(running, "2.0.0-rc1");
                assert!(constraint.contains("at least 2.0.0"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_check_compatibility_too_new() {
        let err = check_compatibility(&v("3.0.0"), None, Some("2.9.9")).unwrap_err();
        assert!(matches!(err, VersionError::Incompatible { .. }));
    }

    #[test]
    fn test_check_compatibility_malformed_bound() {
        let err = check_compatibility(&v("1.0.0"), Some("1.0"), None).unwrap_err();
        assert!(matches!(err, VersionError::Format { .. }));
    }
}

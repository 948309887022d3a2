//! Execution-environment description.
//!
//! The binder and the static-expression evaluator both need to know which
//! language version and platform the analyzed file targets; the host
//! analyzer threads one of these through per file.

use std::cmp::Ordering;
use std::fmt;

/// A target-language version as a (major, minor) pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PythonVersion {
    pub major: u8,
    pub minor: u8,
}

impl PythonVersion {
    pub const V3_0: PythonVersion = PythonVersion::new(3, 0);
    pub const V3_3: PythonVersion = PythonVersion::new(3, 3);
    pub const V3_7: PythonVersion = PythonVersion::new(3, 7);
    pub const V3_8: PythonVersion = PythonVersion::new(3, 8);
    pub const V3_9: PythonVersion = PythonVersion::new(3, 9);
    pub const V3_10: PythonVersion = PythonVersion::new(3, 10);
    pub const V3_11: PythonVersion = PythonVersion::new(3, 11);
    pub const V3_12: PythonVersion = PythonVersion::new(3, 12);

    /// The most recent stable version the analyzer understands.
    pub const LATEST: PythonVersion = PythonVersion::V3_12;

    #[inline]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Compare against a version-info tuple, the way `sys.version_info`
    /// comparisons behave at runtime: elementwise over the common prefix,
    /// then the longer tuple compares greater. Only major and minor are
    /// modeled here.
    pub fn compare_tuple(&self, parts: &[i64]) -> Ordering {
        let own = [i64::from(self.major), i64::from(self.minor)];
        for (a, b) in own.iter().zip(parts.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        own.len().cmp(&parts.len())
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Well-known platform identifiers, as reported by `sys.platform`.
pub struct PythonPlatform;

impl PythonPlatform {
    pub const LINUX: &'static str = "linux";
    pub const DARWIN: &'static str = "darwin";
    pub const WINDOWS: &'static str = "win32";
}

/// The environment a file is analyzed for: language version plus platform.
#[derive(Debug, Clone)]
pub struct ExecutionEnvironment {
    pub python_version: PythonVersion,
    pub python_platform: String,
}

impl ExecutionEnvironment {
    pub fn new(python_version: PythonVersion, python_platform: &str) -> Self {
        Self {
            python_version,
            python_platform: python_platform.to_string(),
        }
    }
}

impl Default for ExecutionEnvironment {
    fn default() -> Self {
        Self::new(PythonVersion::LATEST, PythonPlatform::LINUX)
    }
}

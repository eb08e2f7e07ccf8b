//! SDK version labels
//!
//! The toolkit reports SDK versions as semver strings ("31.0.0"), or as
//! "UNVERSIONED" for development builds of the runtime.

use semver::Version;

/// Human-readable label for an SDK version reported by the toolkit
///
/// ```
/// use ota_publisher::validation::sdk_version::sdk_label;
///
/// assert_eq!(sdk_label("31.0.0"), "SDK 31");
/// assert_eq!(sdk_label("31.1.0"), "SDK 31.1.0");
/// assert_eq!(sdk_label("UNVERSIONED"), "SDK UNVERSIONED");
/// ```
pub fn sdk_label(sdk_version: &str) -> String {
    match Version::parse(sdk_version.trim()) {
        Ok(v) if v.minor == 0 && v.patch == 0 && v.pre.is_empty() => {
            format!("SDK {}", v.major)
        }
        Ok(v) => format!("SDK {}", v),
        Err(_) => format!("SDK {}", sdk_version.trim()),
    }
}

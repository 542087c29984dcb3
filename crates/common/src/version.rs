use std::fmt;

use serde::Serialize;

/// Build metadata baked in by the binary's build script
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub build_features: &'static str,
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:   {}", self.version)?;
        writeln!(f, "profile:   {}", self.build_profile)?;
        writeln!(f, "features:  {}", self.build_features)?;
        writeln!(f, "built at:  {}", self.build_timestamp)?;
        writeln!(f, "rustc:     {}", self.rust_version)?;
        write!(f, "target:    {}", self.target)
    }
}

/// Collect [`BuildInfo`] from the calling crate's compile-time environment
///
/// A macro so the variables are read from the crate that invokes it, which
/// is the one whose build script sets them.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            build_profile: option_env!("BUILD_PROFILE").unwrap_or("unknown"),
            build_features: option_env!("BUILD_FEATURES").unwrap_or("none"),
            version: option_env!("REPO_VERSION").unwrap_or(env!("CARGO_PKG_VERSION")),
            build_timestamp: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
            rust_version: option_env!("RUST_VERSION").unwrap_or("unknown"),
            target: option_env!("BUILD_TARGET").unwrap_or("unknown"),
        }
    };
}

#[cfg(test)]
mod test {
    #[test]
    fn test_build_info_falls_back_to_package_version() {
        let info = crate::build_info!();
        assert!(!info.version.is_empty());
        assert!(info.to_string().contains("version:"));
    }
}

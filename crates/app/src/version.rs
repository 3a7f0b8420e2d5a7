use std::fmt;

/// Build metadata captured by `build.rs`
#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub package_version: &'static str,
    pub repo_version: &'static str,
    pub build_profile: &'static str,
    pub build_timestamp: &'static str,
    pub rust_version: &'static str,
    pub build_target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        package_version: env!("CARGO_PKG_VERSION"),
        repo_version: env!("REPO_VERSION"),
        build_profile: env!("BUILD_PROFILE"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        rust_version: env!("RUST_VERSION"),
        build_target: option_env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ledgerdoc {} ({}, {} build",
            self.package_version, self.repo_version, self.build_profile
        )?;
        if let Some(target) = self.build_target {
            write!(f, " for {}", target)?;
        }
        write!(f, ")\nbuilt {} with {}", self.build_timestamp, self.rust_version)
    }
}

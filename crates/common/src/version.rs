use std::fmt;

/// Build information captured at compile time by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct BuildInfo {
    pub version: &'static str,
    pub profile: &'static str,
    pub repo_version: &'static str,
    pub timestamp: &'static str,
    pub features: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quay {} ({})\nprofile: {}\nbuilt: {}\nfeatures: {}",
            self.version, self.repo_version, self.profile, self.timestamp, self.features
        )
    }
}

/// Capture [`BuildInfo`] for the calling crate.
///
/// Expands `env!` in the caller, so the crate using this must emit the
/// `BUILD_*` and `REPO_VERSION` variables from its own `build.rs`.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            profile: env!("BUILD_PROFILE"),
            repo_version: env!("REPO_VERSION"),
            timestamp: env!("BUILD_TIMESTAMP"),
            features: env!("BUILD_FEATURES"),
        }
    };
}

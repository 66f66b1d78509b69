//! Version comparison and the update notice shown to the user

use std::fmt;

use crate::constants::{LOCAL_VERSION, PROJECT_URL, VERSION_UNAVAILABLE};

/// Decide whether `remote` is newer than `local`
///
/// Both strings are split on `.`. A remote version with more components
/// than the local one is never reported as newer. Components are compared
/// left to right as strings, not numbers, so `"9"` sorts after `"10"`; the
/// first differing pair decides. Equal versions, and a shorter remote whose
/// components all match, are not newer.
///
/// ```
/// use watchdog_core::version::is_newer_version;
///
/// assert!(is_newer_version("1.6.0", "1.5.4"));
/// assert!(!is_newer_version("1.5", "1.5.4"));
/// ```
pub fn is_newer_version(remote: &str, local: &str) -> bool {
    let remote: Vec<&str> = remote.split('.').collect();
    let local: Vec<&str> = local.split('.').collect();

    if remote.len() > local.len() {
        return false;
    }

    for (r, l) in remote.iter().zip(local.iter()) {
        if r > l {
            return true;
        }
        if r < l {
            return false;
        }
    }

    false
}

/// What the user should do about the running version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAdvice {
    /// Latest version is known and not newer
    UpToDate,
    /// A newer release is published
    Upgrade,
    /// Latest version could not be determined
    CheckManually,
}

/// Version information printed at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionNotice {
    pub local_version: String,
    pub latest_version: String,
    pub project_url: String,
    pub advice: UpdateAdvice,
}

impl VersionNotice {
    /// Build the notice for this build against `latest_version`
    pub fn new(latest_version: impl Into<String>) -> Self {
        Self::for_versions(LOCAL_VERSION, latest_version)
    }

    /// Build the notice for an arbitrary local version
    pub fn for_versions(
        local_version: impl Into<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        let local_version = local_version.into();
        let latest_version = latest_version.into();

        let advice = if latest_version.contains(VERSION_UNAVAILABLE) {
            UpdateAdvice::CheckManually
        } else if is_newer_version(&latest_version, &local_version) {
            UpdateAdvice::Upgrade
        } else {
            UpdateAdvice::UpToDate
        };

        Self {
            local_version,
            latest_version,
            project_url: PROJECT_URL.to_string(),
            advice,
        }
    }
}

impl fmt::Display for VersionNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current version  {}", self.local_version)?;
        writeln!(f, "Latest version   {}", self.latest_version)?;
        write!(f, "Project          {}", self.project_url)?;

        match self.advice {
            UpdateAdvice::UpToDate => Ok(()),
            UpdateAdvice::Upgrade => write!(
                f,
                "\n\nA new version is available, download it from the project page"
            ),
            UpdateAdvice::CheckManually => write!(
                f,
                "\n\n{}\nCould not check for updates, please visit the project page",
                self.latest_version
            ),
        }
    }
}

//! Session and host configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Error, Result};

/// Vendor id the console enumerates with.
pub const DEFAULT_VENDOR_ID: u16 = 0x057E;

/// Product id the console enumerates with.
pub const DEFAULT_PRODUCT_ID: u16 = 0x3000;

/// Fixed pause between connection attempts while no device is attached.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// What to do when a `FILE_RANGE` name is missing from a non-empty catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum MissPolicy {
    /// Fail the command with [`Error::UnknownTitle`].
    #[default]
    Reject,
    /// Treat the requested name as a file path.
    LiteralPath,
}

impl std::fmt::Display for MissPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::LiteralPath => "literal",
        })
    }
}

impl std::str::FromStr for MissPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "literal" => Ok(Self::LiteralPath),
            _ => Err(format!("unknown miss policy: {s}")),
        }
    }
}

/// Settings for a single command session.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SessionConfig {
    /// Directory scanned on every `LIST` command.
    pub work_dir: PathBuf,
    /// Catalog miss handling for `FILE_RANGE`.
    pub miss_policy: MissPolicy,
}

impl SessionConfig {
    /// Creates a config serving `work_dir` with the default miss policy.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            miss_policy: MissPolicy::default(),
        }
    }

    /// Sets the catalog miss policy.
    #[must_use]
    pub fn miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    /// Checks that the working directory exists and is a directory.
    pub fn validate(&self) -> Result<()> {
        check_dir(&self.work_dir)
    }
}

/// Settings for the connect/serve loop.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct HostConfig {
    /// USB vendor id to look for.
    pub vendor_id: u16,
    /// USB product id to look for.
    pub product_id: u16,
    /// Pause between connection attempts.
    pub reconnect_delay: Duration,
    /// Per-session settings.
    pub session: SessionConfig,
}

impl HostConfig {
    /// Creates a host config with the console's default ids.
    pub fn new(session: SessionConfig) -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            session,
        }
    }

    /// Overrides the USB ids.
    #[must_use]
    pub fn device(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    /// Overrides the reconnect delay.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

fn check_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(Error::InvalidWorkDir(path.to_path_buf()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn miss_policy_parses_case_insensitively() {
        assert_eq!("Reject".parse::<MissPolicy>().unwrap(), MissPolicy::Reject);
        assert_eq!(
            "LITERAL".parse::<MissPolicy>().unwrap(),
            MissPolicy::LiteralPath
        );
        assert!("fallback".parse::<MissPolicy>().is_err());
        assert_eq!(MissPolicy::LiteralPath.to_string(), "literal");
    }

    #[test]
    fn host_defaults() {
        let cfg = HostConfig::new(SessionConfig::new("/tmp"));
        assert_eq!(cfg.vendor_id, 0x057e);
        assert_eq!(cfg.product_id, 0x3000);
        assert_eq!(cfg.reconnect_delay, Duration::from_secs(1));
        assert_eq!(cfg.session.miss_policy, MissPolicy::Reject);
    }

    #[test]
    fn validate_rejects_files_and_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.nsp");
        std::fs::write(&file, b"x").unwrap();

        assert!(SessionConfig::new(dir.path()).validate().is_ok());
        assert!(matches!(
            SessionConfig::new(&file).validate(),
            Err(Error::InvalidWorkDir(_))
        ));
        assert!(matches!(
            SessionConfig::new(dir.path().join("missing")).validate(),
            Err(Error::InvalidWorkDir(_))
        ));
    }
}

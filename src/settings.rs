//! Resolved paths for one run

use crate::cli::Args;
use eyre::{OptionExt, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "permbox";
const CONFIG_FILE: &str = "permissions.conf";
const HOMES_DIR: &str = "homes";

/// Where permbox keeps its state, after CLI and environment overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub config_file: PathBuf,
    pub homes_dir: PathBuf,
    pub tool: Option<PathBuf>,
}

impl Settings {
    /// Resolve from arguments, falling back to the XDG config and data dirs
    pub fn from_args(args: &Args) -> Result<Self> {
        let config_file = match &args.config {
            Some(path) => path.clone(),
            None => dirs::config_dir()
                .ok_or_eyre("Cannot determine config directory, pass --config")?
                .join(APP_DIR)
                .join(CONFIG_FILE),
        };

        let homes_dir = match &args.homes_dir {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .ok_or_eyre("Cannot determine data directory, pass --homes-dir")?
                .join(APP_DIR)
                .join(HOMES_DIR),
        };

        let settings = Self {
            config_file,
            homes_dir,
            tool: args.tool.clone(),
        };
        log::debug!("Settings: {:?}", settings);
        Ok(settings)
    }

    /// Isolated home directory for a container
    pub fn home_for(&self, name: &str) -> PathBuf {
        self.homes_dir.join(name)
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_explicit_paths_win() -> Result<()> {
        let args = Args::try_parse_from([
            "permbox",
            "--config",
            "/etc/permbox.conf",
            "--homes-dir",
            "/srv/homes",
            "--tool",
            "/opt/bin/distrobox",
            "kinds",
        ])?;
        let settings = Settings::from_args(&args)?;

        assert_eq!(settings.config_file(), Path::new("/etc/permbox.conf"));
        assert_eq!(settings.home_for("dev"), PathBuf::from("/srv/homes/dev"));
        assert_eq!(settings.tool, Some(PathBuf::from("/opt/bin/distrobox")));
        Ok(())
    }

    #[test]
    fn test_defaults_live_under_app_dir() -> Result<()> {
        let args = Args::try_parse_from(["permbox", "kinds"])?;
        // Skips on hosts without a resolvable home directory
        let Ok(settings) = Settings::from_args(&args) else {
            return Ok(());
        };

        if args.config.is_none() {
            assert!(settings.config_file.ends_with("permbox/permissions.conf"));
        }
        if args.homes_dir.is_none() {
            assert!(settings.home_for("dev").ends_with("permbox/homes/dev"));
        }
        Ok(())
    }
}

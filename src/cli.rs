//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_IMAGE: &str = "registry.fedoraproject.org/fedora-toolbox:latest";

#[derive(Parser, Debug)]
#[command(name = "permbox")]
#[command(version)]
#[command(about = "Create distrobox containers from per-container permission grants")]
#[command(
    long_about = "Permbox keeps a list of permission grants per container and turns them into \
                  a distrobox create invocation. Containers start with every namespace \
                  isolated and no host access; each grant opens exactly one capability."
)]
pub struct Args {
    /// Permission config file
    #[arg(long, global = true, value_name = "FILE", env = "PERMBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the isolated home of each container
    #[arg(long, global = true, value_name = "DIR", env = "PERMBOX_HOMES")]
    pub homes_dir: Option<PathBuf>,

    /// Container tool to invoke instead of distrobox from PATH
    #[arg(long, global = true, value_name = "PATH", env = "PERMBOX_TOOL")]
    pub tool: Option<PathBuf>,

    /// Set logging level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a container with its current permissions
    Create {
        name: String,
        #[arg(default_value = DEFAULT_IMAGE)]
        image: String,
        /// Print the distrobox command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Grant a permission to a container
    Grant {
        name: String,
        kind: String,
        value: String,
    },

    /// Remove every grant of one kind from a container
    Revoke { name: String, kind: String },

    /// Show grants and the resulting flags
    List {
        /// Limit the listing to one container
        name: Option<String>,
    },

    /// Remove and create a container again with its current permissions
    Recreate {
        name: String,
        #[arg(default_value = DEFAULT_IMAGE)]
        image: String,
        /// Print the distrobox command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Open the permission config in $VISUAL or $EDITOR
    Edit,

    /// List the permission kinds and the values they accept
    Kinds,
}

impl Args {
    /// Validate the arguments
    pub fn validate(&self) -> eyre::Result<()> {
        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            eyre::bail!(
                "Invalid log level '{}'. Valid levels are: error, warn, info, debug, trace",
                self.log_level
            );
        }

        if let Some(tool) = &self.tool
            && tool.as_os_str().is_empty()
        {
            eyre::bail!("--tool cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("permbox").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_create_defaults_image() {
        let args = parse(&["create", "dev"]);
        match args.command {
            Command::Create {
                name,
                image,
                dry_run,
            } => {
                assert_eq!(name, "dev");
                assert_eq!(image, DEFAULT_IMAGE);
                assert!(!dry_run);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_grant_requires_three_arguments() {
        assert!(Args::try_parse_from(["permbox", "grant", "dev", "network"]).is_err());
        let args = parse(&["grant", "dev", "mount", "/a:/b:c"]);
        assert!(matches!(args.command, Command::Grant { ref value, .. } if value == "/a:/b:c"));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = parse(&["list", "--config", "/tmp/p.conf", "--log-level", "debug"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/p.conf")));
        assert_eq!(args.log_level, "debug");
        assert!(matches!(args.command, Command::List { name: None }));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let args = parse(&["kinds", "--log-level", "loud"]);
        assert!(args.validate().is_err());
        let args = parse(&["kinds", "--log-level", "INFO"]);
        assert!(args.validate().is_ok());
    }
}

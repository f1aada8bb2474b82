//! Permbox - per-container permissions for distrobox

use clap::Parser;
use eyre::Result;

use permbox::cli::Args;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    args.validate()?;

    // Initialize logging - use --log-level if set, otherwise respect RUST_LOG
    // If RUST_LOG is set, it takes precedence over --log-level
    if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&args.log_level),
        )
        .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default()).init();
    }

    log::debug!("Parsed arguments: {:?}", args);
    permbox::run(&args)
}

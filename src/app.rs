//! Command dispatch for the permbox binary

use crate::cli::{Args, Command};
use crate::compiler::{CompiledFlags, compile};
use crate::error::Error;
use crate::host::HostEnv;
use crate::invocation::{
    CreateRequest, DEFAULT_TOOL, Distrobox, build_create_args, create_container,
    recreate_container, summary,
};
use crate::permission::{PermKind, PermissionRecord, validate_container_name};
use crate::settings::Settings;
use crate::store::{FileStore, PermissionStore};
use crate::utils::{create_parent_dirs, ensure_dir};
use eyre::{Context, Result};
use std::fs;
use std::path::Path;

const CONFIG_HEADER: &str = "\
# permbox permissions
#
# One grant per line: <container>:<kind>:<value>
# Lines starting with '#' are ignored. Run `permbox kinds` for the kinds.
#
# dev:network:host
# dev:mount:/home/me/src:/src
";

/// Run the parsed command
pub fn run(args: &Args) -> Result<()> {
    let settings = Settings::from_args(args)?;
    let mut store = FileStore::new(settings.config_file());

    match &args.command {
        Command::Create {
            name,
            image,
            dry_run,
        } => create(&settings, &store, name, image, *dry_run, false),
        Command::Recreate {
            name,
            image,
            dry_run,
        } => create(&settings, &store, name, image, *dry_run, true),
        Command::Grant { name, kind, value } => {
            let record = store
                .grant(name, kind, value)
                .wrap_err_with(|| format!("Failed to grant {} to {}", kind, name))?;
            println!("Granted {}", record);
            warn_if_ignored(&record);
            Ok(())
        }
        Command::Revoke { name, kind } => {
            let kind = kind.parse::<PermKind>()?;
            let removed = store
                .revoke(name, kind)
                .wrap_err_with(|| format!("Failed to revoke {} from {}", kind, name))?;
            println!("Revoked {} {} grant(s) from {}", removed, kind, name);
            Ok(())
        }
        Command::List { name } => list(&store, name.as_deref()),
        Command::Edit => edit(settings.config_file()),
        Command::Kinds => {
            for kind in PermKind::ALL {
                println!("{:<16} {}", kind.as_str(), kind.value_hint());
            }
            Ok(())
        }
    }
}

fn create(
    settings: &Settings,
    store: &FileStore,
    name: &str,
    image: &str,
    dry_run: bool,
    recreate: bool,
) -> Result<()> {
    validate_container_name(name)?;

    let records = store
        .list(name)
        .wrap_err_with(|| format!("Failed to read permissions for {}", name))?;
    let compiled = compile(&records, &HostEnv::capture());
    warn_ignored(&compiled);

    let request = CreateRequest {
        name: name.to_string(),
        image: image.to_string(),
        home: settings.home_for(name),
    };

    if dry_run {
        let program = settings
            .tool
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_TOOL))
            .display()
            .to_string();
        let args = build_create_args(&request, &compiled);
        let line: Vec<String> = args.iter().map(|a| quote(a)).collect();
        println!("{} {}", quote(&program), line.join(" "));
        return Ok(());
    }

    ensure_dir(&request.home, 0o755)
        .wrap_err_with(|| format!("Failed to prepare home for {}", name))?;

    let mut tool = Distrobox::locate(settings.tool.as_deref())?;
    let result = if recreate {
        recreate_container(&mut tool, &request, &compiled)
    } else {
        create_container(&mut tool, &request, &compiled)
    };
    result.wrap_err_with(|| format!("Failed to create container {}", name))?;

    print!("{}", summary(&request, &compiled));
    Ok(())
}

fn list(store: &FileStore, name: Option<&str>) -> Result<()> {
    let records = match name {
        Some(name) => {
            validate_container_name(name)?;
            store.list(name)?
        }
        None => store.list_all()?,
    };

    // Containers in first-seen order
    let mut containers: Vec<&str> = Vec::new();
    for record in &records {
        if !containers.contains(&record.container.as_str()) {
            containers.push(&record.container);
        }
    }

    if let Some(name) = name
        && containers.is_empty()
    {
        println!("{}: no grants (maximum isolation)", name);
        return Ok(());
    }

    let host = HostEnv::capture();
    for container in containers {
        let own: Vec<PermissionRecord> = records
            .iter()
            .filter(|r| r.container == container)
            .cloned()
            .collect();
        println!("{}:", container);
        for record in &own {
            println!("  {} = {}", record.kind, record.value);
        }
        let compiled = compile(&own, &host);
        println!("  isolation: {}", compiled.unshare.join(" "));
        for record in &compiled.ignored {
            println!("  ignored: {}", record);
        }
    }

    Ok(())
}

fn edit(config_file: &Path) -> Result<()> {
    if !config_file.exists() {
        create_parent_dirs(config_file, 0o755)?;
        fs::write(config_file, CONFIG_HEADER)
            .wrap_err_with(|| format!("Failed to create {}", config_file.display()))?;
    }

    let editor = std::env::var("VISUAL")
        .or_else(|_| std::env::var("EDITOR"))
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");

    log::debug!("Opening {} with {}", config_file.display(), editor);
    let status = std::process::Command::new(program)
        .args(parts)
        .arg(config_file)
        .status()
        .wrap_err_with(|| format!("Failed to start editor '{}'", editor))?;

    if !status.success() {
        return Err(Error::ExternalToolFailure {
            tool: program.to_string(),
            action: "edit".to_string(),
            status: status.to_string(),
        }
        .into());
    }
    Ok(())
}

fn warn_if_ignored(record: &PermissionRecord) {
    let compiled = compile(std::slice::from_ref(record), &HostEnv::default());
    if !compiled.ignored.is_empty() {
        eprintln!(
            "warning: '{}' is not understood by {} and will be ignored (expected {})",
            record.value,
            record.kind,
            record.kind.value_hint()
        );
    }
}

fn warn_ignored(compiled: &CompiledFlags) {
    for record in &compiled.ignored {
        log::warn!("Ignoring '{}': value not understood", record);
    }
}

/// Quote a token for display in a shell command line
fn quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_=:/.,@+%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

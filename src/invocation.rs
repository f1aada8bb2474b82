//! Invocation of the external container tool
//!
//! Builds the final argument vector for `distrobox create` and runs it.
//! The hardening block always comes last so no permission flag can
//! silently displace it; a later duplicate engine flag may still win
//! inside the engine's own parser.

use crate::compiler::{CompiledFlags, PermissionFlag};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const DEFAULT_TOOL: &str = "distrobox";

/// Option the tool uses to forward flags to the container engine
pub const PASSTHROUGH_FLAG: &str = "--additional-flags";

/// Engine flags appended to every create
pub const HARDENING_FLAGS: [&str; 3] = [
    "--security-opt=no-new-privileges",
    "--cap-drop=ALL",
    "--read-only-tmpfs=true",
];

/// What to create
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub image: String,
    pub home: PathBuf,
}

/// Operations needed from the container-creation tool
pub trait ContainerTool {
    /// Run `create` with a complete argument vector
    fn create(&mut self, args: &[String]) -> Result<()>;

    fn exists(&mut self, name: &str) -> Result<bool>;

    fn stop(&mut self, name: &str) -> Result<()>;

    fn remove(&mut self, name: &str) -> Result<()>;
}

/// Build the full argument vector, starting with the `create` subcommand
pub fn build_create_args(request: &CreateRequest, compiled: &CompiledFlags) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        "--name".to_string(),
        request.name.clone(),
        "--image".to_string(),
        request.image.clone(),
        "--home".to_string(),
        request.home.to_string_lossy().into_owned(),
        "--no-entry".to_string(),
    ];

    args.extend(compiled.unshare.iter().cloned());

    for flag in &compiled.permissions {
        match flag {
            PermissionFlag::Engine(flag) => {
                args.push(PASSTHROUGH_FLAG.to_string());
                args.push(flag.clone());
            }
            PermissionFlag::Tool(flag) => args.push(flag.clone()),
        }
    }

    for flag in HARDENING_FLAGS {
        args.push(PASSTHROUGH_FLAG.to_string());
        args.push(flag.to_string());
    }

    args
}

/// Create a container with the compiled flag set
///
/// A failed create is reported as is; a half-created container is left
/// for the caller to clear with `recreate`.
pub fn create_container<T: ContainerTool + ?Sized>(
    tool: &mut T,
    request: &CreateRequest,
    compiled: &CompiledFlags,
) -> Result<Vec<String>> {
    let args = build_create_args(request, compiled);
    log::info!("Creating container {} from {}", request.name, request.image);
    log::debug!("Create arguments: {:?}", args);
    tool.create(&args)?;
    Ok(args)
}

/// Tear down an existing container, then create it again
///
/// Stop and remove are best effort: their failures are logged and the
/// create still runs.
pub fn recreate_container<T: ContainerTool + ?Sized>(
    tool: &mut T,
    request: &CreateRequest,
    compiled: &CompiledFlags,
) -> Result<Vec<String>> {
    match tool.exists(&request.name) {
        Ok(true) => {
            log::info!("Removing existing container {}", request.name);
            if let Err(e) = tool.stop(&request.name) {
                log::warn!("Could not stop {}: {}", request.name, e);
            }
            if let Err(e) = tool.remove(&request.name) {
                log::warn!("Could not remove {}: {}", request.name, e);
            }
        }
        Ok(false) => log::debug!("Container {} does not exist yet", request.name),
        Err(e) => log::warn!("Could not list containers: {}", e),
    }

    create_container(tool, request, compiled)
}

/// Human-readable account of what a create applied
pub fn summary(request: &CreateRequest, compiled: &CompiledFlags) -> String {
    let mut out = format!("Container '{}' ({})\n", request.name, request.image);
    out.push_str(&format!("  home: {}\n", request.home.display()));

    if compiled.unshare.is_empty() {
        out.push_str("  isolation: none\n");
    } else {
        out.push_str(&format!("  isolation: {}\n", compiled.unshare.join(" ")));
    }

    if compiled.permissions.is_empty() {
        out.push_str("  permissions: none\n");
    } else {
        out.push_str("  permissions:\n");
        for flag in &compiled.permissions {
            out.push_str(&format!("    {}\n", flag));
        }
    }

    out.push_str(&format!("  hardening: {}\n", HARDENING_FLAGS.join(" ")));
    out
}

/// distrobox, run as a child process
#[derive(Debug, Clone)]
pub struct Distrobox {
    program: PathBuf,
}

impl Distrobox {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Use `program` if given, otherwise look distrobox up in `PATH`
    pub fn locate(program: Option<&Path>) -> Result<Self> {
        if let Some(program) = program {
            return Ok(Self::new(program));
        }
        let program =
            which::which(DEFAULT_TOOL).map_err(|_| Error::ToolNotFound(DEFAULT_TOOL.to_string()))?;
        log::debug!("Using {}", program.display());
        Ok(Self::new(program))
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_TOOL.to_string())
    }

    fn run(&self, action: &str, args: &[String]) -> Result<()> {
        log::debug!("Running {} {:?}", self.program.display(), args);
        let status = Command::new(&self.program)
            .args(args)
            .status()
            .map_err(|e| Error::io(&self.program, e))?;

        if !status.success() {
            return Err(Error::ExternalToolFailure {
                tool: self.tool_name(),
                action: action.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn output(&self, action: &str, args: &[&str]) -> Result<Output> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::io(&self.program, e))?;

        if !output.status.success() {
            return Err(Error::ExternalToolFailure {
                tool: self.tool_name(),
                action: action.to_string(),
                status: output.status.to_string(),
            });
        }
        Ok(output)
    }
}

/// Find `name` in `distrobox list` output (`ID | NAME | STATUS | IMAGE`)
pub fn list_contains(listing: &str, name: &str) -> bool {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| line.split('|').nth(1))
        .any(|column| column.trim() == name)
}

impl ContainerTool for Distrobox {
    fn create(&mut self, args: &[String]) -> Result<()> {
        self.run("create", args)
    }

    fn exists(&mut self, name: &str) -> Result<bool> {
        let output = self.output("list", &["list", "--no-color"])?;
        Ok(list_contains(&String::from_utf8_lossy(&output.stdout), name))
    }

    fn stop(&mut self, name: &str) -> Result<()> {
        self.run("stop", &["stop".to_string(), "--yes".to_string(), name.to_string()])
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.run("rm", &["rm".to_string(), "--force".to_string(), name.to_string()])
    }
}

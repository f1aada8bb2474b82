//! Permission-to-flag compiler
//!
//! Folds the ordered records of one container into the unshare flags and
//! permission flags handed to the container tool. Compilation never fails:
//! a value a kind does not understand is dropped and reported in
//! [`CompiledFlags::ignored`].

use crate::host::HostEnv;
use crate::isolation::{IsolationState, Namespaces};
use crate::permission::{PermKind, PermissionRecord};
use std::fmt;

const X11_SOCKET_DIR: &str = "/tmp/.X11-unix";
const USB_BUS_DIR: &str = "/dev/bus/usb";
const AUDIO_DEVICE: &str = "/dev/snd";
const DRI_DEVICE: &str = "/dev/dri";
const NVIDIA_CDI_DEVICE: &str = "nvidia.com/gpu=all";
const WEBCAM_DEVICE: &str = "/dev/video0";

/// One compiled permission flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionFlag {
    /// Container engine flag, forwarded through the tool's passthrough option
    Engine(String),
    /// Flag understood by the container tool itself
    Tool(String),
}

impl PermissionFlag {
    pub fn as_str(&self) -> &str {
        match self {
            PermissionFlag::Engine(flag) | PermissionFlag::Tool(flag) => flag,
        }
    }
}

impl fmt::Display for PermissionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler output for one container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFlags {
    pub unshare: Vec<String>,
    pub permissions: Vec<PermissionFlag>,
    /// Records whose value was not understood and produced nothing
    pub ignored: Vec<PermissionRecord>,
}

/// Split a `mount` value at its first colon
///
/// Everything after the first colon is the destination, colons included.
pub fn parse_mount(value: &str) -> Option<(&str, &str)> {
    let (src, dst) = value.split_once(':')?;
    if src.is_empty() || dst.is_empty() {
        return None;
    }
    Some((src, dst))
}

fn is_enable(value: &str) -> bool {
    matches!(value, "enable" | "true")
}

fn volume(src: &str, dst: &str) -> PermissionFlag {
    PermissionFlag::Engine(format!("--volume={}:{}:rw", src, dst))
}

fn device(dev: &str) -> PermissionFlag {
    PermissionFlag::Engine(format!("--device={}", dev))
}

fn env(name: &str, value: &str) -> PermissionFlag {
    PermissionFlag::Engine(format!("--env={}={}", name, value))
}

fn engine(flag: &str, value: &str) -> PermissionFlag {
    PermissionFlag::Engine(format!("{}={}", flag, value))
}

/// Compile one container's records into its flag set
pub fn compile(records: &[PermissionRecord], host: &HostEnv) -> CompiledFlags {
    let mut state = IsolationState::default();
    let mut out = CompiledFlags::default();

    for record in records {
        let value = record.value.as_str();
        let before = out.permissions.len();
        // Kinds that only step isolation state set this when they act
        let mut stepped = false;

        match record.kind {
            PermKind::HomeFolder => {
                if !value.is_empty() {
                    out.permissions.push(volume(value, value));
                }
            }
            PermKind::Mount => {
                if let Some((src, dst)) = parse_mount(value) {
                    out.permissions.push(volume(src, dst));
                }
            }
            PermKind::Network => {
                if matches!(value, "host" | "bridge") {
                    out.permissions.push(engine("--network", value));
                    state.share(Namespaces::NETNS);
                }
            }
            PermKind::X11 => {
                if is_enable(value) {
                    out.permissions.push(volume(X11_SOCKET_DIR, X11_SOCKET_DIR));
                    out.permissions.push(env("DISPLAY", host.display()));
                    out.permissions.push(env("XAUTHORITY", host.xauthority()));
                }
            }
            PermKind::Wayland => {
                if is_enable(value) {
                    let display = host.wayland_display();
                    let socket = format!("{}/{}", host.runtime_dir(), display);
                    out.permissions.push(volume(&socket, &socket));
                    out.permissions.push(env("WAYLAND_DISPLAY", display));
                }
            }
            PermKind::Audio => {
                if is_enable(value) {
                    let pulse = format!("{}/pulse", host.runtime_dir());
                    out.permissions.push(volume(&pulse, &pulse));
                    out.permissions.push(device(AUDIO_DEVICE));
                }
            }
            PermKind::Gpu => {
                if is_enable(value) {
                    out.permissions.push(device(DRI_DEVICE));
                    out.permissions.push(device(NVIDIA_CDI_DEVICE));
                }
            }
            PermKind::Usb => {
                if is_enable(value) {
                    out.permissions.push(volume(USB_BUS_DIR, USB_BUS_DIR));
                    state.share(Namespaces::DEVSYS);
                }
            }
            PermKind::Webcam => {
                if is_enable(value) {
                    out.permissions.push(device(WEBCAM_DEVICE));
                }
            }
            PermKind::UnshareNetns
            | PermKind::UnshareDevsys
            | PermKind::UnshareGroups
            | PermKind::UnshareIpc
            | PermKind::UnshareProcess => {
                if value == "false" {
                    let ns = match record.kind {
                        PermKind::UnshareNetns => Namespaces::NETNS,
                        PermKind::UnshareDevsys => Namespaces::DEVSYS,
                        PermKind::UnshareGroups => Namespaces::GROUPS,
                        PermKind::UnshareIpc => Namespaces::IPC,
                        _ => Namespaces::PROCESS,
                    };
                    state.share(ns);
                    stepped = true;
                }
            }
            PermKind::UnshareAll => match value {
                "false" => {
                    state.share_all();
                    stepped = true;
                }
                "true" => {
                    state.unshare_all();
                    stepped = true;
                }
                _ => {}
            },
            PermKind::Privileged => {
                if is_enable(value) {
                    out.permissions
                        .push(PermissionFlag::Engine("--privileged".to_string()));
                }
            }
            PermKind::Root => {
                if is_enable(value) {
                    out.permissions.push(PermissionFlag::Tool("--root".to_string()));
                }
            }
            PermKind::Init => {
                if is_enable(value) {
                    out.permissions.push(PermissionFlag::Tool("--init".to_string()));
                }
            }
            PermKind::Hostname => {
                if !value.is_empty() {
                    out.permissions.push(engine("--hostname", value));
                }
            }
            PermKind::CapAdd => {
                if !value.is_empty() {
                    out.permissions.push(engine("--cap-add", value));
                }
            }
            PermKind::SecurityOpt => {
                if !value.is_empty() {
                    out.permissions.push(engine("--security-opt", value));
                }
            }
        }

        if out.permissions.len() == before && !stepped {
            log::debug!("Ignoring '{}': value not understood", record);
            out.ignored.push(record.clone());
        }
    }

    out.unshare = state.flags();
    log::debug!(
        "Compiled {} unshare flag(s), {} permission flag(s), {} ignored record(s)",
        out.unshare.len(),
        out.permissions.len(),
        out.ignored.len()
    );
    out
}

//! Host environment snapshot used by display and audio passthrough

use nix::unistd::getuid;

const DEFAULT_WAYLAND_DISPLAY: &str = "wayland-0";

/// Host values the compiler reads, captured once per invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
    pub display: Option<String>,
    pub xauthority: Option<String>,
    pub wayland_display: Option<String>,
    pub xdg_runtime_dir: Option<String>,
    pub uid: u32,
}

impl HostEnv {
    /// Capture the current process environment
    pub fn capture() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let env = Self {
            display: var("DISPLAY"),
            xauthority: var("XAUTHORITY"),
            wayland_display: var("WAYLAND_DISPLAY"),
            xdg_runtime_dir: var("XDG_RUNTIME_DIR"),
            uid: getuid().as_raw(),
        };
        log::debug!("Host environment: {:?}", env);
        env
    }

    pub fn display(&self) -> &str {
        self.display.as_deref().unwrap_or_default()
    }

    pub fn xauthority(&self) -> &str {
        self.xauthority.as_deref().unwrap_or_default()
    }

    pub fn wayland_display(&self) -> &str {
        self.wayland_display
            .as_deref()
            .unwrap_or(DEFAULT_WAYLAND_DISPLAY)
    }

    /// `XDG_RUNTIME_DIR`, falling back to `/run/user/<uid>`
    pub fn runtime_dir(&self) -> String {
        match &self.xdg_runtime_dir {
            Some(dir) => dir.trim_end_matches('/').to_string(),
            None => format!("/run/user/{}", self.uid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks() {
        let env = HostEnv {
            uid: 1000,
            ..Default::default()
        };
        assert_eq!(env.display(), "");
        assert_eq!(env.xauthority(), "");
        assert_eq!(env.wayland_display(), "wayland-0");
        assert_eq!(env.runtime_dir(), "/run/user/1000");
    }

    #[test]
    fn test_runtime_dir_strips_trailing_slash() {
        let env = HostEnv {
            xdg_runtime_dir: Some("/run/user/42/".to_string()),
            ..Default::default()
        };
        assert_eq!(env.runtime_dir(), "/run/user/42");
    }

    #[test]
    fn test_capture_reads_real_uid() {
        let env = HostEnv::capture();
        assert_eq!(env.uid, getuid().as_raw());
    }
}

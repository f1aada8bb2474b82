//! Permission records and their on-disk line format
//!
//! One record per line: `container:kind:value`. The line is split into at
//! most three fields, so a value keeps any colons it contains
//! (`dev:mount:/src:/dst` has the value `/src:/dst`).

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Every permission kind a record may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermKind {
    HomeFolder,
    Mount,
    Network,
    X11,
    Wayland,
    Audio,
    Gpu,
    Usb,
    Webcam,
    UnshareNetns,
    UnshareDevsys,
    UnshareGroups,
    UnshareIpc,
    UnshareProcess,
    UnshareAll,
    Privileged,
    Root,
    Init,
    Hostname,
    CapAdd,
    SecurityOpt,
}

impl PermKind {
    pub const ALL: [PermKind; 21] = [
        PermKind::HomeFolder,
        PermKind::Mount,
        PermKind::Network,
        PermKind::X11,
        PermKind::Wayland,
        PermKind::Audio,
        PermKind::Gpu,
        PermKind::Usb,
        PermKind::Webcam,
        PermKind::UnshareNetns,
        PermKind::UnshareDevsys,
        PermKind::UnshareGroups,
        PermKind::UnshareIpc,
        PermKind::UnshareProcess,
        PermKind::UnshareAll,
        PermKind::Privileged,
        PermKind::Root,
        PermKind::Init,
        PermKind::Hostname,
        PermKind::CapAdd,
        PermKind::SecurityOpt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermKind::HomeFolder => "home_folder",
            PermKind::Mount => "mount",
            PermKind::Network => "network",
            PermKind::X11 => "x11",
            PermKind::Wayland => "wayland",
            PermKind::Audio => "audio",
            PermKind::Gpu => "gpu",
            PermKind::Usb => "usb",
            PermKind::Webcam => "webcam",
            PermKind::UnshareNetns => "unshare_netns",
            PermKind::UnshareDevsys => "unshare_devsys",
            PermKind::UnshareGroups => "unshare_groups",
            PermKind::UnshareIpc => "unshare_ipc",
            PermKind::UnshareProcess => "unshare_process",
            PermKind::UnshareAll => "unshare_all",
            PermKind::Privileged => "privileged",
            PermKind::Root => "root",
            PermKind::Init => "init",
            PermKind::Hostname => "hostname",
            PermKind::CapAdd => "cap_add",
            PermKind::SecurityOpt => "security_opt",
        }
    }

    /// Example value shown by `permbox kinds`
    pub fn value_hint(self) -> &'static str {
        match self {
            PermKind::HomeFolder => "<path>",
            PermKind::Mount => "<src>:<dst>",
            PermKind::Network => "host|bridge",
            PermKind::UnshareNetns
            | PermKind::UnshareDevsys
            | PermKind::UnshareGroups
            | PermKind::UnshareIpc
            | PermKind::UnshareProcess => "false",
            PermKind::UnshareAll => "true|false",
            PermKind::Hostname => "<name>",
            PermKind::CapAdd => "<capability>",
            PermKind::SecurityOpt => "<option>",
            _ => "enable",
        }
    }
}

impl fmt::Display for PermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PermKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidPermissionKind(s.to_string()))
    }
}

/// One grant of a capability to a named container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRecord {
    pub container: String,
    pub kind: PermKind,
    pub value: String,
}

impl PermissionRecord {
    /// Build a record, rejecting names and values the line format cannot hold
    pub fn new(container: &str, kind: PermKind, value: &str) -> Result<Self> {
        validate_container_name(container)?;
        if value.contains('\n') || value.contains('\r') {
            return Err(Error::InvalidValue(value.to_string()));
        }

        Ok(Self {
            container: container.to_string(),
            kind,
            value: value.to_string(),
        })
    }

    /// Parse one config line
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments. The value is
    /// kept verbatim apart from a CRLF terminator.
    pub fn parse_line(line: &str) -> Result<Option<Self>> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }

        let body = line.trim_start();
        let mut fields = body.splitn(3, ':');
        let container = fields.next().unwrap_or_default();
        let (Some(kind), Some(value)) = (fields.next(), fields.next()) else {
            return Err(Error::InvalidValue(body.to_string()));
        };

        let kind = kind.parse::<PermKind>()?;
        Self::new(container, kind, value).map(Some)
    }

    pub fn matches(&self, container: &str, kind: PermKind) -> bool {
        self.container == container && self.kind == kind
    }
}

impl fmt::Display for PermissionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.container, self.kind, self.value)
    }
}

/// Check a container name against the engine's charset
///
/// `[A-Za-z0-9][A-Za-z0-9_.-]*`: the name is also the home directory's
/// last path component, so it can never be absolute, `.` or `..`.
pub fn validate_container_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err(Error::InvalidContainerName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_roundtrip() -> Result<()> {
        for kind in PermKind::ALL {
            assert_eq!(kind.as_str().parse::<PermKind>()?, kind);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "bluetooth".parse::<PermKind>().unwrap_err();
        assert!(matches!(err, Error::InvalidPermissionKind(k) if k == "bluetooth"));
    }

    #[test]
    fn test_kind_parsing_is_case_sensitive() {
        assert!("Network".parse::<PermKind>().is_err());
        assert!("unshare-netns".parse::<PermKind>().is_err());
    }

    #[test]
    fn test_parse_line_keeps_colons_in_value() -> Result<()> {
        let record = PermissionRecord::parse_line("dev:mount:/src/path:with:colons:/dst/path")?
            .expect("record");
        assert_eq!(record.container, "dev");
        assert_eq!(record.kind, PermKind::Mount);
        assert_eq!(record.value, "/src/path:with:colons:/dst/path");
        Ok(())
    }

    #[test]
    fn test_parse_line_skips_comments_and_blanks() -> Result<()> {
        assert!(PermissionRecord::parse_line("")?.is_none());
        assert!(PermissionRecord::parse_line("   ")?.is_none());
        assert!(PermissionRecord::parse_line("# dev:network:host")?.is_none());
        Ok(())
    }

    #[test]
    fn test_parse_line_allows_empty_value() -> Result<()> {
        let record = PermissionRecord::parse_line("dev:hostname:")?.expect("record");
        assert_eq!(record.value, "");
        Ok(())
    }

    #[test]
    fn test_parse_line_rejects_short_lines() {
        assert!(PermissionRecord::parse_line("dev:network").is_err());
        assert!(PermissionRecord::parse_line("dev").is_err());
    }

    #[test]
    fn test_new_rejects_bad_names() {
        assert!(PermissionRecord::new("", PermKind::Gpu, "enable").is_err());
        assert!(PermissionRecord::new("a:b", PermKind::Gpu, "enable").is_err());
        assert!(PermissionRecord::new("a\nb", PermKind::Gpu, "enable").is_err());
    }

    #[test]
    fn test_container_names_stay_inside_homes_dir() {
        for name in ["/home/me", "../escaped", "..", ".", ".hidden", "a/b", "-x", "my box"] {
            let err = validate_container_name(name).unwrap_err();
            assert!(matches!(err, Error::InvalidContainerName(n) if n == name));
        }
    }

    #[test]
    fn test_engine_container_names_accepted() -> Result<()> {
        for name in ["dev", "Fedora-40", "web_1", "a.b", "0"] {
            validate_container_name(name)?;
        }
        Ok(())
    }

    #[test]
    fn test_parse_line_keeps_value_whitespace() -> Result<()> {
        let record = PermissionRecord::new("dev", PermKind::Hostname, " box ")?;
        let parsed = PermissionRecord::parse_line(&record.to_string())?.expect("record");
        assert_eq!(parsed, record);

        let parsed = PermissionRecord::parse_line("  dev:hostname:box \r")?.expect("record");
        assert_eq!(parsed.container, "dev");
        assert_eq!(parsed.value, "box ");
        Ok(())
    }

    #[test]
    fn test_new_rejects_multiline_value() {
        let err = PermissionRecord::new("dev", PermKind::Hostname, "a\nb").unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }

    #[test]
    fn test_display_matches_line_format() -> Result<()> {
        let record = PermissionRecord::new("dev", PermKind::CapAdd, "SYS_PTRACE")?;
        assert_eq!(record.to_string(), "dev:cap_add:SYS_PTRACE");
        Ok(())
    }
}

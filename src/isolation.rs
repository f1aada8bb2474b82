//! Namespace isolation state

bitflags::bitflags! {
    /// Namespaces the container tool keeps separate from the host
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Namespaces: u8 {
        const NETNS = 1 << 0;
        const DEVSYS = 1 << 1;
        const GROUPS = 1 << 2;
        const IPC = 1 << 3;
        const PROCESS = 1 << 4;
    }
}

/// Emission order for per-namespace unshare flags
const UNSHARE_FLAGS: [(Namespaces, &str); 5] = [
    (Namespaces::NETNS, "--unshare-netns"),
    (Namespaces::DEVSYS, "--unshare-devsys"),
    (Namespaces::GROUPS, "--unshare-groups"),
    (Namespaces::IPC, "--unshare-ipc"),
    (Namespaces::PROCESS, "--unshare-process"),
];

const UNSHARE_ALL_FLAG: &str = "--unshare-all";

/// Isolation toggles folded from `unshare_*` records
///
/// The per-namespace set and the `all` switch are stepped independently;
/// only an explicit `unshare_all:false` touches both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsolationState {
    pub isolated: Namespaces,
    pub all: bool,
}

impl Default for IsolationState {
    fn default() -> Self {
        Self {
            isolated: Namespaces::all(),
            all: false,
        }
    }
}

impl IsolationState {
    pub fn share(&mut self, ns: Namespaces) {
        self.isolated.remove(ns);
    }

    /// `unshare_all:false`: share every namespace and drop the master switch
    pub fn share_all(&mut self) {
        self.isolated = Namespaces::empty();
        self.all = false;
    }

    /// `unshare_all:true`: set the master switch only
    pub fn unshare_all(&mut self) {
        self.all = true;
    }

    /// Unshare flags for the final state, in fixed order
    pub fn flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = UNSHARE_FLAGS
            .iter()
            .filter(|(ns, _)| self.isolated.contains(*ns))
            .map(|(_, flag)| flag.to_string())
            .collect();
        if self.all {
            flags.push(UNSHARE_ALL_FLAG.to_string());
        }
        flags
    }
}

//! Permbox - per-container permissions for distrobox
//!
//! Permbox stores declarative permission grants per container and compiles
//! them into a hardened `distrobox create` invocation. Every container
//! starts with all namespaces isolated; each grant opens one capability.

// Public modules - exposed for the binary and library callers
pub mod cli;
pub mod compiler;
pub mod error;
pub mod host;
pub mod invocation;
pub mod isolation;
pub mod permission;
pub mod settings;
pub mod store;

// Internal modules - only visible within the crate
pub(crate) mod app;
pub(crate) mod utils;

pub use app::run;
pub use cli::Args;
pub use compiler::{CompiledFlags, PermissionFlag, compile};
pub use error::{Error, Result};
pub use host::HostEnv;
pub use permission::{PermKind, PermissionRecord};
pub use store::{FileStore, MemoryStore, PermissionStore};

//! # Operation kinds and output relay policies.
//!
//! Every [`OperationKind`] maps to one Homebrew command word and to a default
//! [`RelayPolicy`]:
//!
//! ```text
//! Install            ─► "install"    ─► Streaming (one on_output per line)
//! Uninstall          ─► "uninstall"  ─► Batch
//! Update             ─► "update"     ─► Batch
//! List               ─► "list"       ─► Batch
//! Search             ─► "search"     ─► Batch
//! Options            ─► "options"    ─► Batch
//! Custom(name)       ─► name         ─► Batch (overridable per operation)
//! ```

use std::fmt;

/// Homebrew command an operation runs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `brew install <formula>`.
    Install,
    /// `brew uninstall <formula>`.
    Uninstall,
    /// `brew update`.
    Update,
    /// `brew list` (installed formulae).
    List,
    /// `brew search [term]`.
    Search,
    /// `brew options <formula>` / `brew options --installed`.
    Options,
    /// Any other command word.
    Custom(String),
}

impl OperationKind {
    /// Returns the command word passed to the brew executable.
    pub fn command(&self) -> &str {
        match self {
            OperationKind::Install => "install",
            OperationKind::Uninstall => "uninstall",
            OperationKind::Update => "update",
            OperationKind::List => "list",
            OperationKind::Search => "search",
            OperationKind::Options => "options",
            OperationKind::Custom(name) => name,
        }
    }

    /// Returns the relay policy used when the operation does not override it.
    pub fn default_relay(&self) -> RelayPolicy {
        match self {
            OperationKind::Install => RelayPolicy::Streaming,
            _ => RelayPolicy::Batch,
        }
    }

    /// True for the query commands whose output the output parser understands.
    pub fn is_parseable(&self) -> bool {
        matches!(
            self,
            OperationKind::List | OperationKind::Search | OperationKind::Options
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// How process output reaches an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayPolicy {
    /// Forward each line as soon as it is read.
    Streaming,
    /// Accumulate everything and forward it once, just before a successful finish.
    Batch,
}

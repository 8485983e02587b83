//! # Operation value object.
//!
//! An [`Operation`] describes one invocation of the brew executable. It is
//! immutable apart from two flags:
//! - **busy**: maintained by the engine, true while at least one queue entry
//!   for this very object is pending or running;
//! - **installed**: never touched by the engine; set by whoever interprets the
//!   output of a `list` query.
//!
//! Operations are shared between the caller and the engine through
//! [`OperationRef`] (`Arc<Operation>`). Submitting the same handle twice
//! creates two independent queue entries.
//!
//! ## Example
//! ```rust
//! use brewvisor::{Operation, OperationKind};
//!
//! let op = Operation::install("wget");
//! assert_eq!(op.kind(), &OperationKind::Install);
//! assert_eq!(op.argv(), vec!["install".to_string(), "wget".to_string()]);
//! assert!(op.is_equivalent(&Operation::install("wget")));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::kind::{OperationKind, RelayPolicy};

/// Shared handle to an operation.
pub type OperationRef = Arc<Operation>;

/// One unit of Homebrew work.
pub struct Operation {
    kind: OperationKind,
    args: Vec<String>,
    relay: Option<RelayPolicy>,
    in_flight: AtomicUsize,
    installed: AtomicBool,
}

impl Operation {
    /// Creates an operation with an explicit kind and argument list.
    pub fn new<I, S>(kind: OperationKind, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
            relay: None,
            in_flight: AtomicUsize::new(0),
            installed: AtomicBool::new(false),
        }
    }

    /// `brew install <formula>`.
    pub fn install(formula: impl Into<String>) -> Self {
        Self::new(OperationKind::Install, [formula.into()])
    }

    /// `brew uninstall <formula>`.
    pub fn uninstall(formula: impl Into<String>) -> Self {
        Self::new(OperationKind::Uninstall, [formula.into()])
    }

    /// `brew update`.
    pub fn update() -> Self {
        Self::new(OperationKind::Update, Vec::<String>::new())
    }

    /// `brew list`: the installed formulae.
    pub fn list() -> Self {
        Self::new(OperationKind::List, Vec::<String>::new())
    }

    /// `brew search [term]`; `None` searches all available formulae.
    pub fn search(term: Option<&str>) -> Self {
        Self::new(OperationKind::Search, term.map(str::to_string))
    }

    /// `brew options <formula>`.
    pub fn options(formula: impl Into<String>) -> Self {
        Self::new(OperationKind::Options, [formula.into()])
    }

    /// `brew options --installed`: options of every installed formula.
    pub fn installed_options() -> Self {
        Self::new(OperationKind::Options, ["--installed"])
    }

    /// Any other brew command word with its arguments.
    pub fn custom<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OperationKind::Custom(command.into()), args)
    }

    /// Overrides the relay policy derived from the kind.
    pub fn with_relay(mut self, relay: RelayPolicy) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Wraps the operation into a shared handle.
    pub fn into_ref(self) -> OperationRef {
        Arc::new(self)
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Returns the arguments following the command word.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the effective relay policy.
    pub fn relay(&self) -> RelayPolicy {
        self.relay.unwrap_or_else(|| self.kind.default_relay())
    }

    /// Full argument vector handed to the brew executable: command word first.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.kind.command().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Equality over kind and arguments; used to match cancel requests.
    pub fn is_equivalent(&self, other: &Operation) -> bool {
        self.kind == other.kind && self.args == other.args
    }

    /// True while a queue entry for this object is pending or running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    /// Whether this operation's formula is known to be installed.
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Records whether the formula is installed. The engine never calls this.
    pub fn set_installed(&self, installed: bool) {
        self.installed.store(installed, Ordering::Release);
    }

    pub(crate) fn enter(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn leave(&self) {
        // Saturating: a stray leave must not wrap the counter.
        let _ = self
            .in_flight
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

impl Clone for Operation {
    /// Clones the description only; the copy starts idle.
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            args: self.args.clone(),
            relay: self.relay,
            in_flight: AtomicUsize::new(0),
            installed: AtomicBool::new(self.is_installed()),
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("args", &self.args)
            .field("busy", &self.is_busy())
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.command())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

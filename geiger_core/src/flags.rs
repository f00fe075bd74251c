//! Runtime on/off switches gating which sinks receive each reading.
//!
//! The live values are owned here and passed by reference into the
//! monitor; every change is handed to a `FlagStore` for persistence.
use std::path::PathBuf;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Debug,
    Network,
    FileLogging,
    Display,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Debug, Flag::Network, Flag::FileLogging, Flag::Display];

    pub fn name(self) -> &'static str {
        match self {
            Flag::Debug => "debug",
            Flag::Network => "network",
            Flag::FileLogging => "file",
            Flag::Display => "display",
        }
    }

    /// Accepts the console token and a few spelled-out aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Flag::Debug),
            "network" | "net" | "wifi" => Some(Flag::Network),
            "file" | "file_logging" | "log" => Some(Flag::FileLogging),
            "display" | "screen" => Some(Flag::Display),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSet {
    pub debug: bool,
    pub network: bool,
    pub file_logging: bool,
    pub display: bool,
}

impl Default for FlagSet {
    fn default() -> Self {
        geiger_config::PersistedFlags::default().into()
    }
}

impl FlagSet {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Debug => self.debug,
            Flag::Network => self.network,
            Flag::FileLogging => self.file_logging,
            Flag::Display => self.display,
        }
    }

    pub fn set(&mut self, flag: Flag, value: bool) {
        let slot = match flag {
            Flag::Debug => &mut self.debug,
            Flag::Network => &mut self.network,
            Flag::FileLogging => &mut self.file_logging,
            Flag::Display => &mut self.display,
        };
        *slot = value;
    }
}

/// Persistence collaborator for flag changes.
pub trait FlagStore {
    fn persist(&mut self, flags: &FlagSet) -> Result<()>;
}

/// Stores flags in the TOML flag file.
#[derive(Debug, Clone)]
pub struct FileFlagStore {
    path: PathBuf,
}

impl FileFlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the current file (defaults when absent).
    pub fn load(&self) -> Result<FlagSet> {
        Ok(geiger_config::load_flags(&self.path)?.into())
    }
}

impl FlagStore for FileFlagStore {
    fn persist(&mut self, flags: &FlagSet) -> Result<()> {
        geiger_config::save_flags(&self.path, &(*flags).into())
    }
}

pub struct Flags {
    current: FlagSet,
    store: Box<dyn FlagStore + Send>,
}

impl core::fmt::Debug for Flags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Flags").field("current", &self.current).finish()
    }
}

impl Flags {
    pub fn new(initial: FlagSet, store: Box<dyn FlagStore + Send>) -> Self {
        Self {
            current: initial,
            store,
        }
    }

    pub fn current(&self) -> FlagSet {
        self.current
    }

    pub fn get(&self, flag: Flag) -> bool {
        self.current.get(flag)
    }

    /// Change one flag and persist. A persistence failure is logged; the
    /// in-memory value changes regardless. Returns true if the value changed.
    pub fn update(&mut self, flag: Flag, value: bool) -> bool {
        if self.current.get(flag) == value {
            return false;
        }
        self.current.set(flag, value);
        tracing::info!(flag = flag.name(), value, "flag changed");
        if let Err(e) = self.store.persist(&self.current) {
            tracing::warn!(error = %e, flag = flag.name(), "failed to persist flags");
        }
        true
    }

    /// Flip one flag; returns the new value.
    pub fn toggle(&mut self, flag: Flag) -> bool {
        let next = !self.current.get(flag);
        self.update(flag, next);
        next
    }
}

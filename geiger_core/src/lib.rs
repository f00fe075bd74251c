#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core Geiger counter logic (hardware-agnostic).
//!
//! Pulses arrive through `geiger_traits::EdgeSource`; everything downstream
//! of a sampling period goes out through the sink traits in
//! `geiger_traits::sink`.
//!
//! ## Architecture
//!
//! - **Acquisition**: `PulseHandler` (debounce gate + atomic counter) driven
//!   by the `Acquisition` thread (`acquisition`, `debounce`, `counter`)
//! - **Sampling**: fixed-window drain into counts per minute (`sampler`)
//! - **Conversion**: CPM to dose rate through one tube factor (`dose`)
//! - **Smoothing**: history buffer plus simple and exponential averages
//!   (`history`, `averager`)
//! - **Alerts**: strict threshold on the instantaneous sample (`alert`)
//! - **Health**: lost-interrupt heuristic forcing a re-arm (`health`)
//! - **Orchestration**: `Monitor`, its builder, and the `runner` loop
//!
//! ## Concurrency
//!
//! The pulse counter is the only state shared between the acquisition
//! thread and the main loop. It is an `AtomicU32`; the sampler drains it
//! with a single `swap(0)`, so no pulse is lost or counted twice across a
//! window boundary.

pub mod acquisition;
pub mod alert;
pub mod averager;
pub mod builder;
pub mod config;
pub mod console;
pub mod conversions;
pub mod counter;
pub mod debounce;
pub mod dose;
pub mod error;
pub mod flags;
pub mod health;
pub mod history;
pub mod hw_error;
pub mod mocks;
pub mod monitor;
pub mod runner;
pub mod sampler;
pub mod util;

pub use acquisition::{ACQUISITION_THREAD_NAME, Acquisition, AcquisitionStats, PulseHandler};
pub use alert::{AlertDispatcher, AlertOutcome, exceeds};
pub use averager::{AverageKind, Averager, Averages, ExpFilter, Weight, weighted_mean};
pub use builder::MonitorBuilder;
pub use config::{AlertCfg, FilterCfg, HistoryCfg, SamplingCfg, TelemetryCfg, TubeCfg};
pub use console::Command;
pub use counter::PulseCounter;
pub use debounce::{DebounceCfg, DebounceGate, GateOutcome};
pub use dose::{DEFAULT_TUBE_FACTOR, DoseConverter, DoseRate};
pub use flags::{FileFlagStore, Flag, FlagSet, FlagStore, Flags};
pub use health::HealthMonitor;
pub use history::{EmptyPolicy, HistoryBuffer};
pub use monitor::{Monitor, Reading, Snapshot};
pub use runner::{RunEvent, RunLimits, RunSummary};
pub use sampler::{RateMath, RateSample, RateSampler, SampleWindow, rate_per_minute};

//! Application layer - configuration, context wiring and the gate controller

pub mod config;
pub mod context;
pub mod controller;
pub mod pacer;

pub use config::{Config, HardwareBackend, PhotoPolicy};
pub use context::{AppContext, RetentionSettings, Timings};
pub use controller::{GateController, GateState, SHUTDOWN_BEFORE_OPEN};
pub use pacer::{Pacer, ThreadPacer};

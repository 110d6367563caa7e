//! Device sessions and the transaction engine for SmartLamp.
//!
//! A [`DeviceSession`] owns one transport. Every command goes through the
//! [`TransactionEngine`], which sends it, waits for the firmware to settle,
//! and then polls for the matching reply with a bounded number of attempts.
//! Transactions on one session never interleave.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::EngineConfig;
pub use engine::TransactionEngine;
pub use error::{EngineError, Result};
pub use session::{DeviceSession, SessionState};

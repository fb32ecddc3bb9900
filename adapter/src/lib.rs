//! Owns one child process per task: spawns it over a pseudoterminal,
//! routes its byte stream through the parser and classifier, drives the
//! completion enforcer, and reports a uniform lifecycle back to the host
//! through [`overseer_types::TaskCallbacks`].
//!
//! This crate is deliberately the only place that touches a real process
//! or pseudoterminal; everything above it (`overseer-core`) only ever
//! talks to an [`AdapterHandle`].

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod adapter;
mod auth;
mod batcher;
mod config;
mod dispatch;
mod error;
mod process;
mod shell;

pub use adapter::{spawn_adapter, AdapterHandle};
pub use config::{AdapterConfig, WAITING_TIMER_THRESHOLD};
pub use error::AdapterError;

//! rollcall - an offline-tolerant student registration client
//!
//! This crate talks to a school registration service over HTTP and keeps a
//! durable offline queue of writes that could not be delivered, replaying
//! them in order once the service is reachable again.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod logging;
pub mod output;
pub mod storage;

pub use api::{Backend, HttpBackend};
pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::RollcallError;

//! Storage layer for rollcall.
//!
//! SQLite-based persistence for the offline queue and its dead-letter list.

mod database;
mod migrations;

pub use database::Database;

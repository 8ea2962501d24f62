//! Feature implementations for rollcall.

pub mod sync;

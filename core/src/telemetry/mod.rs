//! telemetry/mod.rs
//! Per-chain I/O counters.
//!
//! Counters are plain values owned by the chain; callers take a copy with
//! `Chain::counters()` and may serialize it with serde.

pub mod counters;

pub use counters::*;

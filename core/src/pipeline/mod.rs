//! pipeline/mod.rs
//! Cipher pipelines assembled from chain devices.

pub mod types;
pub mod authenticated;

pub use self::types::*;
pub use self::authenticated::*;

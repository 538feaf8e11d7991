//! tlsio-core
//!
//! Pure Rust filter-chain I/O engine.
//! Devices stack into chains; a cipher pipeline with an optional keyed
//! digest is built on top. No Python, no PyO3, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;
pub mod config;

pub mod crypto;
pub mod telemetry;

// Devices and stacks
pub mod device;
pub mod chain;
pub mod pipeline;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::chain::Chain;
    pub use crate::config::IoConfig;
    pub use crate::crypto::{derive_key, random_bytes, Catalog, Category, CipherMode, Direction, Secret};
    pub use crate::device::{
        Base64Codec, BufferFilter, Capabilities, CipherFilter, CloseFlag, CompressionCodec, ControlOp,
        Device, DeviceError, DeviceHandle, DeviceResult, DigestFilter, FileBacking, HostError,
        HostStream, HostStreamAdapter, MemorySink, Next, NullFilter, NullSink, StdStream,
    };
    pub use crate::pipeline::{AuthenticatedCipher, Lifecycle};
    pub use crate::telemetry::IoCounters;
    pub use crate::types::StreamError;
}

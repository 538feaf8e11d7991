use std::io;

use crate::{
    crypto::{CatalogError, CipherError},
    device::DeviceError,
};

/// Unified stream error covering chain, device, catalog and cipher-pipeline failures.
/// - Ergonomic `From<T>` impls enable `?` across the engine.
/// - `AuthenticationFailure` never carries detail about the mismatch.
#[derive(Debug)]
pub enum StreamError {
    /// The device structurally cannot perform the operation (name of the operation).
    UnsupportedOperation(&'static str),

    /// Backing store, host stream or transient failure.
    Io(io::Error),

    /// Lifecycle violation (closed chain, update before initialise, wrong direction).
    InvalidState(String),

    /// Bad lengths, unknown algorithm names, unknown modes.
    InvalidParameter(String),

    /// MAC mismatch or bad decrypt.
    AuthenticationFailure,

    /// Chain position out of range.
    Index { index: i64, len: usize },
}

impl StreamError {
    /// Translate a device-level error raised while performing `op`.
    pub fn from_device(op: &'static str, e: DeviceError) -> Self {
        match e {
            DeviceError::NotImplemented => StreamError::UnsupportedOperation(op),
            DeviceError::Retry => StreamError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                format!("{op}: device kept asking for a retry"),
            )),
            DeviceError::Failure(msg) => StreamError::Io(io::Error::other(format!("{op}: {msg}"))),
            DeviceError::Io(e) => StreamError::Io(e),
            DeviceError::Cipher(e) => StreamError::from(e),
        }
    }

    pub fn closed() -> Self {
        StreamError::InvalidState("already closed".into())
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::UnsupportedOperation(op) => write!(f, "unsupported operation: {}", op),
            StreamError::Io(e) => write!(f, "I/O error: {}", e),
            StreamError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            StreamError::InvalidParameter(msg) => write!(f, "invalid parameter: {}", msg),
            StreamError::AuthenticationFailure => write!(f, "invalid decrypt"),
            StreamError::Index { index, len } =>
                write!(f, "chain index out of range: {} (chain holds {} devices)", index, len),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(e: io::Error) -> Self {
        StreamError::Io(e)
    }
}

impl From<DeviceError> for StreamError {
    fn from(e: DeviceError) -> Self {
        StreamError::from_device("device operation", e)
    }
}

impl From<CipherError> for StreamError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::BadDecrypt => StreamError::AuthenticationFailure,
            CipherError::NotInitialised => StreamError::InvalidState(e.to_string()),
            CipherError::Finalised => StreamError::InvalidState(e.to_string()),
            CipherError::InvalidKeyLen { .. }
            | CipherError::InvalidIvLen { .. }
            | CipherError::NotBlockAligned { .. }
            | CipherError::Unsupported(_) => StreamError::InvalidParameter(e.to_string()),
        }
    }
}

impl From<CatalogError> for StreamError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Closed => StreamError::InvalidState(e.to_string()),
            CatalogError::UnknownCipher(_) | CatalogError::UnknownDigest(_) =>
                StreamError::InvalidParameter(e.to_string()),
        }
    }
}

impl From<StreamError> for io::Error {
    fn from(e: StreamError) -> Self {
        let kind = match &e {
            StreamError::Io(_) => {
                if let StreamError::Io(inner) = e {
                    return inner;
                }
                io::ErrorKind::Other
            }
            StreamError::UnsupportedOperation(_) => io::ErrorKind::Unsupported,
            StreamError::InvalidParameter(_) | StreamError::Index { .. } => io::ErrorKind::InvalidInput,
            StreamError::AuthenticationFailure => io::ErrorKind::InvalidData,
            StreamError::InvalidState(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e.to_string())
    }
}

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use num_enum::TryFromPrimitive;

use crate::constants::{close, codes, ctrl};
use crate::crypto::CipherError;

/// Error values returned by device callbacks.
///
/// `NotImplemented` is distinct from `Failure`: the first means the device
/// structurally cannot do the operation, the second that it tried and failed.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("operation not implemented by this device")]
    NotImplemented,
    #[error("device asked the caller to retry")]
    Retry,
    #[error("{0}")]
    Failure(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Cipher(#[from] CipherError),
}

impl DeviceError {
    pub fn failure(msg: impl Into<String>) -> Self {
        DeviceError::Failure(msg.into())
    }

    /// Native return code for this error.
    pub fn code(&self) -> i64 {
        match self {
            DeviceError::NotImplemented => codes::NOT_IMPLEMENTED,
            _ => codes::ERROR,
        }
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, DeviceError::NotImplemented)
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Closed set of control operations understood by devices.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum ControlOp {
    Reset    = ctrl::RESET,
    Eof      = ctrl::EOF,
    GetClose = ctrl::GET_CLOSE,
    SetClose = ctrl::SET_CLOSE,
    Pending  = ctrl::PENDING,
    Flush    = ctrl::FLUSH,
    Dup      = ctrl::DUP,
    WPending = ctrl::WPENDING,
    FileSeek = ctrl::FILE_SEEK,
    FileTell = ctrl::FILE_TELL,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CloseFlag {
    NoClose,
    #[default]
    Close,
}

impl CloseFlag {
    pub fn to_raw(self) -> i64 {
        match self {
            CloseFlag::NoClose => close::NOCLOSE,
            CloseFlag::Close => close::CLOSE,
        }
    }

    /// Any non-zero value means "close".
    pub fn from_raw(raw: i64) -> Self {
        if raw == close::NOCLOSE { CloseFlag::NoClose } else { CloseFlag::Close }
    }
}

bitflags! {
    /// What a device (or a whole chain) can do.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const READ  = 0b0000_0001;
        const WRITE = 0b0000_0010;
        const SEEK  = 0b0000_0100;
    }
}

/// Process-unique device identity, assigned at handle creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl DeviceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DeviceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

//! device/host.rs
//! Adapter that lets a host-language stream object act as a chain terminal.
//!
//! The host side implements `HostStream`; every method has an "unsupported"
//! default so partial host objects still work. The adapter is the only place
//! where failures are turned into device return values: host errors and
//! panics never unwind past it.

use std::io::{Read, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use crate::constants::{close, types};
use crate::device::{Capabilities, ControlOp, Device, DeviceError, DeviceResult, Next};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host stream does not support {0}")]
    Unsupported(&'static str),
    #[error("host stream raised: {0}")]
    Raised(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type HostResult<T> = Result<T, HostError>;

/// Duck-typed stream provided by the host.
pub trait HostStream: Send {
    fn describe(&self) -> String {
        "<host stream>".to_string()
    }

    fn write(&mut self, _data: &[u8]) -> HostResult<usize> {
        Err(HostError::Unsupported("write"))
    }

    /// Up to `len` bytes; empty at end of stream.
    fn read(&mut self, _len: usize) -> HostResult<Vec<u8>> {
        Err(HostError::Unsupported("read"))
    }

    fn supports_readinto(&self) -> bool {
        false
    }

    fn readinto(&mut self, _buf: &mut [u8]) -> HostResult<usize> {
        Err(HostError::Unsupported("readinto"))
    }

    fn flush(&mut self) -> HostResult<()> {
        Err(HostError::Unsupported("flush"))
    }

    fn seek(&mut self, _pos: u64) -> HostResult<u64> {
        Err(HostError::Unsupported("seek"))
    }

    fn tell(&mut self) -> HostResult<u64> {
        Err(HostError::Unsupported("tell"))
    }
}

/// `HostStream` over any Rust `Read + Write + Seek` value.
#[derive(Debug, Default)]
pub struct StdStream<T>(pub T);

impl<T> StdStream<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Read + Write + Seek + Send> HostStream for StdStream<T> {
    fn describe(&self) -> String {
        format!("<std stream {}>", std::any::type_name::<T>())
    }

    fn write(&mut self, data: &[u8]) -> HostResult<usize> {
        Ok(self.0.write(data)?)
    }

    fn read(&mut self, len: usize) -> HostResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let n = self.0.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    fn supports_readinto(&self) -> bool {
        true
    }

    fn readinto(&mut self, buf: &mut [u8]) -> HostResult<usize> {
        Ok(self.0.read(buf)?)
    }

    fn flush(&mut self) -> HostResult<()> {
        Ok(self.0.flush()?)
    }

    fn seek(&mut self, pos: u64) -> HostResult<u64> {
        Ok(self.0.seek(SeekFrom::Start(pos))?)
    }

    fn tell(&mut self) -> HostResult<u64> {
        Ok(self.0.stream_position()?)
    }
}

/// Per-handle bookkeeping kept next to the host dispatch.
#[derive(Debug, Default, Clone)]
pub struct HandleState {
    pub calls: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

/// Handle state and host dispatch in one allocation, released together.
struct HostBinding<S: ?Sized> {
    handle: HandleState,
    stream: S,
}

pub struct HostStreamAdapter {
    binding: Box<HostBinding<dyn HostStream>>,
}

impl HostStreamAdapter {
    pub fn new<S: HostStream + 'static>(stream: S) -> Self {
        let binding: Box<HostBinding<dyn HostStream>> =
            Box::new(HostBinding { handle: HandleState::default(), stream });
        Self { binding }
    }

    pub fn describe(&self) -> String {
        self.binding.stream.describe()
    }

    pub fn handle(&self) -> &HandleState {
        &self.binding.handle
    }

    /// Runs one host call, containing errors and panics.
    fn call<T>(
        &mut self,
        what: &'static str,
        f: impl FnOnce(&mut dyn HostStream) -> HostResult<T>,
    ) -> DeviceResult<T> {
        let binding = &mut *self.binding;
        binding.handle.calls += 1;
        let stream = &mut binding.stream;
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(stream))) {
            Ok(result) => result,
            Err(_) => Err(HostError::Raised(format!("panic during {what}"))),
        };
        outcome.map_err(|e| {
            let msg = e.to_string();
            warn!(op = what, error = %msg, "host stream call failed");
            binding.handle.failures += 1;
            binding.handle.last_error = Some(msg.clone());
            match e {
                HostError::Io(io) => DeviceError::Io(io),
                _ => DeviceError::Failure(msg),
            }
        })
    }
}

impl std::fmt::Debug for HostStreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostStreamAdapter")
            .field("stream", &self.describe())
            .field("handle", &self.binding.handle)
            .finish()
    }
}

impl Device for HostStreamAdapter {
    fn kind(&self) -> i32 {
        types::HOST
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn write(&mut self, _next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        let n = self.call("write", |s| s.write(buf))?;
        Ok(n.min(buf.len()))
    }

    fn read(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        if self.binding.stream.supports_readinto() {
            let n = self.call("readinto", |s| s.readinto(buf))?;
            return Ok(n.min(buf.len()));
        }
        let len = buf.len();
        let data = self.call("read", |s| s.read(len))?;
        let n = data.len().min(len);
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }

    fn control(&mut self, _next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Flush => self.call("flush", |s| s.flush()).map(|_| 1),
            ControlOp::Reset => self.call("seek", |s| s.seek(0)).map(|_| 0),
            ControlOp::FileSeek => {
                let pos = u64::try_from(arg)
                    .map_err(|_| DeviceError::failure(format!("negative seek offset {arg}")))?;
                self.call("seek", |s| s.seek(pos)).map(|p| p as i64)
            }
            ControlOp::FileTell => self.call("tell", |s| s.tell()).map(|p| p as i64),
            ControlOp::GetClose => Ok(close::NOCLOSE),
            ControlOp::SetClose | ControlOp::Dup => Ok(1),
            ControlOp::Eof | ControlOp::Pending | ControlOp::WPending => Ok(0),
        }
    }

    device_any!();
}

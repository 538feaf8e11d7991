//! device/mod.rs
//! The device contract and the handle that owns a device inside a chain.
//!
//! A device is either a source/sink (memory, file, descriptor, host stream,
//! null) or a filter that transforms bytes on their way to the rest of the
//! stack. Every callback receives `Next`, a view of the devices below it;
//! sources and sinks simply ignore it.
//!
//! Unimplemented callbacks return `DeviceError::NotImplemented` through the
//! default trait methods. The chain façade turns that into
//! `StreamError::UnsupportedOperation`.

use std::any::Any;
use std::fmt;

use crate::constants::{types as bio_types, DEFAULT_WRITE_RETRIES};
use crate::utils::{enum_name_or_hex, kind_name};

/// Implements the `as_any` pair for a concrete device type.
macro_rules! device_any {
    () => {
        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

pub mod types;
pub use self::types::*;

pub mod null;
pub mod memory;
pub mod file;
pub mod b64;
pub mod zlib;
pub mod md;
pub mod enc;
pub mod buffer;
pub mod host;

pub use self::null::*;
pub use self::memory::*;
pub use self::file::*;
pub use self::b64::*;
pub use self::zlib::*;
pub use self::md::*;
pub use self::enc::*;
pub use self::buffer::*;
pub use self::host::*;

pub trait Device: Any + Send {
    /// `BIO_TYPE_*` code.
    fn kind(&self) -> i32;

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, _next: Next<'_>, _buf: &[u8]) -> DeviceResult<usize> {
        Err(DeviceError::NotImplemented)
    }

    /// Returns 0 at end of stream.
    fn read(&mut self, _next: Next<'_>, _buf: &mut [u8]) -> DeviceResult<usize> {
        Err(DeviceError::NotImplemented)
    }

    fn puts(&mut self, _next: Next<'_>, _line: &[u8]) -> DeviceResult<usize> {
        Err(DeviceError::NotImplemented)
    }

    /// Fills `buf` up to and including the first newline, or until full.
    fn gets(&mut self, _next: Next<'_>, _buf: &mut [u8]) -> DeviceResult<usize> {
        Err(DeviceError::NotImplemented)
    }

    fn control(&mut self, _next: Next<'_>, _op: ControlOp, _arg: i64) -> DeviceResult<i64> {
        Err(DeviceError::NotImplemented)
    }

    /// False when `gets` answers with something other than the next line of
    /// the stream, so repeated calls never reach an end.
    fn yields_lines(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The devices below the one being called, nearest first.
pub struct Next<'a> {
    rest: &'a mut [DeviceHandle],
    write_retries: usize,
}

impl<'a> Next<'a> {
    pub fn new(rest: &'a mut [DeviceHandle]) -> Self {
        Self::with_retries(rest, DEFAULT_WRITE_RETRIES)
    }

    /// `write_retries` bounds the `Retry` signals `write_all` tolerates.
    pub fn with_retries(rest: &'a mut [DeviceHandle], write_retries: usize) -> Self {
        Self { rest, write_retries }
    }

    /// No devices below; used when calling a device on its own.
    pub fn none() -> Next<'static> {
        Next { rest: Default::default(), write_retries: DEFAULT_WRITE_RETRIES }
    }

    pub fn write_retries(&self) -> usize {
        self.write_retries
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rest.len()
    }

    pub fn reborrow(&mut self) -> Next<'_> {
        Next { rest: &mut *self.rest, write_retries: self.write_retries }
    }

    fn split(&mut self) -> DeviceResult<(&mut DeviceHandle, Next<'_>)> {
        let write_retries = self.write_retries;
        match self.rest.split_first_mut() {
            Some((head, tail)) => Ok((head, Next { rest: tail, write_retries })),
            None => Err(DeviceError::failure("no next device in chain")),
        }
    }

    pub fn write(&mut self, buf: &[u8]) -> DeviceResult<usize> {
        let (head, next) = self.split()?;
        head.device.write(next, buf)
    }

    /// Writes all of `buf`, retrying `Retry` a bounded number of times.
    pub fn write_all(&mut self, mut buf: &[u8]) -> DeviceResult<()> {
        let mut retries = 0;
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => return Err(DeviceError::failure("next device accepted no bytes")),
                Ok(n) => {
                    buf = &buf[n.min(buf.len())..];
                    retries = 0;
                }
                Err(DeviceError::Retry) if retries < self.write_retries => retries += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        let (head, next) = self.split()?;
        head.device.read(next, buf)
    }

    pub fn puts(&mut self, line: &[u8]) -> DeviceResult<usize> {
        let (head, next) = self.split()?;
        head.device.puts(next, line)
    }

    pub fn gets(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        let (head, next) = self.split()?;
        head.device.gets(next, buf)
    }

    pub fn control(&mut self, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        let (head, next) = self.split()?;
        head.device.control(next, op, arg)
    }

    /// Filter forwarding: with nothing below, the answer is 0.
    pub fn forward_control(&mut self, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        if self.rest.is_empty() {
            return Ok(0);
        }
        self.control(op, arg)
    }

    /// Intersection of the capabilities of every device below.
    pub fn capabilities(&self) -> Capabilities {
        self.rest
            .iter()
            .fold(Capabilities::all(), |acc, d| acc & d.device.capabilities())
    }
}

/// Owns one device and gives it an identity.
pub struct DeviceHandle {
    id: DeviceId,
    device: Box<dyn Device>,
}

impl DeviceHandle {
    pub fn new<D: Device>(device: D) -> Self {
        Self { id: DeviceId::next(), device: Box::new(device) }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn kind(&self) -> i32 {
        self.device.kind()
    }

    pub fn name(&self) -> &'static str {
        kind_name(self.kind())
    }

    pub fn is_filter(&self) -> bool {
        self.kind() & bio_types::FILTER != 0
    }

    pub fn capabilities(&self) -> Capabilities {
        self.device.capabilities()
    }

    pub fn yields_lines(&self) -> bool {
        self.device.yields_lines()
    }

    pub fn downcast_ref<T: Device>(&self) -> Option<&T> {
        self.device.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Device>(&mut self) -> Option<&mut T> {
        self.device.as_any_mut().downcast_mut::<T>()
    }

    pub fn write(&mut self, buf: &[u8]) -> DeviceResult<usize> {
        self.device.write(Next::none(), buf)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        self.device.read(Next::none(), buf)
    }

    pub fn puts(&mut self, line: &[u8]) -> DeviceResult<usize> {
        self.device.puts(Next::none(), line)
    }

    pub fn gets(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        self.device.gets(Next::none(), buf)
    }

    pub fn control(&mut self, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        self.device.control(Next::none(), op, arg)
    }

    /// Control with a raw native command code. Codes outside `ControlOp`
    /// are a generic failure, never `NotImplemented`.
    pub fn control_raw(&mut self, cmd: i32, arg: i64) -> DeviceResult<i64> {
        let op = ControlOp::try_from(cmd).map_err(|_| {
            DeviceError::failure(format!(
                "unknown control command {}",
                enum_name_or_hex::<ControlOp>(cmd)
            ))
        })?;
        self.control(op, arg)
    }
}

impl<D: Device> From<D> for DeviceHandle {
    fn from(device: D) -> Self {
        DeviceHandle::new(device)
    }
}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id.get())
            .field("kind", &format_args!("0x{:x}", self.kind()))
            .field("name", &self.name())
            .finish()
    }
}

//! chain/stack.rs
//! Ordered stack of devices: filters on top, a source/sink at the bottom.
//!
//! Index 0 is the head; operations enter there and flow towards the
//! terminal. The chain owns every device; `pop` hands ownership back.

use std::path::Path;

use tracing::debug;

use crate::config::IoConfig;
use crate::device::{
    Capabilities, DeviceHandle, FileBacking, HostStream, HostStreamAdapter, MemorySink, Next,
    NullSink,
};
use crate::telemetry::IoCounters;
use crate::types::StreamError;

#[derive(Debug)]
pub struct Chain {
    pub(crate) devices: Vec<DeviceHandle>,
    pub(crate) config: IoConfig,
    pub(crate) counters: IoCounters,
    closed: bool,
}

impl Chain {
    /// Chain holding only `terminal`.
    pub fn new(terminal: impl Into<DeviceHandle>) -> Self {
        Self::build(terminal.into(), IoConfig::default())
    }

    /// Rejects a config `IoConfig::validate` would refuse.
    pub fn with_config(terminal: impl Into<DeviceHandle>, config: IoConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self::build(terminal.into(), config))
    }

    fn build(terminal: DeviceHandle, config: IoConfig) -> Self {
        debug!(terminal = terminal.name(), id = terminal.id().get(), "chain created");
        Self {
            devices: vec![terminal],
            config,
            counters: IoCounters::default(),
            closed: false,
        }
    }

    /// Writable memory sink.
    pub fn memory() -> Self {
        Self::new(MemorySink::new())
    }

    /// Read-only memory source over `data`.
    pub fn memory_from(data: impl Into<bytes::Bytes>) -> Self {
        Self::new(MemorySink::from_bytes(data))
    }

    pub fn null() -> Self {
        Self::new(NullSink::new())
    }

    pub fn file(path: impl AsRef<Path>, mode: &str) -> Result<Self, StreamError> {
        Ok(Self::new(FileBacking::open(path, mode)?))
    }

    #[cfg(unix)]
    pub fn descriptor(fd: std::os::fd::OwnedFd, close: crate::device::CloseFlag) -> Self {
        Self::new(crate::device::DescriptorBacking::new(fd, close))
    }

    pub fn host<S: HostStream + 'static>(stream: S) -> Self {
        Self::new(HostStreamAdapter::new(stream))
    }

    pub fn config(&self) -> &IoConfig {
        &self.config
    }

    pub fn counters(&self) -> IoCounters {
        self.counters
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StreamError> {
        if self.closed {
            Err(StreamError::closed())
        } else {
            Ok(())
        }
    }

    /// The whole stack, head first, ready for dispatch.
    pub(crate) fn stack(&mut self) -> Result<Next<'_>, StreamError> {
        self.ensure_open()?;
        if self.devices.is_empty() {
            return Err(StreamError::UnsupportedOperation("empty chain"));
        }
        Ok(Next::with_retries(&mut self.devices, self.config.write_retries))
    }

    /// `device` becomes the new head.
    pub fn push(&mut self, device: impl Into<DeviceHandle>) -> Result<(), StreamError> {
        self.ensure_open()?;
        let device = device.into();
        debug!(device = device.name(), id = device.id().get(), depth = self.devices.len() + 1, "push");
        self.devices.insert(0, device);
        Ok(())
    }

    /// Removes the head and returns it.
    pub fn pop(&mut self) -> Result<DeviceHandle, StreamError> {
        self.ensure_open()?;
        if self.devices.is_empty() {
            return Err(StreamError::InvalidState("pop from an empty chain".into()));
        }
        let device = self.devices.remove(0);
        debug!(device = device.name(), id = device.id().get(), depth = self.devices.len(), "pop");
        Ok(device)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Device `n` hops below the head.
    pub fn index(&self, n: usize) -> Result<&DeviceHandle, StreamError> {
        self.ensure_open()?;
        let err = self.out_of_range(i64::try_from(n).unwrap_or(i64::MAX));
        self.devices.get(n).ok_or(err)
    }

    pub fn index_mut(&mut self, n: usize) -> Result<&mut DeviceHandle, StreamError> {
        self.ensure_open()?;
        let err = self.out_of_range(i64::try_from(n).unwrap_or(i64::MAX));
        self.devices.get_mut(n).ok_or(err)
    }

    /// Signed `index`; negative positions are out of range, not counted
    /// from the terminal.
    pub fn get(&self, n: i64) -> Result<&DeviceHandle, StreamError> {
        match usize::try_from(n) {
            Ok(n) => self.index(n),
            Err(_) => {
                self.ensure_open()?;
                Err(self.out_of_range(n))
            }
        }
    }

    fn out_of_range(&self, index: i64) -> StreamError {
        StreamError::Index { index, len: self.devices.len() }
    }

    pub fn head(&self) -> Result<&DeviceHandle, StreamError> {
        self.index(0)
    }

    pub fn terminal(&self) -> Result<&DeviceHandle, StreamError> {
        self.index(self.devices.len().saturating_sub(1))
    }

    pub fn terminal_mut(&mut self) -> Result<&mut DeviceHandle, StreamError> {
        let last = self.devices.len().saturating_sub(1);
        self.index_mut(last)
    }

    /// Type codes, terminal first.
    pub fn kinds(&self) -> Vec<i32> {
        self.devices.iter().rev().map(DeviceHandle::kind).collect()
    }

    /// Intersection of every device's capabilities.
    pub fn capabilities(&self) -> Result<Capabilities, StreamError> {
        self.ensure_open()?;
        if self.devices.is_empty() {
            return Ok(Capabilities::empty());
        }
        Ok(self
            .devices
            .iter()
            .fold(Capabilities::all(), |acc, d| acc & d.capabilities()))
    }

    pub fn is_readable(&self) -> Result<bool, StreamError> {
        Ok(self.capabilities()?.contains(Capabilities::READ))
    }

    pub fn is_writable(&self) -> Result<bool, StreamError> {
        Ok(self.capabilities()?.contains(Capabilities::WRITE))
    }

    pub fn is_seekable(&self) -> Result<bool, StreamError> {
        Ok(self.capabilities()?.contains(Capabilities::SEEK))
    }

    /// Releases every device, head first. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for device in self.devices.drain(..) {
            debug!(device = device.name(), id = device.id().get(), "release");
        }
        debug!(counters = %self.counters.to_json(), "chain closed");
    }
}

impl Drop for Chain {
    fn drop(&mut self) {
        self.close();
    }
}

//! device/null.rs
//! Null filter (transparent passthrough) and null sink (absorbs writes).

use crate::constants::types;
use crate::device::{Capabilities, ControlOp, Device, DeviceError, DeviceResult, Next};

/// Forwards every operation unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFilter;

impl NullFilter {
    pub fn new() -> Self {
        NullFilter
    }
}

impl Device for NullFilter {
    fn kind(&self) -> i32 {
        types::NULL_FILTER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        next.write(buf)
    }

    fn read(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        next.read(buf)
    }

    fn puts(&mut self, mut next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        next.puts(line)
    }

    fn gets(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        next.gets(buf)
    }

    fn control(&mut self, mut next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        next.forward_control(op, arg)
    }

    device_any!();
}

/// Source/sink that discards writes and is always at end of stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        NullSink
    }
}

impl Device for NullSink {
    fn kind(&self) -> i32 {
        types::NULL
    }

    fn write(&mut self, _next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        Ok(buf.len())
    }

    fn read(&mut self, _next: Next<'_>, _buf: &mut [u8]) -> DeviceResult<usize> {
        Ok(0)
    }

    fn puts(&mut self, _next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        Ok(line.len())
    }

    fn gets(&mut self, _next: Next<'_>, _buf: &mut [u8]) -> DeviceResult<usize> {
        Ok(0)
    }

    fn control(&mut self, _next: Next<'_>, op: ControlOp, _arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Reset | ControlOp::Eof | ControlOp::SetClose | ControlOp::Flush | ControlOp::Dup => Ok(1),
            ControlOp::GetClose | ControlOp::Pending | ControlOp::WPending => Ok(0),
            // nothing to position within
            ControlOp::FileSeek | ControlOp::FileTell => Err(DeviceError::NotImplemented),
        }
    }

    device_any!();
}

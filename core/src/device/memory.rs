//! device/memory.rs
//! In-memory source/sink.
//!
//! Two modes:
//! - writable: an append buffer with a read cursor. `Reset` clears it, `Tell`
//!   reports the cursor and `Seek` moves it anywhere within the buffer.
//! - read-only: built over fixed bytes that are consumed linearly. `Reset`,
//!   `Seek` and `Tell` fail.

use bytes::{Buf, Bytes, BytesMut};

use crate::constants::types;
use crate::device::{Capabilities, CloseFlag, ControlOp, Device, DeviceError, DeviceResult, Next};

#[derive(Debug)]
enum Store {
    Writable { data: BytesMut, cursor: usize },
    ReadOnly(Bytes),
}

#[derive(Debug)]
pub struct MemorySink {
    store: Store,
    close: CloseFlag,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            store: Store::Writable { data: BytesMut::new(), cursor: 0 },
            close: CloseFlag::Close,
        }
    }

    /// Read-only sink over `data`.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self { store: Store::ReadOnly(data.into()), close: CloseFlag::Close }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.store, Store::ReadOnly(_))
    }

    /// Bytes not yet read.
    pub fn unread(&self) -> &[u8] {
        match &self.store {
            Store::Writable { data, cursor } => &data[*cursor..],
            Store::ReadOnly(bytes) => bytes,
        }
    }

    /// Takes every unread byte, leaving the sink empty.
    pub fn drain(&mut self) -> Bytes {
        match &mut self.store {
            Store::Writable { data, cursor } => {
                let _consumed = data.split_to(*cursor);
                *cursor = 0;
                data.split().freeze()
            }
            Store::ReadOnly(bytes) => std::mem::take(bytes),
        }
    }

    /// Discards all content (writable mode only).
    pub fn clear(&mut self) -> DeviceResult<()> {
        match &mut self.store {
            Store::Writable { data, cursor } => {
                data.clear();
                *cursor = 0;
                Ok(())
            }
            Store::ReadOnly(_) => Err(DeviceError::failure("cannot reset a read-only memory buffer")),
        }
    }

    fn take_into(&mut self, buf: &mut [u8]) -> usize {
        match &mut self.store {
            Store::Writable { data, cursor } => {
                let n = buf.len().min(data.len() - *cursor);
                buf[..n].copy_from_slice(&data[*cursor..*cursor + n]);
                *cursor += n;
                n
            }
            Store::ReadOnly(bytes) => {
                let n = buf.len().min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                bytes.advance(n);
                n
            }
        }
    }
}

impl Device for MemorySink {
    fn kind(&self) -> i32 {
        types::MEM
    }

    fn capabilities(&self) -> Capabilities {
        if self.is_read_only() {
            Capabilities::READ
        } else {
            Capabilities::all()
        }
    }

    fn write(&mut self, _next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        match &mut self.store {
            Store::Writable { data, .. } => {
                data.extend_from_slice(buf);
                Ok(buf.len())
            }
            Store::ReadOnly(_) => Err(DeviceError::failure("write to a read-only memory buffer")),
        }
    }

    fn read(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        Ok(self.take_into(buf))
    }

    fn puts(&mut self, next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.write(next, line)
    }

    fn gets(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        let unread = self.unread();
        let window = buf.len().min(unread.len());
        let n = match unread[..window].iter().position(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => window,
        };
        Ok(self.take_into(&mut buf[..n]))
    }

    fn control(&mut self, _next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Reset => self.clear().map(|_| 1),
            ControlOp::Eof => Ok(self.unread().is_empty() as i64),
            ControlOp::Pending => Ok(self.unread().len() as i64),
            ControlOp::WPending => Ok(0),
            ControlOp::Flush | ControlOp::Dup => Ok(1),
            ControlOp::GetClose => Ok(self.close.to_raw()),
            ControlOp::SetClose => {
                self.close = CloseFlag::from_raw(arg);
                Ok(1)
            }
            ControlOp::FileSeek => match &mut self.store {
                Store::Writable { data, cursor } => {
                    let target = usize::try_from(arg)
                        .ok()
                        .filter(|&t| t <= data.len())
                        .ok_or_else(|| DeviceError::failure(format!("seek to {arg} outside buffer")))?;
                    *cursor = target;
                    Ok(target as i64)
                }
                Store::ReadOnly(_) => Err(DeviceError::failure("cannot seek a read-only memory buffer")),
            },
            ControlOp::FileTell => match &self.store {
                Store::Writable { cursor, .. } => Ok(*cursor as i64),
                Store::ReadOnly(_) => Err(DeviceError::failure("cannot tell a read-only memory buffer")),
            },
        }
    }

    device_any!();
}

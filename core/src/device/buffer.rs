//! device/buffer.rs
//! Buffering filter: coalesces writes into blocks and reads ahead.

use crate::config::IoConfig;
use crate::constants::{types, DEFAULT_BUFFER_SIZE};
use crate::device::{Capabilities, ControlOp, Device, DeviceResult, Next};

#[derive(Debug)]
pub struct BufferFilter {
    size: usize,
    wbuf: Vec<u8>,
    rbuf: Vec<u8>,
    rpos: usize,
}

impl Default for BufferFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferFilter {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_config(config: &IoConfig) -> Self {
        Self::with_size(config.buffer_size)
    }

    /// A zero size is raised to one byte.
    pub fn with_size(size: usize) -> Self {
        let size = size.max(1);
        Self { size, wbuf: Vec::with_capacity(size), rbuf: Vec::new(), rpos: 0 }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Drops buffered data in both directions without forwarding it.
    pub fn clear(&mut self) {
        self.wbuf.clear();
        self.rbuf.clear();
        self.rpos = 0;
    }

    fn readable(&self) -> &[u8] {
        &self.rbuf[self.rpos..]
    }

    fn refill(&mut self, next: &mut Next<'_>) -> DeviceResult<usize> {
        self.rbuf.resize(self.size, 0);
        self.rpos = 0;
        match next.read(&mut self.rbuf) {
            Ok(n) => {
                self.rbuf.truncate(n);
                Ok(n)
            }
            Err(e) => {
                self.rbuf.clear();
                Err(e)
            }
        }
    }

    fn take(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.readable().len());
        buf[..n].copy_from_slice(&self.rbuf[self.rpos..self.rpos + n]);
        self.rpos += n;
        n
    }

    fn flush_writes(&mut self, next: &mut Next<'_>) -> DeviceResult<()> {
        if !self.wbuf.is_empty() {
            next.write_all(&self.wbuf)?;
            self.wbuf.clear();
        }
        Ok(())
    }
}

impl Device for BufferFilter {
    fn kind(&self) -> i32 {
        types::BUFFER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        let mut input = buf;
        while !input.is_empty() {
            if self.wbuf.is_empty() && input.len() >= self.size {
                next.write_all(input)?;
                break;
            }
            let take = (self.size - self.wbuf.len()).min(input.len());
            self.wbuf.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.wbuf.len() == self.size {
                self.flush_writes(&mut next)?;
            }
        }
        Ok(buf.len())
    }

    fn read(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        if !self.readable().is_empty() {
            return Ok(self.take(buf));
        }
        if buf.len() >= self.size {
            return next.read(buf);
        }
        if self.refill(&mut next)? == 0 {
            return Ok(0);
        }
        Ok(self.take(buf))
    }

    fn puts(&mut self, next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.write(next, line)
    }

    fn gets(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.readable().is_empty() && self.refill(&mut next)? == 0 {
                break;
            }
            let room = buf.len() - filled;
            let avail = self.readable();
            let (n, done) = match avail[..room.min(avail.len())].iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (room.min(avail.len()), false),
            };
            filled += self.take(&mut buf[filled..filled + n]);
            if done {
                break;
            }
        }
        Ok(filled)
    }

    fn control(&mut self, mut next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Flush => {
                self.flush_writes(&mut next)?;
                next.forward_control(op, arg)
            }
            ControlOp::Reset => {
                self.clear();
                next.forward_control(op, arg)
            }
            ControlOp::Pending => Ok(self.readable().len() as i64 + next.forward_control(op, arg)?),
            ControlOp::WPending => Ok(self.wbuf.len() as i64 + next.forward_control(op, arg)?),
            ControlOp::FileSeek => {
                self.flush_writes(&mut next)?;
                self.rbuf.clear();
                self.rpos = 0;
                next.forward_control(op, arg)
            }
            // the device below is ahead of the caller by what is still buffered
            ControlOp::FileTell => {
                let pos = next.forward_control(op, arg)?;
                Ok((pos - self.readable().len() as i64).max(0))
            }
            ControlOp::Eof => {
                if self.readable().is_empty() {
                    next.forward_control(op, arg)
                } else {
                    Ok(0)
                }
            }
            _ => next.forward_control(op, arg),
        }
    }

    device_any!();
}

//! chain/io.rs
//! Stream façade over a chain: the file-like surface callers use.
//!
//! Every call first checks the chain is open, then dispatches from the head.
//! Device errors are translated once here: `NotImplemented` becomes
//! `UnsupportedOperation`, the rest keep their meaning.

use std::io::{self, SeekFrom};

use tracing::{trace, warn};

use crate::chain::Chain;
use crate::device::{ControlOp, DeviceError};
use crate::types::StreamError;

fn lift(op: &'static str) -> impl Fn(DeviceError) -> StreamError {
    move |e| StreamError::from_device(op, e)
}

impl Chain {
    /// Fills `buf` from the head; 0 means end of stream.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let n = self.stack()?.read(buf).map_err(lift("read"))?;
        self.counters.add_read(n);
        Ok(n)
    }

    /// Up to `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>, StreamError> {
        let mut buf = vec![0u8; n];
        let got = self.read_into(&mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }

    /// Everything until end of stream.
    pub fn read_all(&mut self) -> Result<Vec<u8>, StreamError> {
        let mut out = Vec::new();
        let mut chunk = vec![0u8; self.config.read_chunk];
        loop {
            let n = self.read_into(&mut chunk)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    }

    /// One line including its newline, at most `limit` bytes (the configured
    /// maximum when `None`). Empty at end of stream.
    pub fn read_line(&mut self, limit: Option<usize>) -> Result<Vec<u8>, StreamError> {
        let mut remaining = limit.unwrap_or(self.config.max_line);
        let mut line = Vec::new();
        let mut use_gets = true;

        while remaining > 0 {
            let want = if use_gets { remaining.min(self.config.read_chunk) } else { 1 };
            let mut buf = vec![0u8; want];
            let got = if use_gets {
                let result = self.stack()?.gets(&mut buf);
                match result {
                    Err(DeviceError::NotImplemented) => {
                        trace!("gets not implemented, reading byte by byte");
                        use_gets = false;
                        continue;
                    }
                    other => other.map_err(lift("readline"))?,
                }
            } else {
                self.stack()?.read(&mut buf).map_err(lift("readline"))?
            };

            line.extend_from_slice(&buf[..got]);
            remaining -= got.min(remaining);
            if got < want || line.last() == Some(&b'\n') {
                break;
            }
        }

        if !line.is_empty() {
            self.counters.add_line_read(line.len());
        }
        Ok(line)
    }

    /// Lines until one comes back empty or `hint` bytes have been read.
    /// A head whose `gets` is not line-oriented (a digest) answers once.
    pub fn read_lines(&mut self, hint: Option<usize>) -> Result<Vec<Vec<u8>>, StreamError> {
        if self.devices.first().is_some_and(|head| !head.yields_lines()) {
            let line = self.read_line(None)?;
            return Ok(if line.is_empty() { Vec::new() } else { vec![line] });
        }
        let mut budget = hint.filter(|&h| h > 0).unwrap_or(usize::MAX);
        let mut lines = Vec::new();
        while budget > 0 {
            match self.read_line(None) {
                Ok(line) if line.is_empty() => break,
                Ok(line) => {
                    budget = budget.saturating_sub(line.len());
                    lines.push(line);
                }
                Err(e) if lines.is_empty() => return Err(e),
                Err(e) => {
                    warn!(error = %e, lines = lines.len(), "read_lines stopped early");
                    break;
                }
            }
        }
        Ok(lines)
    }

    /// Writes all of `data`, retrying transient refusals.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, StreamError> {
        self.ensure_open()?;
        let retries = self.config.write_retries;
        let mut offset = 0;
        let mut attempts = 0;
        while offset < data.len() {
            let result = self.stack()?.write(&data[offset..]);
            match result {
                Ok(0) => {
                    return Err(StreamError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "device accepted no bytes",
                    )))
                }
                Ok(n) => {
                    offset += n.min(data.len() - offset);
                    attempts = 0;
                }
                Err(DeviceError::Retry) if attempts < retries => {
                    attempts += 1;
                    self.counters.add_retry();
                }
                Err(e) => return Err(StreamError::from_device("write", e)),
            }
        }
        self.counters.add_write(data.len());
        Ok(data.len())
    }

    pub fn write_lines<I>(&mut self, lines: I) -> Result<(), StreamError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for line in lines {
            self.write(line.as_ref())?;
            self.counters.add_line_written();
        }
        Ok(())
    }

    pub fn control(&mut self, op: ControlOp, arg: i64) -> Result<i64, StreamError> {
        self.stack()?.control(op, arg).map_err(lift("control"))
    }

    pub fn flush(&mut self) -> Result<(), StreamError> {
        self.control(ControlOp::Flush, 0)?;
        self.counters.add_flush();
        Ok(())
    }

    /// Only absolute positions are supported.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, StreamError> {
        let SeekFrom::Start(offset) = pos else {
            return Err(StreamError::UnsupportedOperation("seek (relative origin)"));
        };
        let arg = i64::try_from(offset)
            .map_err(|_| StreamError::InvalidParameter(format!("seek offset {offset} too large")))?;
        self.stack()?.control(ControlOp::FileSeek, arg).map_err(lift("seek"))?;
        Ok(offset)
    }

    pub fn tell(&mut self) -> Result<u64, StreamError> {
        let pos = self.stack()?.control(ControlOp::FileTell, 0).map_err(lift("tell"))?;
        u64::try_from(pos).map_err(|_| StreamError::Io(io::Error::other("negative stream position")))
    }

    pub fn truncate(&mut self, _size: Option<u64>) -> Result<u64, StreamError> {
        self.ensure_open()?;
        Err(StreamError::UnsupportedOperation("truncate"))
    }

    /// Bytes buffered for reading anywhere in the chain.
    pub fn pending(&mut self) -> Result<usize, StreamError> {
        Ok(self.control(ControlOp::Pending, 0)?.max(0) as usize)
    }

    /// Bytes buffered for writing anywhere in the chain.
    pub fn wpending(&mut self) -> Result<usize, StreamError> {
        Ok(self.control(ControlOp::WPending, 0)?.max(0) as usize)
    }

    pub fn eof(&mut self) -> Result<bool, StreamError> {
        Ok(self.control(ControlOp::Eof, 0)? > 0)
    }

    pub fn reset(&mut self) -> Result<(), StreamError> {
        self.control(ControlOp::Reset, 0).map(|_| ())
    }
}

impl io::Read for Chain {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_into(buf).map_err(io::Error::from)
    }
}

impl io::Write for Chain {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Chain::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Chain::flush(self).map_err(io::Error::from)
    }
}

impl io::Seek for Chain {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Chain::seek(self, pos).map_err(io::Error::from)
    }
}

//! device/b64.rs
//! Base64 codec filter.
//!
//! Writes are encoded and forwarded in whole 3-byte quanta (48-byte groups
//! when line breaking, producing 64-column lines). `Flush` emits the padded
//! tail. Reads pull encoded text from below, skip whitespace and decode.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::constants::{types, BASE64_LINE_WIDTH, DEFAULT_READ_CHUNK};
use crate::device::{Capabilities, ControlOp, Device, DeviceError, DeviceResult, Next};

/// Raw bytes per encoded line.
const LINE_BYTES: usize = BASE64_LINE_WIDTH / 4 * 3;

#[derive(Debug)]
pub struct Base64Codec {
    newlines: bool,
    /// Raw bytes waiting for a full quantum (or line).
    enc_pending: Vec<u8>,
    /// Encoded characters awaiting a full 4-character group.
    dec_pending: Vec<u8>,
    decoded: Vec<u8>,
    decoded_pos: usize,
}

impl Default for Base64Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Base64Codec {
    pub fn new() -> Self {
        Self::with_newlines(true)
    }

    /// Unbroken output, and input without line structure.
    pub fn without_newlines() -> Self {
        Self::with_newlines(false)
    }

    fn with_newlines(newlines: bool) -> Self {
        Self {
            newlines,
            enc_pending: Vec::new(),
            dec_pending: Vec::new(),
            decoded: Vec::new(),
            decoded_pos: 0,
        }
    }

    fn encode_ready(&mut self, last: bool) -> Vec<u8> {
        let mut out = Vec::new();
        if self.newlines {
            let ready = if last { self.enc_pending.len() } else { self.enc_pending.len() / LINE_BYTES * LINE_BYTES };
            for line in self.enc_pending[..ready].chunks(LINE_BYTES) {
                out.extend_from_slice(STANDARD.encode(line).as_bytes());
                out.push(b'\n');
            }
            self.enc_pending.drain(..ready);
        } else {
            let ready = if last { self.enc_pending.len() } else { self.enc_pending.len() / 3 * 3 };
            out.extend_from_slice(STANDARD.encode(&self.enc_pending[..ready]).as_bytes());
            self.enc_pending.drain(..ready);
        }
        out
    }

    fn decode_ready(&mut self, last: bool) -> DeviceResult<()> {
        let ready = self.dec_pending.len() / 4 * 4;
        if last && ready != self.dec_pending.len() {
            return Err(DeviceError::failure("truncated base64 input"));
        }
        if ready == 0 {
            return Ok(());
        }
        let bytes = STANDARD
            .decode(&self.dec_pending[..ready])
            .map_err(|e| DeviceError::failure(format!("invalid base64 input: {e}")))?;
        self.dec_pending.drain(..ready);
        self.decoded.drain(..self.decoded_pos);
        self.decoded_pos = 0;
        self.decoded.extend_from_slice(&bytes);
        Ok(())
    }

    fn buffered_output(&self) -> usize {
        self.decoded.len() - self.decoded_pos
    }
}

impl Device for Base64Codec {
    fn kind(&self) -> i32 {
        types::BASE64
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        self.enc_pending.extend_from_slice(buf);
        let out = self.encode_ready(false);
        if !out.is_empty() {
            next.write_all(&out)?;
        }
        Ok(buf.len())
    }

    fn read(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut chunk = [0u8; DEFAULT_READ_CHUNK];
        while self.buffered_output() == 0 {
            let n = next.read(&mut chunk)?;
            if n == 0 {
                self.decode_ready(true)?;
                break;
            }
            self.dec_pending
                .extend(chunk[..n].iter().copied().filter(|b| !b.is_ascii_whitespace()));
            self.decode_ready(false)?;
        }
        let n = buf.len().min(self.buffered_output());
        buf[..n].copy_from_slice(&self.decoded[self.decoded_pos..self.decoded_pos + n]);
        self.decoded_pos += n;
        Ok(n)
    }

    fn puts(&mut self, next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.write(next, line)
    }

    fn control(&mut self, mut next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Flush => {
                let out = self.encode_ready(true);
                if !out.is_empty() {
                    next.write_all(&out)?;
                }
                next.forward_control(op, arg)
            }
            ControlOp::Reset => {
                self.enc_pending.clear();
                self.dec_pending.clear();
                self.decoded.clear();
                self.decoded_pos = 0;
                next.forward_control(op, arg)
            }
            ControlOp::Pending => Ok(self.buffered_output() as i64 + next.forward_control(op, arg)?),
            ControlOp::WPending => Ok(self.enc_pending.len() as i64 + next.forward_control(op, arg)?),
            ControlOp::Eof => {
                if self.buffered_output() > 0 {
                    Ok(0)
                } else {
                    next.forward_control(op, arg)
                }
            }
            _ => next.forward_control(op, arg),
        }
    }

    device_any!();
}

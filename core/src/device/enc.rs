//! device/enc.rs
//! Cipher filter: encrypts or decrypts everything written or read through it.
//!
//! The filter is created unkeyed and keyed later with `init`. Writing (or
//! reading) before then fails with `CipherError::NotInitialised`. `Flush`
//! finalises the cipher, forwards the tail, then forwards the flush. On the
//! read side the tail is produced when the device below reports end of stream.

use tracing::debug;

use crate::constants::{types, DEFAULT_READ_CHUNK};
use crate::crypto::{CipherContext, CipherError, CipherSpec, Direction};
use crate::device::{Capabilities, ControlOp, Device, DeviceResult, Next};

#[derive(Debug)]
pub struct CipherFilter {
    spec: CipherSpec,
    direction: Direction,
    padding: bool,
    context: Option<CipherContext>,
    /// Transformed bytes produced on the read side, not yet handed out.
    output: Vec<u8>,
    output_pos: usize,
}

impl CipherFilter {
    pub fn new(spec: CipherSpec, direction: Direction) -> Self {
        Self {
            spec,
            direction,
            padding: false,
            context: None,
            output: Vec::new(),
            output_pos: 0,
        }
    }

    pub fn with_key(spec: CipherSpec, direction: Direction, key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        let mut filter = Self::new(spec, direction);
        filter.init(key, iv)?;
        Ok(filter)
    }

    /// (Re)keys the filter. On error the previous state is kept.
    pub fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<(), CipherError> {
        let context = CipherContext::new(&self.spec, self.direction, key, iv, self.padding)?;
        self.install(context);
        Ok(())
    }

    /// Installs a context built elsewhere, discarding any buffered output.
    pub fn install(&mut self, context: CipherContext) {
        self.context = Some(context);
        self.output.clear();
        self.output_pos = 0;
        debug!(cipher = self.spec.name, direction = ?self.direction, "cipher filter keyed");
    }

    pub fn set_padding(&mut self, padding: bool) {
        self.padding = padding;
        if let Some(ctx) = self.context.as_mut() {
            ctx.set_padding(padding);
        }
    }

    pub fn padding(&self) -> bool {
        self.padding
    }

    pub fn spec(&self) -> &CipherSpec {
        &self.spec
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_keyed(&self) -> bool {
        self.context.is_some()
    }

    fn context(&mut self) -> Result<&mut CipherContext, CipherError> {
        self.context.as_mut().ok_or(CipherError::NotInitialised)
    }

    fn buffered_output(&self) -> usize {
        self.output.len() - self.output_pos
    }
}

impl Device for CipherFilter {
    fn kind(&self) -> i32 {
        types::CIPHER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        let mut out = Vec::with_capacity(buf.len() + self.spec.block_size);
        self.context()?.update(buf, &mut out)?;
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
            let finished = self.context()?.is_finalized();
            if finished {
                return Ok(0);
            }
            let n = next.read(&mut chunk)?;
            self.output.clear();
            self.output_pos = 0;
            let ctx = self.context.as_mut().ok_or(CipherError::NotInitialised)?;
            if n == 0 {
                ctx.finalize(&mut self.output)?;
            } else {
                ctx.update(&chunk[..n], &mut self.output)?;
            }
        }
        let n = buf.len().min(self.buffered_output());
        buf[..n].copy_from_slice(&self.output[self.output_pos..self.output_pos + n]);
        self.output_pos += n;
        Ok(n)
    }

    fn puts(&mut self, next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.write(next, line)
    }

    fn control(&mut self, mut next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Flush => {
                if let Some(ctx) = self.context.as_mut() {
                    if !ctx.is_finalized() {
                        let mut tail = Vec::with_capacity(self.spec.block_size);
                        ctx.finalize(&mut tail)?;
                        if !tail.is_empty() {
                            next.write_all(&tail)?;
                        }
                    }
                }
                next.forward_control(op, arg)
            }
            ControlOp::Reset => {
                // key material is dropped; `init` must be called again
                self.context = None;
                self.output.clear();
                self.output_pos = 0;
                next.forward_control(op, arg)
            }
            ControlOp::Pending => Ok(self.buffered_output() as i64 + next.forward_control(op, arg)?),
            ControlOp::WPending => {
                let held = self.context.as_ref().map_or(0, |c| c.buffered_len());
                Ok(held as i64 + next.forward_control(op, arg)?)
            }
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

//! device/zlib.rs
//! zlib compression filter via flate2 with streaming enc/dec.
//!
//! Write side: a `ZlibEncoder` over a scratch `Vec`, drained to the next
//! device after every write. `Flush` finishes the stream; the next write
//! opens a new one. Read side: raw `Decompress` fed from below.

use std::io::Write;

use flate2::{write::ZlibEncoder, Compression, Decompress, FlushDecompress, Status};

use crate::constants::{types, DEFAULT_READ_CHUNK};
use crate::device::{Capabilities, ControlOp, Device, DeviceError, DeviceResult, Next};

pub struct CompressionCodec {
    level: Compression,
    encoder: Option<ZlibEncoder<Vec<u8>>>,
    decoder: Decompress,
    /// Compressed input not yet consumed by the decoder.
    input: Vec<u8>,
    output: Vec<u8>,
    output_pos: usize,
    stream_end: bool,
}

impl Default for CompressionCodec {
    fn default() -> Self {
        Self::new(6)
    }
}

impl CompressionCodec {
    /// `level` 0..=9; anything else selects the zlib default.
    pub fn new(level: i32) -> Self {
        let level = match level {
            0..=9 => Compression::new(level as u32),
            _ => Compression::default(),
        };
        Self {
            level,
            encoder: None,
            decoder: Decompress::new(true),
            input: Vec::new(),
            output: Vec::new(),
            output_pos: 0,
            stream_end: false,
        }
    }

    fn codec_err(e: impl std::fmt::Display) -> DeviceError {
        DeviceError::failure(format!("zlib: {e}"))
    }

    fn buffered_output(&self) -> usize {
        self.output.len() - self.output_pos
    }

    fn finish_stream(&mut self, next: &mut Next<'_>) -> DeviceResult<()> {
        if let Some(encoder) = self.encoder.take() {
            let tail = encoder.finish()?;
            if !tail.is_empty() {
                next.write_all(&tail)?;
            }
        }
        Ok(())
    }

    /// Runs the decoder once over buffered input: (consumed, produced).
    fn inflate(&mut self) -> DeviceResult<(usize, usize)> {
        self.output.clear();
        self.output_pos = 0;
        self.output.reserve(DEFAULT_READ_CHUNK * 4);

        let in_before = self.decoder.total_in();
        let out_before = self.decoder.total_out();
        let status = self
            .decoder
            .decompress_vec(&self.input, &mut self.output, FlushDecompress::None)
            .map_err(Self::codec_err)?;
        let consumed = (self.decoder.total_in() - in_before) as usize;
        let produced = (self.decoder.total_out() - out_before) as usize;
        self.input.drain(..consumed);
        if status == Status::StreamEnd {
            self.stream_end = true;
        }
        Ok((consumed, produced))
    }
}

impl Device for CompressionCodec {
    fn kind(&self) -> i32 {
        types::COMP
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        let level = self.level;
        let encoder = self.encoder.get_or_insert_with(|| ZlibEncoder::new(Vec::new(), level));
        encoder.write_all(buf)?;
        let out = std::mem::take(encoder.get_mut());
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
        while self.buffered_output() == 0 && !self.stream_end {
            if self.input.is_empty() {
                let n = next.read(&mut chunk)?;
                if n == 0 {
                    if self.decoder.total_in() == 0 {
                        return Ok(0);
                    }
                    return Err(DeviceError::failure("zlib: truncated stream"));
                }
                self.input.extend_from_slice(&chunk[..n]);
            }
            let (consumed, produced) = self.inflate()?;
            if consumed == 0 && produced == 0 && !self.stream_end {
                // decoder needs more input than is buffered
                let n = next.read(&mut chunk)?;
                if n == 0 {
                    return Err(DeviceError::failure("zlib: truncated stream"));
                }
                self.input.extend_from_slice(&chunk[..n]);
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
                self.finish_stream(&mut next)?;
                next.forward_control(op, arg)
            }
            ControlOp::Reset => {
                self.encoder = None;
                self.decoder.reset(true);
                self.input.clear();
                self.output.clear();
                self.output_pos = 0;
                self.stream_end = false;
                next.forward_control(op, arg)
            }
            ControlOp::Pending => Ok(self.buffered_output() as i64 + next.forward_control(op, arg)?),
            ControlOp::WPending => {
                let held = self.encoder.as_ref().map_or(0, |e| e.get_ref().len());
                Ok(held as i64 + next.forward_control(op, arg)?)
            }
            ControlOp::Eof => {
                if self.buffered_output() > 0 {
                    Ok(0)
                } else if self.stream_end {
                    Ok(1)
                } else {
                    next.forward_control(op, arg)
                }
            }
            _ => next.forward_control(op, arg),
        }
    }

    device_any!();
}

impl std::fmt::Debug for CompressionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionCodec")
            .field("level", &self.level.level())
            .field("encoding", &self.encoder.is_some())
            .field("stream_end", &self.stream_end)
            .finish()
    }
}

//! ffi/host.rs
//! A Python file-like object as a `HostStream`.
//!
//! Only the methods the object actually has are used; a missing method is
//! reported as unsupported. Any Python exception becomes `HostError::Raised`.

use pyo3::prelude::*;
use pyo3::types::{PyByteArray, PyBytes};

use tlsio_core::device::{HostError, HostResult, HostStream};

fn raised(e: PyErr) -> HostError {
    HostError::Raised(e.to_string())
}

pub(crate) struct PyHostStream {
    obj: Py<PyAny>,
}

impl PyHostStream {
    pub(crate) fn new(obj: Bound<'_, PyAny>) -> Self {
        Self { obj: obj.unbind() }
    }

    fn has(&self, py: Python<'_>, name: &str) -> bool {
        self.obj.bind(py).hasattr(name).unwrap_or(false)
    }
}

impl HostStream for PyHostStream {
    fn describe(&self) -> String {
        Python::with_gil(|py| {
            self.obj
                .bind(py)
                .repr()
                .map(|r| r.to_string())
                .unwrap_or_else(|_| "<python stream>".to_string())
        })
    }

    fn write(&mut self, data: &[u8]) -> HostResult<usize> {
        Python::with_gil(|py| {
            if !self.has(py, "write") {
                return Err(HostError::Unsupported("write"));
            }
            let ret = self
                .obj
                .bind(py)
                .call_method1("write", (PyBytes::new_bound(py, data),))
                .map_err(raised)?;
            // raw streams may return None when nothing could be written
            if ret.is_none() {
                return Ok(0);
            }
            ret.extract::<usize>().map_err(raised)
        })
    }

    fn read(&mut self, len: usize) -> HostResult<Vec<u8>> {
        Python::with_gil(|py| {
            if !self.has(py, "read") {
                return Err(HostError::Unsupported("read"));
            }
            let ret = self.obj.bind(py).call_method1("read", (len,)).map_err(raised)?;
            if ret.is_none() {
                return Ok(Vec::new());
            }
            if let Ok(bytes) = ret.downcast::<PyBytes>() {
                return Ok(bytes.as_bytes().to_vec());
            }
            ret.extract::<Vec<u8>>().map_err(raised)
        })
    }

    fn supports_readinto(&self) -> bool {
        Python::with_gil(|py| self.has(py, "readinto"))
    }

    fn readinto(&mut self, buf: &mut [u8]) -> HostResult<usize> {
        Python::with_gil(|py| {
            let scratch = PyByteArray::new_bound(py, &vec![0u8; buf.len()]);
            let ret = self
                .obj
                .bind(py)
                .call_method1("readinto", (scratch.clone(),))
                .map_err(raised)?;
            let n = if ret.is_none() { 0 } else { ret.extract::<usize>().map_err(raised)? };
            let n = n.min(buf.len());
            buf[..n].copy_from_slice(&scratch.to_vec()[..n]);
            Ok(n)
        })
    }

    fn flush(&mut self) -> HostResult<()> {
        Python::with_gil(|py| {
            if !self.has(py, "flush") {
                return Err(HostError::Unsupported("flush"));
            }
            self.obj.bind(py).call_method0("flush").map_err(raised)?;
            Ok(())
        })
    }

    fn seek(&mut self, pos: u64) -> HostResult<u64> {
        Python::with_gil(|py| {
            if !self.has(py, "seek") {
                return Err(HostError::Unsupported("seek"));
            }
            let ret = self.obj.bind(py).call_method1("seek", (pos,)).map_err(raised)?;
            if ret.is_none() {
                return Ok(pos);
            }
            ret.extract::<u64>().map_err(raised)
        })
    }

    fn tell(&mut self) -> HostResult<u64> {
        Python::with_gil(|py| {
            if !self.has(py, "tell") {
                return Err(HostError::Unsupported("tell"));
            }
            self.obj
                .bind(py)
                .call_method0("tell")
                .and_then(|r| r.extract::<u64>())
                .map_err(raised)
        })
    }
}

//! ffi/chain.rs
//! `tlsio.BIOChain`: the file-like stream façade.

use std::io::SeekFrom;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use tlsio_core::chain::Chain;
use tlsio_core::device::{ControlOp, DeviceError, DigestFilter};
use tlsio_core::types::StreamError;

use super::device::PyDevice;
use super::host::PyHostStream;
use super::IntoPyResult;

#[pyclass(name = "BIOChain", module = "tlsio")]
pub struct PyChain {
    inner: Chain,
}

impl PyChain {
    pub(crate) fn over_host(stream: PyHostStream) -> Self {
        Self { inner: Chain::host(stream) }
    }
}

fn limit(size: isize) -> Option<usize> {
    usize::try_from(size).ok()
}

#[pymethods]
impl PyChain {
    /// Chain ending in `terminal`, or in a fresh memory buffer.
    #[new]
    #[pyo3(signature = (terminal=None))]
    fn new(terminal: Option<PyRefMut<'_, PyDevice>>) -> PyResult<Self> {
        let inner = match terminal {
            Some(mut device) => Chain::new(device.take()?),
            None => Chain::memory(),
        };
        Ok(Self { inner })
    }

    fn push(&mut self, mut device: PyRefMut<'_, PyDevice>) -> PyResult<()> {
        let handle = device.take()?;
        self.inner.push(handle).py()
    }

    fn pop(&mut self) -> PyResult<PyDevice> {
        Ok(PyDevice::wrap(self.inner.pop().py()?))
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// `(type code, name)` of the device `n` hops below the head. Negative
    /// indices raise `IndexError`.
    fn __getitem__(&self, n: i64) -> PyResult<(i32, &'static str)> {
        let device = self.inner.get(n).py()?;
        Ok((device.kind(), device.name()))
    }

    /// Type codes, terminal first.
    fn kinds(&self) -> Vec<i32> {
        self.inner.kinds()
    }

    #[pyo3(signature = (size=-1))]
    fn read<'py>(&mut self, py: Python<'py>, size: isize) -> PyResult<Bound<'py, PyBytes>> {
        let data = match limit(size) {
            Some(n) => self.inner.read(n),
            None => self.inner.read_all(),
        }
        .py()?;
        Ok(PyBytes::new_bound(py, &data))
    }

    #[pyo3(signature = (size=-1))]
    fn readline<'py>(&mut self, py: Python<'py>, size: isize) -> PyResult<Bound<'py, PyBytes>> {
        let line = self.inner.read_line(limit(size)).py()?;
        Ok(PyBytes::new_bound(py, &line))
    }

    #[pyo3(signature = (hint=-1))]
    fn readlines<'py>(&mut self, py: Python<'py>, hint: isize) -> PyResult<Vec<Bound<'py, PyBytes>>> {
        let lines = self.inner.read_lines(limit(hint)).py()?;
        Ok(lines.iter().map(|l| PyBytes::new_bound(py, l)).collect())
    }

    fn write(&mut self, data: &[u8]) -> PyResult<usize> {
        self.inner.write(data).py()
    }

    fn writelines(&mut self, lines: Vec<Vec<u8>>) -> PyResult<()> {
        self.inner.write_lines(lines).py()
    }

    fn flush(&mut self) -> PyResult<()> {
        self.inner.flush().py()
    }

    /// Only `whence == 0` is supported.
    #[pyo3(signature = (offset, whence=0))]
    fn seek(&mut self, offset: i64, whence: i32) -> PyResult<u64> {
        let pos = match whence {
            0 => {
                let start = u64::try_from(offset)
                    .map_err(|_| PyValueError::new_err(format!("negative seek position {offset}")))?;
                SeekFrom::Start(start)
            }
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            other => return Err(PyValueError::new_err(format!("invalid whence ({other})"))),
        };
        self.inner.seek(pos).py()
    }

    fn tell(&mut self) -> PyResult<u64> {
        self.inner.tell().py()
    }

    #[pyo3(signature = (size=None))]
    fn truncate(&mut self, size: Option<u64>) -> PyResult<u64> {
        self.inner.truncate(size).py()
    }

    fn readable(&self) -> PyResult<bool> {
        self.inner.is_readable().py()
    }

    fn writable(&self) -> PyResult<bool> {
        self.inner.is_writable().py()
    }

    fn seekable(&self) -> PyResult<bool> {
        self.inner.is_seekable().py()
    }

    fn pending(&mut self) -> PyResult<usize> {
        self.inner.pending().py()
    }

    fn wpending(&mut self) -> PyResult<usize> {
        self.inner.wpending().py()
    }

    fn eof(&mut self) -> PyResult<bool> {
        self.inner.eof().py()
    }

    fn reset(&mut self) -> PyResult<()> {
        self.inner.reset().py()
    }

    /// Raw control call on the head; unknown commands fail like any device error.
    #[pyo3(signature = (cmd, arg=0))]
    fn ctrl(&mut self, cmd: i32, arg: i64) -> PyResult<i64> {
        let op = ControlOp::try_from(cmd).map_err(|_| {
            StreamError::from_device("control", DeviceError::failure(format!("unknown control command 0x{cmd:x}")))
        });
        let op = op.py()?;
        self.inner.control(op, arg).py()
    }

    /// Hex digest of the first digest filter in the chain.
    fn hexdigest(&self) -> PyResult<String> {
        (0..self.inner.len())
            .filter_map(|n| self.inner.index(n).ok())
            .find_map(|d| d.downcast_ref::<DigestFilter>().map(DigestFilter::hexdigest))
            .ok_or_else(|| PyValueError::new_err("no digest filter in chain"))
    }

    /// Counter snapshot as JSON.
    fn counters(&self) -> String {
        self.inner.counters().to_json()
    }

    fn close(&mut self) {
        self.inner.close();
    }

    #[getter]
    fn closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn __enter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    #[pyo3(signature = (*_args))]
    fn __exit__(&mut self, _args: &Bound<'_, pyo3::types::PyTuple>) -> bool {
        self.inner.close();
        false
    }

    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__<'py>(&mut self, py: Python<'py>) -> PyResult<Option<Bound<'py, PyBytes>>> {
        let line = self.inner.read_line(None).py()?;
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(PyBytes::new_bound(py, &line)))
    }

    fn __repr__(&self) -> String {
        if self.inner.is_closed() {
            return "<tlsio.BIOChain closed>".to_string();
        }
        format!("<tlsio.BIOChain depth={} kinds={:?}>", self.inner.len(), self.inner.kinds())
    }
}

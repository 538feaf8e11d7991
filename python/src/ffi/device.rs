//! ffi/device.rs
//! `tlsio.Device`: a detached device waiting to be pushed onto a chain.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use tlsio_core::crypto::Direction;
use tlsio_core::device::{
    Base64Codec, BufferFilter, CipherFilter, CompressionCodec, DeviceHandle, DigestFilter,
    FileBacking, HostStreamAdapter, MemorySink, NullFilter, NullSink,
};
use tlsio_core::constants::DEFAULT_BUFFER_SIZE;

use super::host::PyHostStream;
use super::{catalog, IntoPyResult};

#[pyclass(name = "Device", module = "tlsio")]
pub struct PyDevice {
    inner: Option<DeviceHandle>,
}

impl PyDevice {
    pub(crate) fn wrap(handle: DeviceHandle) -> Self {
        Self { inner: Some(handle) }
    }

    /// Moves the device out; a device can be attached to one chain only.
    pub(crate) fn take(&mut self) -> PyResult<DeviceHandle> {
        self.inner
            .take()
            .ok_or_else(|| PyValueError::new_err("device already attached to a chain"))
    }

    fn handle(&self) -> PyResult<&DeviceHandle> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyValueError::new_err("device already attached to a chain"))
    }
}

#[pymethods]
impl PyDevice {
    /// Writable buffer, or a read-only source over `data`.
    #[staticmethod]
    #[pyo3(signature = (data=None))]
    fn memory(data: Option<&[u8]>) -> Self {
        let sink = match data {
            Some(bytes) => MemorySink::from_bytes(bytes.to_vec()),
            None => MemorySink::new(),
        };
        Self::wrap(DeviceHandle::new(sink))
    }

    #[staticmethod]
    fn null() -> Self {
        Self::wrap(DeviceHandle::new(NullSink::new()))
    }

    #[staticmethod]
    fn null_filter() -> Self {
        Self::wrap(DeviceHandle::new(NullFilter::new()))
    }

    #[staticmethod]
    #[pyo3(signature = (path, mode="r"))]
    fn file(path: std::path::PathBuf, mode: &str) -> PyResult<Self> {
        Ok(Self::wrap(DeviceHandle::new(FileBacking::open(path, mode).py()?)))
    }

    #[staticmethod]
    #[pyo3(signature = (newlines=true))]
    fn base64(newlines: bool) -> Self {
        let codec = if newlines { Base64Codec::new() } else { Base64Codec::without_newlines() };
        Self::wrap(DeviceHandle::new(codec))
    }

    #[staticmethod]
    #[pyo3(signature = (level=6))]
    fn zlib(level: i32) -> Self {
        Self::wrap(DeviceHandle::new(CompressionCodec::new(level)))
    }

    #[staticmethod]
    fn md(name: &str) -> PyResult<Self> {
        let spec = catalog().lookup_digest(name).py()?;
        Ok(Self::wrap(DeviceHandle::new(DigestFilter::new(spec))))
    }

    #[staticmethod]
    #[pyo3(signature = (name, encrypt, key, iv, padding=false))]
    fn cipher(name: &str, encrypt: bool, key: &[u8], iv: &[u8], padding: bool) -> PyResult<Self> {
        let spec = catalog().lookup_cipher(name).py()?;
        let direction = if encrypt { Direction::Encrypt } else { Direction::Decrypt };
        let mut filter = CipherFilter::new(spec, direction);
        filter.set_padding(padding);
        filter.init(key, iv).py()?;
        Ok(Self::wrap(DeviceHandle::new(filter)))
    }

    #[staticmethod]
    #[pyo3(signature = (size=DEFAULT_BUFFER_SIZE))]
    fn buffer(size: usize) -> Self {
        Self::wrap(DeviceHandle::new(BufferFilter::with_size(size)))
    }

    /// Any object with some of `read`/`readinto`/`write`/`flush`/`seek`/`tell`.
    #[staticmethod]
    fn host(obj: Bound<'_, PyAny>) -> Self {
        Self::wrap(DeviceHandle::new(HostStreamAdapter::new(PyHostStream::new(obj))))
    }

    #[getter]
    fn kind(&self) -> PyResult<i32> {
        Ok(self.handle()?.kind())
    }

    #[getter]
    fn name(&self) -> PyResult<&'static str> {
        Ok(self.handle()?.name())
    }

    #[getter]
    fn is_filter(&self) -> PyResult<bool> {
        Ok(self.handle()?.is_filter())
    }

    #[getter]
    fn attached(&self) -> bool {
        self.inner.is_none()
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            Some(h) => format!("<tlsio.Device {} id={}>", h.name(), h.id().get()),
            None => "<tlsio.Device (attached)>".to_string(),
        }
    }
}

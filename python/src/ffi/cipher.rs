//! ffi/cipher.rs
//! `tlsio.Cipher`: the authenticated cipher pipeline.

use pyo3::prelude::*;
use pyo3::types::PyBytes;

use tlsio_core::crypto::Direction;
use tlsio_core::pipeline::AuthenticatedCipher;

use super::{catalog, IntoPyResult};

#[pyclass(name = "Cipher", module = "tlsio")]
pub struct PyCipher {
    inner: AuthenticatedCipher,
}

#[pymethods]
impl PyCipher {
    #[new]
    #[pyo3(signature = (algorithm, encrypt=true, digest=None))]
    fn new(algorithm: &str, encrypt: bool, digest: Option<&str>) -> PyResult<Self> {
        let direction = if encrypt { Direction::Encrypt } else { Direction::Decrypt };
        let inner = AuthenticatedCipher::new(catalog(), direction, algorithm, digest).py()?;
        Ok(Self { inner })
    }

    fn initialise(&mut self, key: &[u8], ivector: &[u8]) -> PyResult<()> {
        self.inner.initialise(key, ivector).py()
    }

    fn update(&mut self, data: &[u8]) -> PyResult<()> {
        self.inner.update(data).py()
    }

    fn finish(&mut self) -> PyResult<()> {
        self.inner.finish().py()
    }

    fn ciphertext<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.inner.ciphertext().py()?;
        Ok(PyBytes::new_bound(py, &data))
    }

    fn plaintext<'py>(&mut self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let data = self.inner.plaintext().py()?;
        Ok(PyBytes::new_bound(py, &data))
    }

    fn set_key_len(&mut self, n: usize) -> PyResult<()> {
        self.inner.set_key_len(n).py()
    }

    fn set_padding(&mut self, padding: bool) -> PyResult<()> {
        self.inner.set_padding(padding).py()
    }

    #[getter]
    fn algorithm(&self) -> &'static str {
        self.inner.algorithm()
    }

    #[getter]
    fn digest_algorithm(&self) -> Option<&'static str> {
        self.inner.digest_algorithm()
    }

    #[getter]
    fn encrypting(&self) -> bool {
        self.inner.is_encrypting()
    }

    #[getter]
    fn key_len(&self) -> usize {
        self.inner.key_len()
    }

    #[getter]
    fn ivector_len(&self) -> usize {
        self.inner.ivector_len()
    }

    #[getter]
    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    #[getter]
    fn mode(&self) -> String {
        self.inner.mode().to_string()
    }

    #[getter]
    fn digest_size(&self) -> Option<usize> {
        self.inner.digest_size()
    }

    #[getter]
    fn padding(&self) -> bool {
        self.inner.padding()
    }

    #[getter]
    fn state(&self) -> String {
        self.inner.state().to_string()
    }

    fn __repr__(&self) -> String {
        format!(
            "<tlsio.Cipher {} {} digest={:?} {}>",
            self.inner.algorithm(),
            if self.inner.is_encrypting() { "encrypt" } else { "decrypt" },
            self.inner.digest_algorithm(),
            self.inner.state(),
        )
    }
}

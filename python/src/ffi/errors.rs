//! ffi/errors.rs
//! `StreamError` -> Python exception mapping.

use pyo3::exceptions::{PyIOError, PyIndexError, PyValueError};
use pyo3::PyErr;

use tlsio_core::types::StreamError;

pyo3::import_exception!(io, UnsupportedOperation);

pub(crate) fn to_py(e: StreamError) -> PyErr {
    let msg = e.to_string();
    match e {
        StreamError::UnsupportedOperation(_) => UnsupportedOperation::new_err(msg),
        StreamError::Io(io) => PyIOError::new_err(io.to_string()),
        StreamError::Index { .. } => PyIndexError::new_err(msg),
        StreamError::InvalidState(_)
        | StreamError::InvalidParameter(_)
        | StreamError::AuthenticationFailure => PyValueError::new_err(msg),
    }
}

pub(crate) trait IntoPyResult<T> {
    fn py(self) -> Result<T, PyErr>;
}

impl<T, E: Into<StreamError>> IntoPyResult<T> for Result<T, E> {
    fn py(self) -> Result<T, PyErr> {
        self.map_err(|e| to_py(e.into()))
    }
}

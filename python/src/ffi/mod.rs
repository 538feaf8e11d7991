//! ffi/mod.rs
//! Module registration, the shared catalog and the free functions.

use std::sync::OnceLock;

use pyo3::prelude::*;
use pyo3::sync::GILOnceCell;
use pyo3::types::PyBytes;

use tlsio_core::constants::{close, ctrl, types, DEFAULT_KDF_ITERATIONS};
use tlsio_core::crypto::{self, Catalog, Category};

mod chain;
mod cipher;
mod device;
mod errors;
mod host;

pub(crate) use self::errors::IntoPyResult;

static CATALOG: OnceLock<Catalog> = OnceLock::new();

/// Opened on first use and never closed for the life of the interpreter.
pub(crate) fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(Catalog::opened)
}

/// Chain over a Python file-like object.
#[pyfunction]
fn wrap_io(obj: Bound<'_, PyAny>) -> chain::PyChain {
    chain::PyChain::over_host(host::PyHostStream::new(obj))
}

#[pyfunction]
fn ciphers_available() -> Vec<String> {
    catalog().enumerate(Category::Cipher).into_iter().collect()
}

#[pyfunction]
fn digests_available() -> Vec<String> {
    catalog().enumerate(Category::Digest).into_iter().collect()
}

static SECRET: GILOnceCell<Py<PyAny>> = GILOnceCell::new();

/// `collections.namedtuple("Secret", "key salt iterations")`, built once.
fn secret_type(py: Python<'_>) -> PyResult<&Bound<'_, PyAny>> {
    let ty = SECRET.get_or_try_init(py, || {
        let namedtuple = py.import_bound("collections")?.getattr("namedtuple")?;
        Ok::<_, PyErr>(namedtuple.call1(("Secret", ("key", "salt", "iterations")))?.unbind())
    })?;
    Ok(ty.bind(py))
}

/// Returns `Secret(key, salt, iterations)`; a random salt is generated when
/// none is given.
#[pyfunction]
#[pyo3(signature = (password, length, salt=None, iterations=DEFAULT_KDF_ITERATIONS))]
fn derive_key<'py>(
    py: Python<'py>,
    password: &[u8],
    length: usize,
    salt: Option<&[u8]>,
    iterations: u32,
) -> PyResult<Bound<'py, PyAny>> {
    let secret = crypto::derive_key(password, length, salt, iterations).py()?;
    secret_type(py)?.call1((
        PyBytes::new_bound(py, &secret.key),
        PyBytes::new_bound(py, &secret.salt),
        secret.iterations,
    ))
}

#[pyfunction]
fn random_bytes(py: Python<'_>, n: usize) -> Bound<'_, PyBytes> {
    PyBytes::new_bound(py, &crypto::random_bytes(n))
}

pub fn register(py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<device::PyDevice>()?;
    m.add_class::<chain::PyChain>()?;
    m.add_class::<cipher::PyCipher>()?;

    m.add_function(wrap_pyfunction!(wrap_io, m)?)?;
    m.add_function(wrap_pyfunction!(ciphers_available, m)?)?;
    m.add_function(wrap_pyfunction!(digests_available, m)?)?;
    m.add_function(wrap_pyfunction!(derive_key, m)?)?;
    m.add_function(wrap_pyfunction!(random_bytes, m)?)?;

    m.add("CTRL_RESET", ctrl::RESET)?;
    m.add("CTRL_EOF", ctrl::EOF)?;
    m.add("CTRL_GET_CLOSE", ctrl::GET_CLOSE)?;
    m.add("CTRL_SET_CLOSE", ctrl::SET_CLOSE)?;
    m.add("CTRL_PENDING", ctrl::PENDING)?;
    m.add("CTRL_FLUSH", ctrl::FLUSH)?;
    m.add("CTRL_DUP", ctrl::DUP)?;
    m.add("CTRL_WPENDING", ctrl::WPENDING)?;
    m.add("CTRL_FILE_SEEK", ctrl::FILE_SEEK)?;
    m.add("CTRL_FILE_TELL", ctrl::FILE_TELL)?;
    m.add("BIO_CLOSE", close::CLOSE)?;
    m.add("BIO_NOCLOSE", close::NOCLOSE)?;

    let type_codes = [
        ("TYPE_MEM", types::MEM),
        ("TYPE_FILE", types::FILE),
        ("TYPE_FD", types::FD),
        ("TYPE_NULL", types::NULL),
        ("TYPE_MD", types::MD),
        ("TYPE_BUFFER", types::BUFFER),
        ("TYPE_CIPHER", types::CIPHER),
        ("TYPE_BASE64", types::BASE64),
        ("TYPE_NULL_FILTER", types::NULL_FILTER),
        ("TYPE_COMP", types::COMP),
        ("TYPE_HOST", types::HOST),
    ];
    for (name, code) in type_codes {
        m.add(name, code)?;
    }

    m.add("UnsupportedOperation", py.get_type_bound::<errors::UnsupportedOperation>())?;
    Ok(())
}

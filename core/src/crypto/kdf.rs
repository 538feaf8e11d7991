// ## src/crypto/kdf.rs

//! crypto/kdf.rs
//! Password-based key derivation and random bytes.
//!
//! Design:
//! - PBKDF2-HMAC-SHA1, matching the toolkit's `PKCS5_PBKDF2_HMAC_SHA1`.
//! - A missing salt is replaced by `DEFAULT_SALT_LEN` random bytes and returned
//!   in the `Secret` so the caller can store it next to the ciphertext.

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;

use crate::constants::DEFAULT_SALT_LEN;
use crate::types::StreamError;

/// Derived key material plus the parameters needed to derive it again.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    pub key: Vec<u8>,
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("salt", &hex::encode(&self.salt))
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// `n` bytes from the thread-local CSPRNG (seeded from the OS).
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

/// Summary: Derive `length` bytes from `password` with PBKDF2-HMAC-SHA1.
///
/// Errors:
/// - `length == 0` or `iterations == 0` returns `InvalidParameter`.
pub fn derive_key(
    password: &[u8],
    length: usize,
    salt: Option<&[u8]>,
    iterations: u32,
) -> Result<Secret, StreamError> {
    if length == 0 {
        return Err(StreamError::InvalidParameter("key length must be non-zero".into()));
    }
    if iterations == 0 {
        return Err(StreamError::InvalidParameter("iteration count must be non-zero".into()));
    }

    let salt = match salt {
        Some(s) => s.to_vec(),
        None => random_bytes(DEFAULT_SALT_LEN),
    };

    let mut key = vec![0u8; length];
    pbkdf2_hmac::<Sha1>(password, &salt, iterations, &mut key);

    Ok(Secret { key, salt, iterations })
}

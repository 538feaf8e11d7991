use std::fmt;

use num_enum::TryFromPrimitive;

use crate::constants::{cipher_modes, obj_name};
use crate::utils::enum_name_or_hex;

/// EVP cipher mode numbers.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum CipherMode {
    Stream = cipher_modes::STREAM,
    Ecb    = cipher_modes::ECB,
    Cbc    = cipher_modes::CBC,
    Ctr    = cipher_modes::CTR,
}

impl fmt::Display for CipherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", enum_name_or_hex::<CipherMode>(*self as u32).to_ascii_uppercase())
    }
}

#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum Category {
    Digest = obj_name::MD_METH,
    Cipher = obj_name::CIPHER_METH,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn is_encrypting(self) -> bool {
        matches!(self, Direction::Encrypt)
    }
}

/// Concrete primitive behind a catalog cipher entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CipherAlg {
    Aes128,
    Aes192,
    Aes256,
    Rc4,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlg {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_512,
}

/// Static description of a catalog cipher.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CipherSpec {
    pub name: &'static str,
    pub nid: i32,
    pub alg: CipherAlg,
    pub mode: CipherMode,
    pub block_size: usize,
    pub iv_length: usize,
    /// Default key length in bytes.
    pub key_length: usize,
    /// Accepted key lengths, inclusive. Equal bounds for fixed-key ciphers.
    pub key_range: (usize, usize),
}

impl CipherSpec {
    pub fn variable_key_len(&self) -> bool {
        self.key_range.0 != self.key_range.1
    }

    pub fn accepts_key_len(&self, len: usize) -> bool {
        (self.key_range.0..=self.key_range.1).contains(&len)
    }

    /// Block modes buffer partial blocks and may pad.
    pub fn is_block_mode(&self) -> bool {
        matches!(self.mode, CipherMode::Ecb | CipherMode::Cbc)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DigestSpec {
    pub name: &'static str,
    pub nid: i32,
    pub alg: DigestAlg,
    pub block_size: usize,
    pub digest_size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("bad decrypt")]
    BadDecrypt,
    #[error("data not multiple of block length ({len} bytes, block {block})")]
    NotBlockAligned { len: usize, block: usize },
    #[error("cipher used before a key was set")]
    NotInitialised,
    #[error("cipher already finalised")]
    Finalised,
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLen { expected: usize, actual: usize },
    #[error("invalid ivector length: expected {expected}, got {actual}")]
    InvalidIvLen { expected: usize, actual: usize },
    #[error("unsupported cipher configuration: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Lookup attempted before `open()` or after `close()`.
    Closed,
    UnknownCipher(String),
    UnknownDigest(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Closed => write!(f, "algorithm catalog is not open"),
            CatalogError::UnknownCipher(name) => write!(f, "unknown algorithm {:?}", name),
            CatalogError::UnknownDigest(name) => write!(f, "unknown algorithm {:?}", name),
        }
    }
}

impl std::error::Error for CatalogError {}

//! crypto/catalog.rs
//! Name-indexed registry of the ciphers and digests the engine can build.
//!
//! The catalog is an explicit value: it starts closed, `open()` populates the
//! tables and `close()` tears them down. Both are idempotent. Lookups on a
//! closed catalog fail with `CatalogError::Closed`.
//!
//! Names follow the toolkit's conventions (`AES-128-CBC`, `SHA256`) and are
//! matched case-insensitively; a small alias table maps short forms such as
//! `aes128` onto canonical entries.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::crypto::types::{
    CatalogError, Category, CipherAlg, CipherMode, CipherSpec, DigestAlg, DigestSpec,
};
use crate::utils::normalize_name;

const fn aes(name: &'static str, nid: i32, alg: CipherAlg, mode: CipherMode, key: usize) -> CipherSpec {
    let (block_size, iv_length) = match mode {
        CipherMode::Ecb => (16, 0),
        CipherMode::Cbc => (16, 16),
        CipherMode::Ctr => (1, 16),
        CipherMode::Stream => (1, 0),
    };
    CipherSpec { name, nid, alg, mode, block_size, iv_length, key_length: key, key_range: (key, key) }
}

const CIPHERS: &[CipherSpec] = &[
    aes("AES-128-ECB", 418, CipherAlg::Aes128, CipherMode::Ecb, 16),
    aes("AES-128-CBC", 419, CipherAlg::Aes128, CipherMode::Cbc, 16),
    aes("AES-128-CTR", 904, CipherAlg::Aes128, CipherMode::Ctr, 16),
    aes("AES-192-ECB", 422, CipherAlg::Aes192, CipherMode::Ecb, 24),
    aes("AES-192-CBC", 423, CipherAlg::Aes192, CipherMode::Cbc, 24),
    aes("AES-192-CTR", 905, CipherAlg::Aes192, CipherMode::Ctr, 24),
    aes("AES-256-ECB", 426, CipherAlg::Aes256, CipherMode::Ecb, 32),
    aes("AES-256-CBC", 427, CipherAlg::Aes256, CipherMode::Cbc, 32),
    aes("AES-256-CTR", 906, CipherAlg::Aes256, CipherMode::Ctr, 32),
    CipherSpec {
        name: "RC4",
        nid: 5,
        alg: CipherAlg::Rc4,
        mode: CipherMode::Stream,
        block_size: 1,
        iv_length: 0,
        key_length: 16,
        key_range: (1, 32),
    },
];

const DIGESTS: &[DigestSpec] = &[
    DigestSpec { name: "SHA1",     nid: 64,   alg: DigestAlg::Sha1,     block_size: 64,  digest_size: 20 },
    DigestSpec { name: "SHA224",   nid: 675,  alg: DigestAlg::Sha224,   block_size: 64,  digest_size: 28 },
    DigestSpec { name: "SHA256",   nid: 672,  alg: DigestAlg::Sha256,   block_size: 64,  digest_size: 32 },
    DigestSpec { name: "SHA384",   nid: 673,  alg: DigestAlg::Sha384,   block_size: 128, digest_size: 48 },
    DigestSpec { name: "SHA512",   nid: 674,  alg: DigestAlg::Sha512,   block_size: 128, digest_size: 64 },
    DigestSpec { name: "SHA3-256", nid: 1097, alg: DigestAlg::Sha3_256, block_size: 136, digest_size: 32 },
    DigestSpec { name: "SHA3-512", nid: 1100, alg: DigestAlg::Sha3_512, block_size: 72,  digest_size: 64 },
];

/// (alias, canonical name)
const ALIASES: &[(&str, &str)] = &[
    ("AES128", "AES-128-CBC"),
    ("AES192", "AES-192-CBC"),
    ("AES256", "AES-256-CBC"),
    ("ARCFOUR", "RC4"),
    ("SHA-1", "SHA1"),
    ("SHA-224", "SHA224"),
    ("SHA-256", "SHA256"),
    ("SHA-384", "SHA384"),
    ("SHA-512", "SHA512"),
    ("SHA2-224", "SHA224"),
    ("SHA2-256", "SHA256"),
    ("SHA2-384", "SHA384"),
    ("SHA2-512", "SHA512"),
];

#[derive(Debug, Default)]
pub struct Catalog {
    ciphers: BTreeMap<String, CipherSpec>,
    digests: BTreeMap<String, DigestSpec>,
    aliases: BTreeMap<String, String>,
    open: bool,
}

impl Catalog {
    /// A closed catalog. Call `open()` before looking anything up.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened() -> Self {
        let mut catalog = Self::new();
        catalog.open();
        catalog
    }

    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.ciphers = CIPHERS.iter().map(|c| (normalize_name(c.name), *c)).collect();
        self.digests = DIGESTS.iter().map(|d| (normalize_name(d.name), *d)).collect();
        self.aliases = ALIASES
            .iter()
            .map(|(alias, canonical)| (normalize_name(alias), normalize_name(canonical)))
            .collect();
        self.open = true;
        debug!(ciphers = self.ciphers.len(), digests = self.digests.len(), "catalog opened");
    }

    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.ciphers.clear();
        self.digests.clear();
        self.aliases.clear();
        self.open = false;
        debug!("catalog closed");
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn resolve(&self, name: &str) -> String {
        let key = normalize_name(name);
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    pub fn lookup_cipher(&self, name: &str) -> Result<CipherSpec, CatalogError> {
        if !self.open {
            return Err(CatalogError::Closed);
        }
        self.ciphers
            .get(&self.resolve(name))
            .copied()
            .ok_or_else(|| CatalogError::UnknownCipher(name.to_string()))
    }

    pub fn lookup_digest(&self, name: &str) -> Result<DigestSpec, CatalogError> {
        if !self.open {
            return Err(CatalogError::Closed);
        }
        self.digests
            .get(&self.resolve(name))
            .copied()
            .ok_or_else(|| CatalogError::UnknownDigest(name.to_string()))
    }

    /// Canonical names registered under `category`. Empty while closed.
    pub fn enumerate(&self, category: Category) -> BTreeSet<String> {
        match category {
            Category::Cipher => self.ciphers.values().map(|c| c.name.to_string()).collect(),
            Category::Digest => self.digests.values().map(|d| d.name.to_string()).collect(),
        }
    }
}

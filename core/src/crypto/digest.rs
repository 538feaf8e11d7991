use hmac::{Hmac, Mac};
use sha1::Sha1;
use ::digest::Digest;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};

use crate::crypto::types::{DigestAlg, DigestSpec};

/// Running hash state.
#[derive(Clone)]
pub enum DigestState {
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Sha3_256(Sha3_256),
    Sha3_512(Sha3_512),
}

impl DigestState {
    pub fn new(alg: DigestAlg) -> Self {
        match alg {
            DigestAlg::Sha1 => DigestState::Sha1(Sha1::new()),
            DigestAlg::Sha224 => DigestState::Sha224(Sha224::new()),
            DigestAlg::Sha256 => DigestState::Sha256(Sha256::new()),
            DigestAlg::Sha384 => DigestState::Sha384(Sha384::new()),
            DigestAlg::Sha512 => DigestState::Sha512(Sha512::new()),
            DigestAlg::Sha3_256 => DigestState::Sha3_256(Sha3_256::new()),
            DigestAlg::Sha3_512 => DigestState::Sha3_512(Sha3_512::new()),
        }
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Sha1(h) => Digest::update(h, data),
            DigestState::Sha224(h) => Digest::update(h, data),
            DigestState::Sha256(h) => Digest::update(h, data),
            DigestState::Sha384(h) => Digest::update(h, data),
            DigestState::Sha512(h) => Digest::update(h, data),
            DigestState::Sha3_256(h) => Digest::update(h, data),
            DigestState::Sha3_512(h) => Digest::update(h, data),
        }
    }

    #[inline]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            DigestState::Sha1(h) => h.finalize().to_vec(),
            DigestState::Sha224(h) => h.finalize().to_vec(),
            DigestState::Sha256(h) => h.finalize().to_vec(),
            DigestState::Sha384(h) => h.finalize().to_vec(),
            DigestState::Sha512(h) => h.finalize().to_vec(),
            DigestState::Sha3_256(h) => h.finalize().to_vec(),
            DigestState::Sha3_512(h) => h.finalize().to_vec(),
        }
    }

    /// Digest of everything seen so far; the state keeps accumulating.
    pub fn peek(&self) -> Vec<u8> {
        self.clone().finalize()
    }

    pub fn alg(&self) -> DigestAlg {
        match self {
            DigestState::Sha1(_) => DigestAlg::Sha1,
            DigestState::Sha224(_) => DigestAlg::Sha224,
            DigestState::Sha256(_) => DigestAlg::Sha256,
            DigestState::Sha384(_) => DigestAlg::Sha384,
            DigestState::Sha512(_) => DigestAlg::Sha512,
            DigestState::Sha3_256(_) => DigestAlg::Sha3_256,
            DigestState::Sha3_512(_) => DigestAlg::Sha3_512,
        }
    }

    pub fn reset(&mut self) {
        *self = DigestState::new(self.alg());
    }
}

/// Keyed (HMAC) state over the same digest family.
#[derive(Clone)]
enum MacState {
    Sha1(Hmac<Sha1>),
    Sha224(Hmac<Sha224>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
    Sha3_256(Hmac<Sha3_256>),
    Sha3_512(Hmac<Sha3_512>),
}

macro_rules! new_mac {
    ($variant:ident, $hash:ty, $key:expr) => {
        // HMAC accepts keys of any length
        <Hmac<$hash> as Mac>::new_from_slice($key).ok().map(MacState::$variant)
    };
}

impl MacState {
    fn new(alg: DigestAlg, key: &[u8]) -> Option<Self> {
        match alg {
            DigestAlg::Sha1 => new_mac!(Sha1, Sha1, key),
            DigestAlg::Sha224 => new_mac!(Sha224, Sha224, key),
            DigestAlg::Sha256 => new_mac!(Sha256, Sha256, key),
            DigestAlg::Sha384 => new_mac!(Sha384, Sha384, key),
            DigestAlg::Sha512 => new_mac!(Sha512, Sha512, key),
            DigestAlg::Sha3_256 => new_mac!(Sha3_256, Sha3_256, key),
            DigestAlg::Sha3_512 => new_mac!(Sha3_512, Sha3_512, key),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            MacState::Sha1(m) => Mac::update(m, data),
            MacState::Sha224(m) => Mac::update(m, data),
            MacState::Sha256(m) => Mac::update(m, data),
            MacState::Sha384(m) => Mac::update(m, data),
            MacState::Sha512(m) => Mac::update(m, data),
            MacState::Sha3_256(m) => Mac::update(m, data),
            MacState::Sha3_512(m) => Mac::update(m, data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            MacState::Sha1(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha224(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha256(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha384(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha512(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha3_256(m) => m.finalize().into_bytes().to_vec(),
            MacState::Sha3_512(m) => m.finalize().into_bytes().to_vec(),
        }
    }

    /// Constant-time comparison against `tag`.
    fn verify(self, tag: &[u8]) -> bool {
        match self {
            MacState::Sha1(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha224(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha256(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha384(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha512(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha3_256(m) => m.verify_slice(tag).is_ok(),
            MacState::Sha3_512(m) => m.verify_slice(tag).is_ok(),
        }
    }
}

/// Digest accumulator used by the authenticated pipeline.
///
/// The tag is HMAC-`spec` over the plaintext, keyed with the cipher key.
/// Cloning snapshots the running state, so `tag()` and `verify()` never
/// disturb further updates.
#[derive(Clone)]
pub struct KeyedDigest {
    spec: DigestSpec,
    state: MacState,
}

impl KeyedDigest {
    pub fn new(spec: DigestSpec, key: &[u8]) -> Option<Self> {
        MacState::new(spec.alg, key).map(|state| Self { spec, state })
    }

    pub fn spec(&self) -> &DigestSpec {
        &self.spec
    }

    pub fn digest_size(&self) -> usize {
        self.spec.digest_size
    }

    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    pub fn tag(&self) -> Vec<u8> {
        self.state.clone().finalize()
    }

    /// Constant-time check of `tag` against `body`, leaving `self` untouched.
    /// A tag of the wrong length is rejected before any comparison.
    pub fn verify(&self, body: &[u8], tag: &[u8]) -> bool {
        if tag.len() != self.spec.digest_size {
            return false;
        }
        let mut state = self.state.clone();
        state.update(body);
        state.verify(tag)
    }
}

impl std::fmt::Debug for KeyedDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedDigest").field("digest", &self.spec.name).finish_non_exhaustive()
    }
}

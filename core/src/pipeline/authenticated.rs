//! pipeline/authenticated.rs
//! Cipher pipeline with an optional keyed digest over the plaintext.
//!
//! Wire format with a digest: `ENC(plaintext || MAC(plaintext))`. The tag is
//! written through the cipher after the plaintext, so on decrypt the trailing
//! `digest_size` bytes of the output are the tag.
//!
//! Internally the pipeline is a chain `CipherFilter -> BufferFilter ->
//! MemorySink`; output accumulates in the sink until drained with
//! `ciphertext()` or `plaintext()`.

use tracing::debug;

use crate::chain::Chain;
use crate::config::IoConfig;
use crate::crypto::{
    Catalog, CipherContext, CipherMode, CipherSpec, DigestSpec, Direction, KeyedDigest,
};
use crate::device::{BufferFilter, CipherFilter, MemorySink};
use crate::pipeline::types::Lifecycle;
use crate::types::StreamError;

const CIPHER_AT: usize = 0;
const BUFFER_AT: usize = 1;

#[derive(Debug)]
pub struct AuthenticatedCipher {
    spec: CipherSpec,
    digest: Option<DigestSpec>,
    direction: Direction,
    key_len: usize,
    padding: bool,
    accumulator: Option<KeyedDigest>,
    state: Lifecycle,
    chain: Chain,
}

impl AuthenticatedCipher {
    pub fn new(
        catalog: &Catalog,
        direction: Direction,
        algorithm: &str,
        digest_algorithm: Option<&str>,
    ) -> Result<Self, StreamError> {
        Self::with_config(catalog, direction, algorithm, digest_algorithm, IoConfig::default())
    }

    /// The internal chain runs with `config`; its buffer filter is
    /// `config.buffer_size` bytes.
    pub fn with_config(
        catalog: &Catalog,
        direction: Direction,
        algorithm: &str,
        digest_algorithm: Option<&str>,
        config: IoConfig,
    ) -> Result<Self, StreamError> {
        let spec = catalog.lookup_cipher(algorithm)?;
        let digest = digest_algorithm.map(|name| catalog.lookup_digest(name)).transpose()?;

        let buffer = BufferFilter::with_config(&config);
        let mut chain = Chain::with_config(MemorySink::new(), config)?;
        chain.push(buffer)?;
        chain.push(CipherFilter::new(spec, direction))?;

        debug!(cipher = spec.name, digest = ?digest.map(|d| d.name), ?direction, "authenticated cipher created");
        Ok(Self {
            spec,
            digest,
            direction,
            key_len: spec.key_length,
            padding: false,
            accumulator: None,
            state: Lifecycle::Uninitialised,
            chain,
        })
    }

    pub fn encrypt(catalog: &Catalog, algorithm: &str, digest_algorithm: Option<&str>) -> Result<Self, StreamError> {
        Self::new(catalog, Direction::Encrypt, algorithm, digest_algorithm)
    }

    pub fn decrypt(catalog: &Catalog, algorithm: &str, digest_algorithm: Option<&str>) -> Result<Self, StreamError> {
        Self::new(catalog, Direction::Decrypt, algorithm, digest_algorithm)
    }

    fn cipher_filter(&mut self) -> Result<&mut CipherFilter, StreamError> {
        self.chain
            .index_mut(CIPHER_AT)?
            .downcast_mut::<CipherFilter>()
            .ok_or_else(|| StreamError::InvalidState("cipher device missing from pipeline".into()))
    }

    fn buffer_filter(&mut self) -> Result<&mut BufferFilter, StreamError> {
        self.chain
            .index_mut(BUFFER_AT)?
            .downcast_mut::<BufferFilter>()
            .ok_or_else(|| StreamError::InvalidState("buffer device missing from pipeline".into()))
    }

    fn sink(&mut self) -> Result<&mut MemorySink, StreamError> {
        self.chain
            .terminal_mut()?
            .downcast_mut::<MemorySink>()
            .ok_or_else(|| StreamError::InvalidState("memory sink missing from pipeline".into()))
    }

    /// Keys (or re-keys) the pipeline. Nothing changes unless every check
    /// passes.
    pub fn initialise(&mut self, key: &[u8], ivector: &[u8]) -> Result<(), StreamError> {
        if key.len() != self.key_len {
            return Err(StreamError::InvalidParameter(format!(
                "invalid key length: expected {}, got {}",
                self.key_len,
                key.len()
            )));
        }
        if ivector.len() != self.spec.iv_length {
            return Err(StreamError::InvalidParameter(format!(
                "invalid ivector length: expected {}, got {}",
                self.spec.iv_length,
                ivector.len()
            )));
        }

        let context = CipherContext::new(&self.spec, self.direction, key, ivector, self.padding)?;
        let accumulator = match self.digest {
            Some(spec) => Some(KeyedDigest::new(spec, key).ok_or_else(|| {
                StreamError::InvalidParameter(format!("{} rejected the key", spec.name))
            })?),
            None => None,
        };

        // commit
        self.cipher_filter()?.install(context);
        self.buffer_filter()?.clear();
        self.sink()?.clear()?;
        self.accumulator = accumulator;
        self.state = Lifecycle::Initialised;
        debug!(cipher = self.spec.name, key_len = key.len(), "pipeline initialised");
        Ok(())
    }

    pub fn update(&mut self, data: &[u8]) -> Result<(), StreamError> {
        match self.state {
            Lifecycle::Initialised => {}
            Lifecycle::Uninitialised => {
                return Err(StreamError::InvalidState("must initialise before update".into()))
            }
            Lifecycle::Finished => {
                return Err(StreamError::InvalidState("update after finish; initialise again".into()))
            }
        }
        self.chain.write(data)?;
        if self.direction.is_encrypting() {
            if let Some(acc) = self.accumulator.as_mut() {
                acc.update(data);
            }
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<(), StreamError> {
        if self.state != Lifecycle::Initialised {
            return Err(StreamError::InvalidState(format!("cannot finish while {}", self.state)));
        }
        if self.direction.is_encrypting() {
            if let Some(tag) = self.accumulator.as_ref().map(KeyedDigest::tag) {
                self.chain.write(&tag)?;
            }
        }
        self.chain.flush()?;
        self.state = Lifecycle::Finished;
        debug!(cipher = self.spec.name, "pipeline finished");
        Ok(())
    }

    /// Drains ciphertext produced so far.
    pub fn ciphertext(&mut self) -> Result<Vec<u8>, StreamError> {
        if !self.direction.is_encrypting() {
            return Err(StreamError::InvalidState("ciphertext is only available when encrypting".into()));
        }
        Ok(self.sink()?.drain().to_vec())
    }

    /// Drains the plaintext. With a digest the trailing tag is checked and
    /// stripped; on mismatch nothing is returned.
    pub fn plaintext(&mut self) -> Result<Vec<u8>, StreamError> {
        if self.direction.is_encrypting() {
            return Err(StreamError::InvalidState("plaintext is only available when decrypting".into()));
        }
        let data = self.sink()?.drain();
        let Some(acc) = self.accumulator.as_ref() else {
            return Ok(data.to_vec());
        };
        let size = acc.digest_size();
        if data.len() < size {
            return Err(StreamError::AuthenticationFailure);
        }
        let (body, tag) = data.split_at(data.len() - size);
        if !acc.verify(body, tag) {
            return Err(StreamError::AuthenticationFailure);
        }
        Ok(body.to_vec())
    }

    /// Only for variable key length ciphers, within their accepted range.
    pub fn set_key_len(&mut self, len: usize) -> Result<(), StreamError> {
        if !self.spec.variable_key_len() || !self.spec.accepts_key_len(len) {
            return Err(StreamError::InvalidParameter("invalid key length".into()));
        }
        self.key_len = len;
        Ok(())
    }

    /// Takes effect at the next `initialise`; refused mid-message.
    pub fn set_padding(&mut self, padding: bool) -> Result<(), StreamError> {
        if self.state == Lifecycle::Initialised {
            return Err(StreamError::InvalidState("cannot change padding while initialised".into()));
        }
        self.padding = padding;
        self.cipher_filter()?.set_padding(padding);
        Ok(())
    }

    pub fn algorithm(&self) -> &'static str {
        self.spec.name
    }

    pub fn digest_algorithm(&self) -> Option<&'static str> {
        self.digest.map(|d| d.name)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_encrypting(&self) -> bool {
        self.direction.is_encrypting()
    }

    pub fn key_len(&self) -> usize {
        self.key_len
    }

    pub fn ivector_len(&self) -> usize {
        self.spec.iv_length
    }

    pub fn block_size(&self) -> usize {
        self.spec.block_size
    }

    pub fn mode(&self) -> CipherMode {
        self.spec.mode
    }

    pub fn digest_size(&self) -> Option<usize> {
        self.digest.map(|d| d.digest_size)
    }

    pub fn padding(&self) -> bool {
        self.padding
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    /// Device type codes of the internal chain, terminal first.
    pub fn kinds(&self) -> Vec<i32> {
        self.chain.kinds()
    }
}

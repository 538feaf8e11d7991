//! crypto/context.rs
//! Streaming cipher context over the RustCrypto primitives.
//!
//! `CipherContext` behaves like an EVP cipher context: `update` accepts any
//! amount of input and emits whole blocks, `finalize` handles the tail
//! (PKCS#7 padding when enabled). When decrypting with padding, the last full
//! block is held back until `finalize` so the padding can be stripped.

use cipher::{
    consts::{
        U1, U10, U11, U12, U13, U14, U15, U16, U17, U18, U19, U2, U20, U21, U22, U23, U24, U25,
        U26, U27, U28, U29, U3, U30, U31, U32, U4, U5, U6, U7, U8, U9,
    },
    generic_array::GenericArray,
    BlockDecrypt, BlockDecryptMut, BlockEncrypt, BlockEncryptMut, BlockSizeUser, KeyInit,
    KeyIvInit, StreamCipher,
};

use crate::crypto::types::{CipherAlg, CipherError, CipherMode, CipherSpec, Direction};

/// One block transform, applied in place.
trait BlockOp: Send {
    fn apply(&mut self, block: &mut [u8]);
}

trait StreamOp: Send {
    fn apply(&mut self, data: &mut [u8]);
}

impl<T: StreamCipher + Send> StreamOp for T {
    fn apply(&mut self, data: &mut [u8]) {
        self.apply_keystream(data);
    }
}

struct EcbEncrypt<C>(C);
struct EcbDecrypt<C>(C);
struct ChainEncrypt<C>(C);
struct ChainDecrypt<C>(C);

impl<C: BlockEncrypt + Send> BlockOp for EcbEncrypt<C> {
    fn apply(&mut self, block: &mut [u8]) {
        self.0.encrypt_block(GenericArray::<u8, <C as BlockSizeUser>::BlockSize>::from_mut_slice(block));
    }
}

impl<C: BlockDecrypt + Send> BlockOp for EcbDecrypt<C> {
    fn apply(&mut self, block: &mut [u8]) {
        self.0.decrypt_block(GenericArray::<u8, <C as BlockSizeUser>::BlockSize>::from_mut_slice(block));
    }
}

impl<C: BlockEncryptMut + Send> BlockOp for ChainEncrypt<C> {
    fn apply(&mut self, block: &mut [u8]) {
        self.0.encrypt_block_mut(GenericArray::<u8, <C as BlockSizeUser>::BlockSize>::from_mut_slice(block));
    }
}

impl<C: BlockDecryptMut + Send> BlockOp for ChainDecrypt<C> {
    fn apply(&mut self, block: &mut [u8]) {
        self.0.decrypt_block_mut(GenericArray::<u8, <C as BlockSizeUser>::BlockSize>::from_mut_slice(block));
    }
}

enum Engine {
    Block(Box<dyn BlockOp>),
    Stream(Box<dyn StreamOp>),
}

fn key_err(spec: &CipherSpec, actual: usize) -> CipherError {
    CipherError::InvalidKeyLen { expected: spec.key_length, actual }
}

macro_rules! aes_engine {
    ($aes:ty, $spec:expr, $direction:expr, $key:expr, $iv:expr) => {{
        let spec = $spec;
        match (spec.mode, $direction) {
            (CipherMode::Ecb, Direction::Encrypt) => Engine::Block(Box::new(EcbEncrypt(
                <$aes as KeyInit>::new_from_slice($key).map_err(|_| key_err(spec, $key.len()))?,
            ))),
            (CipherMode::Ecb, Direction::Decrypt) => Engine::Block(Box::new(EcbDecrypt(
                <$aes as KeyInit>::new_from_slice($key).map_err(|_| key_err(spec, $key.len()))?,
            ))),
            (CipherMode::Cbc, Direction::Encrypt) => Engine::Block(Box::new(ChainEncrypt(
                cbc::Encryptor::<$aes>::new_from_slices($key, $iv)
                    .map_err(|_| key_err(spec, $key.len()))?,
            ))),
            (CipherMode::Cbc, Direction::Decrypt) => Engine::Block(Box::new(ChainDecrypt(
                cbc::Decryptor::<$aes>::new_from_slices($key, $iv)
                    .map_err(|_| key_err(spec, $key.len()))?,
            ))),
            (CipherMode::Ctr, _) => Engine::Stream(Box::new(
                ctr::Ctr128BE::<$aes>::new_from_slices($key, $iv)
                    .map_err(|_| key_err(spec, $key.len()))?,
            )),
            (CipherMode::Stream, _) => return Err(CipherError::Unsupported("AES has no plain stream mode")),
        }
    }};
}

macro_rules! rc4_engine {
    ($spec:expr, $key:expr; $($len:literal => $size:ty),+ $(,)?) => {
        match $key.len() {
            $(
                $len => Engine::Stream(Box::new(
                    <rc4::Rc4<$size> as KeyInit>::new_from_slice($key)
                        .map_err(|_| key_err($spec, $len))?,
                )),
            )+
            other => return Err(key_err($spec, other)),
        }
    };
}

pub struct CipherContext {
    engine: Engine,
    direction: Direction,
    block_size: usize,
    padding: bool,
    buffered: Vec<u8>,
    finalized: bool,
}

impl CipherContext {
    /// Build a keyed context. Length checks happen here so callers can
    /// construct first and commit afterwards.
    pub fn new(
        spec: &CipherSpec,
        direction: Direction,
        key: &[u8],
        iv: &[u8],
        padding: bool,
    ) -> Result<Self, CipherError> {
        if !spec.accepts_key_len(key.len()) {
            return Err(key_err(spec, key.len()));
        }
        if iv.len() != spec.iv_length {
            return Err(CipherError::InvalidIvLen { expected: spec.iv_length, actual: iv.len() });
        }

        let engine = match spec.alg {
            CipherAlg::Aes128 => aes_engine!(aes::Aes128, spec, direction, key, iv),
            CipherAlg::Aes192 => aes_engine!(aes::Aes192, spec, direction, key, iv),
            CipherAlg::Aes256 => aes_engine!(aes::Aes256, spec, direction, key, iv),
            CipherAlg::Rc4 => rc4_engine!(spec, key;
                1 => U1, 2 => U2, 3 => U3, 4 => U4, 5 => U5, 6 => U6, 7 => U7, 8 => U8,
                9 => U9, 10 => U10, 11 => U11, 12 => U12, 13 => U13, 14 => U14, 15 => U15,
                16 => U16, 17 => U17, 18 => U18, 19 => U19, 20 => U20, 21 => U21, 22 => U22,
                23 => U23, 24 => U24, 25 => U25, 26 => U26, 27 => U27, 28 => U28, 29 => U29,
                30 => U30, 31 => U31, 32 => U32,
            ),
        };

        Ok(Self {
            engine,
            direction,
            block_size: spec.block_size,
            padding: padding && spec.is_block_mode(),
            buffered: Vec::with_capacity(spec.block_size),
            finalized: false,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_padding(&mut self, padding: bool) {
        if matches!(self.engine, Engine::Block(_)) {
            self.padding = padding;
        }
    }

    /// Input bytes waiting for a complete block.
    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finalized {
            return Err(CipherError::Finalised);
        }
        let bs = self.block_size;
        match &mut self.engine {
            Engine::Stream(op) => {
                let start = out.len();
                out.extend_from_slice(input);
                op.apply(&mut out[start..]);
            }
            Engine::Block(op) => {
                self.buffered.extend_from_slice(input);
                let mut ready = self.buffered.len() / bs * bs;
                if self.padding && self.direction == Direction::Decrypt && ready == self.buffered.len() {
                    ready = ready.saturating_sub(bs);
                }
                if ready > 0 {
                    for block in self.buffered[..ready].chunks_exact_mut(bs) {
                        op.apply(block);
                    }
                    out.extend_from_slice(&self.buffered[..ready]);
                    self.buffered.drain(..ready);
                }
            }
        }
        Ok(())
    }

    pub fn finalize(&mut self, out: &mut Vec<u8>) -> Result<(), CipherError> {
        if self.finalized {
            return Err(CipherError::Finalised);
        }
        self.finalized = true;
        let bs = self.block_size;
        let op = match &mut self.engine {
            Engine::Stream(_) => return Ok(()),
            Engine::Block(op) => op,
        };

        if !self.padding {
            if !self.buffered.is_empty() {
                return Err(CipherError::NotBlockAligned { len: self.buffered.len(), block: bs });
            }
            return Ok(());
        }

        match self.direction {
            Direction::Encrypt => {
                let pad = bs - self.buffered.len() % bs;
                self.buffered.extend(std::iter::repeat(pad as u8).take(pad));
                for block in self.buffered.chunks_exact_mut(bs) {
                    op.apply(block);
                }
                out.append(&mut self.buffered);
                Ok(())
            }
            Direction::Decrypt => {
                if self.buffered.len() != bs {
                    self.buffered.clear();
                    return Err(CipherError::BadDecrypt);
                }
                op.apply(&mut self.buffered);
                let pad = self.buffered[bs - 1] as usize;
                let valid = pad >= 1
                    && pad <= bs
                    && self.buffered[bs - pad..].iter().all(|&b| b as usize == pad);
                if !valid {
                    self.buffered.clear();
                    return Err(CipherError::BadDecrypt);
                }
                out.extend_from_slice(&self.buffered[..bs - pad]);
                self.buffered.clear();
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherContext")
            .field("direction", &self.direction)
            .field("padding", &self.padding)
            .field("buffered", &self.buffered.len())
            .field("finalized", &self.finalized)
            .finish()
    }
}

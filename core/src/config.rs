//! config.rs
//! Tunables for chain I/O loops.
//!
//! Defaults come from `constants`; a JSON document may override any subset:
//!
//! ```json
//! { "read_chunk": 512, "write_retries": 4 }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_LINE, DEFAULT_READ_CHUNK, DEFAULT_WRITE_RETRIES,
};
use crate::types::StreamError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Bytes requested per device read in `read_all` / `read_line`.
    pub read_chunk: usize,
    /// Block size of the buffer filter inside `AuthenticatedCipher`.
    pub buffer_size: usize,
    /// Line limit applied when `read_line` is called without one.
    pub max_line: usize,
    /// Consecutive `Retry` signals tolerated by a single write, at the
    /// chain and inside filters forwarding to the device below.
    pub write_retries: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_line: DEFAULT_MAX_LINE,
            write_retries: DEFAULT_WRITE_RETRIES,
        }
    }
}

impl IoConfig {
    pub fn from_json(text: &str) -> Result<Self, StreamError> {
        let cfg: IoConfig = serde_json::from_str(text)
            .map_err(|e| StreamError::InvalidParameter(format!("bad io config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.read_chunk == 0 {
            return Err(StreamError::InvalidParameter("read_chunk must be non-zero".into()));
        }
        if self.buffer_size == 0 {
            return Err(StreamError::InvalidParameter("buffer_size must be non-zero".into()));
        }
        if self.max_line == 0 {
            return Err(StreamError::InvalidParameter("max_line must be non-zero".into()));
        }
        Ok(())
    }
}

//! device/md.rs
//! Message digest filter: bytes pass through unchanged in both directions and
//! are hashed on the way. `gets` yields the digest of everything seen so far.

use crate::constants::types;
use crate::crypto::{DigestSpec, DigestState};
use crate::device::{Capabilities, ControlOp, Device, DeviceError, DeviceResult, Next};
use crate::utils::to_hex;

#[derive(Clone)]
pub struct DigestFilter {
    spec: DigestSpec,
    state: DigestState,
}

impl DigestFilter {
    pub fn new(spec: DigestSpec) -> Self {
        Self { spec, state: DigestState::new(spec.alg) }
    }

    pub fn spec(&self) -> &DigestSpec {
        &self.spec
    }

    /// Digest so far; hashing continues afterwards.
    pub fn digest(&self) -> Vec<u8> {
        self.state.peek()
    }

    pub fn hexdigest(&self) -> String {
        to_hex(&self.digest())
    }
}

impl Device for DigestFilter {
    fn kind(&self) -> i32 {
        types::MD
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn write(&mut self, mut next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        let n = next.write(buf)?;
        self.state.update(&buf[..n.min(buf.len())]);
        Ok(n)
    }

    fn read(&mut self, mut next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        let n = next.read(buf)?;
        self.state.update(&buf[..n]);
        Ok(n)
    }

    fn puts(&mut self, next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.write(next, line)
    }

    fn gets(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        let digest = self.digest();
        if buf.len() < digest.len() {
            return Err(DeviceError::failure(format!(
                "digest needs {} bytes, buffer holds {}",
                digest.len(),
                buf.len()
            )));
        }
        buf[..digest.len()].copy_from_slice(&digest);
        Ok(digest.len())
    }

    fn control(&mut self, mut next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        if op == ControlOp::Reset {
            self.state.reset();
        }
        next.forward_control(op, arg)
    }

    fn yields_lines(&self) -> bool {
        false
    }

    device_any!();
}

impl std::fmt::Debug for DigestFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestFilter").field("digest", &self.spec.name).finish()
    }
}

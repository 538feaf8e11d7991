//! telemetry/counters.rs
//! Mutable counters updated by the chain façade.
//!
//! Counts are taken at the head of the chain: bytes the caller handed in or
//! received, not bytes that reached the terminal after filtering.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCounters {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub lines_read: u64,
    pub lines_written: u64,
    pub flushes: u64,
    pub write_retries: u64,
}

impl IoCounters {
    #[inline]
    pub fn add_read(&mut self, n: usize) {
        self.bytes_read += n as u64;
    }

    #[inline]
    pub fn add_write(&mut self, n: usize) {
        self.bytes_written += n as u64;
    }

    pub fn add_line_read(&mut self, len: usize) {
        self.lines_read += 1;
        self.add_read(len);
    }

    pub fn add_line_written(&mut self) {
        self.lines_written += 1;
    }

    pub fn add_flush(&mut self) {
        self.flushes += 1;
    }

    pub fn add_retry(&mut self) {
        self.write_retries += 1;
    }

    pub fn to_json(&self) -> String {
        // Serializing a struct of integers cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl AddAssign for IoCounters {
    fn add_assign(&mut self, other: Self) {
        self.bytes_read += other.bytes_read;
        self.bytes_written += other.bytes_written;
        self.lines_read += other.lines_read;
        self.lines_written += other.lines_written;
        self.flushes += other.flushes;
        self.write_retries += other.write_retries;
    }
}

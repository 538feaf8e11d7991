//! device/file.rs
//! OS file terminals: a path-opened file and (on unix) an owned descriptor.
//!
//! Both keep the OS position authoritative: `Seek`/`Tell` map straight onto
//! it and `gets` rewinds whatever it read past the newline.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::constants::types;
use crate::device::{Capabilities, CloseFlag, ControlOp, Device, DeviceError, DeviceResult, Next};
use crate::types::StreamError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileMode {
    /// `r`
    Read,
    /// `r+`
    ReadUpdate,
    /// `w`
    Write,
    /// `w+`
    WriteUpdate,
    /// `a`
    Append,
    /// `a+`
    AppendUpdate,
}

impl FileMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FileMode::Read => "r",
            FileMode::ReadUpdate => "r+",
            FileMode::Write => "w",
            FileMode::WriteUpdate => "w+",
            FileMode::Append => "a",
            FileMode::AppendUpdate => "a+",
        }
    }

    pub fn readable(self) -> bool {
        !matches!(self, FileMode::Write | FileMode::Append)
    }

    pub fn writable(self) -> bool {
        self != FileMode::Read
    }

    fn options(self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        match self {
            FileMode::Read => opts.read(true),
            FileMode::ReadUpdate => opts.read(true).write(true),
            FileMode::Write => opts.write(true).create(true).truncate(true),
            FileMode::WriteUpdate => opts.read(true).write(true).create(true).truncate(true),
            FileMode::Append => opts.append(true).create(true),
            FileMode::AppendUpdate => opts.read(true).append(true).create(true),
        };
        opts
    }
}

impl FromStr for FileMode {
    type Err = StreamError;

    /// Accepts the six stdio modes with at most one `b`, either last (`r+b`)
    /// or before the `+` (`rb+`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let core = match s.strip_suffix('b') {
            Some(rest) => rest.to_string(),
            None if s.len() == 3 && s.ends_with("b+") => format!("{}+", &s[..1]),
            None => s.to_string(),
        };
        match core.as_str() {
            "r" => Ok(FileMode::Read),
            "r+" => Ok(FileMode::ReadUpdate),
            "w" => Ok(FileMode::Write),
            "w+" => Ok(FileMode::WriteUpdate),
            "a" => Ok(FileMode::Append),
            "a+" => Ok(FileMode::AppendUpdate),
            _ => Err(StreamError::InvalidParameter(format!(
                "mode string must be one of 'a' 'a+' 'r' 'r+' 'w' 'w+', not {:?}",
                s
            ))),
        }
    }
}

/// State shared by the file and descriptor terminals.
#[derive(Debug)]
struct Backing {
    file: Option<File>,
    readable: bool,
    writable: bool,
    close: CloseFlag,
    reads: u64,
    saw_eof: bool,
}

impl Backing {
    fn new(file: File, readable: bool, writable: bool, close: CloseFlag) -> Self {
        Self { file: Some(file), readable, writable, close, reads: 0, saw_eof: false }
    }

    fn file(&mut self) -> DeviceResult<&mut File> {
        self.file.as_mut().ok_or_else(|| DeviceError::failure("file already released"))
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::SEEK;
        caps.set(Capabilities::READ, self.readable);
        caps.set(Capabilities::WRITE, self.writable);
        caps
    }

    fn write(&mut self, buf: &[u8]) -> DeviceResult<usize> {
        if !self.writable {
            return Err(DeviceError::failure("file not opened for writing"));
        }
        Ok(self.file()?.write(buf)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        if !self.readable {
            return Err(DeviceError::failure("file not opened for reading"));
        }
        let n = self.file()?.read(buf)?;
        self.reads += 1;
        self.saw_eof = n == 0 && !buf.is_empty();
        Ok(n)
    }

    fn gets(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        let n = self.read(buf)?;
        match buf[..n].iter().position(|&b| b == b'\n') {
            Some(pos) if pos + 1 < n => {
                let overshoot = (n - pos - 1) as i64;
                self.file()?.seek(SeekFrom::Current(-overshoot))?;
                Ok(pos + 1)
            }
            _ => Ok(n),
        }
    }

    fn control(&mut self, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        match op {
            ControlOp::Flush => {
                self.file()?.flush()?;
                Ok(1)
            }
            ControlOp::Reset => {
                self.file()?.seek(SeekFrom::Start(0))?;
                self.saw_eof = false;
                Ok(0)
            }
            ControlOp::FileSeek => {
                let target = u64::try_from(arg)
                    .map_err(|_| DeviceError::failure(format!("negative seek offset {arg}")))?;
                let pos = self.file()?.seek(SeekFrom::Start(target))?;
                self.saw_eof = false;
                Ok(pos as i64)
            }
            ControlOp::FileTell => Ok(self.file()?.stream_position()? as i64),
            ControlOp::Eof => Ok((self.reads > 0 && self.saw_eof) as i64),
            ControlOp::Pending | ControlOp::WPending => Ok(0),
            ControlOp::GetClose => Ok(self.close.to_raw()),
            ControlOp::SetClose => {
                self.close = CloseFlag::from_raw(arg);
                Ok(1)
            }
            ControlOp::Dup => Ok(1),
        }
    }
}

impl Drop for Backing {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if self.close == CloseFlag::NoClose {
                // the OS handle outlives this device
                std::mem::forget(file);
            }
        }
    }
}

/// File opened from a path.
#[derive(Debug)]
pub struct FileBacking {
    path: PathBuf,
    mode: FileMode,
    inner: Backing,
}

impl FileBacking {
    pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<Self, StreamError> {
        let mode: FileMode = mode.parse()?;
        let path = path.as_ref().to_path_buf();
        let file = mode.options().open(&path)?;
        debug!(path = %path.display(), mode = mode.as_str(), "file backing opened");
        Ok(Self {
            inner: Backing::new(file, mode.readable(), mode.writable(), CloseFlag::Close),
            path,
            mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }
}

impl Device for FileBacking {
    fn kind(&self) -> i32 {
        types::FILE
    }

    fn capabilities(&self) -> Capabilities {
        self.inner.capabilities()
    }

    fn write(&mut self, _next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
        self.inner.write(buf)
    }

    fn read(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        self.inner.read(buf)
    }

    fn puts(&mut self, _next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
        self.inner.write(line)
    }

    fn gets(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
        self.inner.gets(buf)
    }

    fn control(&mut self, _next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
        self.inner.control(op, arg)
    }

    device_any!();
}

#[cfg(unix)]
pub use self::descriptor::DescriptorBacking;

#[cfg(unix)]
mod descriptor {
    use std::fs::File;
    use std::os::fd::{AsRawFd, OwnedFd, RawFd};

    use super::Backing;
    use crate::constants::types;
    use crate::device::{Capabilities, CloseFlag, ControlOp, Device, DeviceResult, Next};

    /// Owned OS descriptor. With `CloseFlag::NoClose` the descriptor is left
    /// open when the device is released.
    #[derive(Debug)]
    pub struct DescriptorBacking {
        fd: RawFd,
        inner: Backing,
    }

    impl DescriptorBacking {
        pub fn new(fd: OwnedFd, close: CloseFlag) -> Self {
            let raw = fd.as_raw_fd();
            Self { fd: raw, inner: Backing::new(File::from(fd), true, true, close) }
        }

        pub fn raw_fd(&self) -> RawFd {
            self.fd
        }
    }

    impl Device for DescriptorBacking {
        fn kind(&self) -> i32 {
            types::FD
        }

        fn capabilities(&self) -> Capabilities {
            self.inner.capabilities()
        }

        fn write(&mut self, _next: Next<'_>, buf: &[u8]) -> DeviceResult<usize> {
            self.inner.write(buf)
        }

        fn read(&mut self, _next: Next<'_>, buf: &mut [u8]) -> DeviceResult<usize> {
            self.inner.read(buf)
        }

        fn puts(&mut self, _next: Next<'_>, line: &[u8]) -> DeviceResult<usize> {
            self.inner.write(line)
        }

        fn control(&mut self, _next: Next<'_>, op: ControlOp, arg: i64) -> DeviceResult<i64> {
            self.inner.control(op, arg)
        }

        device_any!();
    }
}

use std::io::SeekFrom;

use tempfile::tempdir;

use tlsio_core::chain::Chain;
use tlsio_core::constants::types;
use tlsio_core::device::{FileBacking, FileMode};
use tlsio_core::types::StreamError;

// ## 1. path-opened files

#[test]
fn write_then_read_lines_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lines.txt");

    let mut out = Chain::file(&path, "w").unwrap();
    assert_eq!(out.kinds(), vec![types::FILE]);
    out.write(b"HELLO\nWORLD\n").unwrap();
    out.flush().unwrap();
    out.close();

    let mut input = Chain::file(&path, "r").unwrap();
    assert_eq!(input.read_line(None).unwrap(), b"HELLO\n");
    assert_eq!(input.read_line(None).unwrap(), b"WORLD\n");
    assert!(input.read_line(None).unwrap().is_empty());
}

#[test]
fn eof_only_after_a_read_hit_the_end() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.bin");
    std::fs::write(&path, b"abc").unwrap();

    let mut chain = Chain::file(&path, "rb").unwrap();
    assert!(!chain.eof().unwrap());
    assert_eq!(chain.read_all().unwrap(), b"abc");
    assert!(chain.eof().unwrap());
}

#[test]
fn seek_and_tell_use_the_os_position() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pos.bin");

    let mut chain = Chain::file(&path, "w+").unwrap();
    chain.write(b"abcdef").unwrap();
    assert_eq!(chain.tell().unwrap(), 6);
    chain.seek(SeekFrom::Start(2)).unwrap();
    assert_eq!(chain.read(2).unwrap(), b"cd");
    assert_eq!(chain.tell().unwrap(), 4);
    assert!(chain.is_seekable().unwrap());
}

#[test]
fn line_reads_leave_the_position_after_the_newline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mixed.txt");
    std::fs::write(&path, b"one\ntwo\n").unwrap();

    let mut chain = Chain::file(&path, "r").unwrap();
    assert_eq!(chain.read_line(None).unwrap(), b"one\n");
    assert_eq!(chain.tell().unwrap(), 4);
    assert_eq!(chain.read_all().unwrap(), b"two\n");
}

#[test]
fn append_mode_keeps_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.txt");
    std::fs::write(&path, b"first\n").unwrap();

    let mut chain = Chain::file(&path, "a").unwrap();
    assert!(chain.is_writable().unwrap());
    assert!(!chain.is_readable().unwrap());
    chain.write(b"second\n").unwrap();
    chain.close();

    assert_eq!(std::fs::read(&path).unwrap(), b"first\nsecond\n");
}

#[test]
fn read_only_file_refuses_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ro.txt");
    std::fs::write(&path, b"x").unwrap();

    let mut chain = Chain::file(&path, "r").unwrap();
    assert!(!chain.is_writable().unwrap());
    assert!(matches!(chain.write(b"y"), Err(StreamError::Io(_))));
}

#[test]
fn bad_mode_and_missing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing.txt");

    match Chain::file(&path, "x") {
        Err(StreamError::InvalidParameter(msg)) => assert!(msg.contains("mode string")),
        other => panic!("unexpected {other:?}"),
    }
    match Chain::file(&path, "r") {
        Err(StreamError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn mode_parsing() {
    assert_eq!("r".parse::<FileMode>().unwrap(), FileMode::Read);
    assert_eq!("rb+".parse::<FileMode>().unwrap(), FileMode::ReadUpdate);
    assert_eq!("a+".parse::<FileMode>().unwrap(), FileMode::AppendUpdate);
    assert!("rw".parse::<FileMode>().is_err());
    assert_eq!("r+b".parse::<FileMode>().unwrap(), FileMode::ReadUpdate);
    assert_eq!("wb".parse::<FileMode>().unwrap(), FileMode::Write);
    for bad in ["bbr", "r+bb", "rbb", "b", "brb", "rb+b", ""] {
        assert!(bad.parse::<FileMode>().is_err(), "{bad:?}");
    }
    assert!(FileMode::WriteUpdate.readable());
    assert!(!FileMode::Write.readable());
}

#[test]
fn backing_remembers_path_and_mode() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("meta.txt");
    let backing = FileBacking::open(&path, "w").unwrap();
    assert_eq!(backing.path(), path.as_path());
    assert_eq!(backing.mode(), FileMode::Write);
}

// ## 2. descriptors

#[cfg(unix)]
mod descriptors {
    use std::io::SeekFrom;
    use std::os::fd::OwnedFd;

    use tlsio_core::chain::Chain;
    use tlsio_core::constants::types;
    use tlsio_core::device::{CloseFlag, DescriptorBacking};

    #[test]
    fn descriptor_round_trip_without_gets() {
        let file = tempfile::tempfile().unwrap();
        let mut chain = Chain::descriptor(OwnedFd::from(file), CloseFlag::Close);
        assert_eq!(chain.kinds(), vec![types::FD]);

        chain.write(b"ab\ncd").unwrap();
        chain.seek(SeekFrom::Start(0)).unwrap();
        // no gets on descriptors: the chain falls back to single-byte reads
        assert_eq!(chain.read_line(None).unwrap(), b"ab\n");
        assert_eq!(chain.read_line(None).unwrap(), b"cd");
        assert!(chain.read_line(None).unwrap().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn no_close_leaves_descriptor_open() {
        let file = tempfile::tempfile().unwrap();
        let keep = file.try_clone().unwrap();
        let backing = DescriptorBacking::new(OwnedFd::from(file), CloseFlag::NoClose);
        let fd = backing.raw_fd();

        let mut chain = Chain::new(backing);
        chain.write(b"kept").unwrap();
        chain.close();

        assert!(std::fs::read_link(format!("/proc/self/fd/{fd}")).is_ok());
        assert_eq!(keep.metadata().unwrap().len(), 4);
    }
}

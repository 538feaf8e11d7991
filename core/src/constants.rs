//! constants.rs
//! Native integer values shared with the toolkit's C interface, plus engine defaults.
//!
//! Every value in `ctrl`, `close`, `types` and `codes` is taken verbatim from
//! `openssl/bio.h`; bindings must not renumber them.

/// Control command codes (`BIO_CTRL_*` / `BIO_C_*`).
pub mod ctrl {
    pub const RESET: i32     = 1;
    pub const EOF: i32       = 2;
    pub const GET_CLOSE: i32 = 8;
    pub const SET_CLOSE: i32 = 9;
    pub const PENDING: i32   = 10;
    pub const FLUSH: i32     = 11;
    pub const DUP: i32       = 12;
    pub const WPENDING: i32  = 13;
    pub const FILE_SEEK: i32 = 128;
    pub const FILE_TELL: i32 = 133;
}

/// Close-ownership flags (`BIO_CLOSE` / `BIO_NOCLOSE`).
pub mod close {
    pub const NOCLOSE: i64 = 0x00;
    pub const CLOSE: i64   = 0x01;
}

/// Device type codes (`BIO_TYPE_*`).
pub mod types {
    pub const DESCRIPTOR: i32  = 0x0100;
    pub const FILTER: i32      = 0x0200;
    pub const SOURCE_SINK: i32 = 0x0400;

    pub const NONE: i32        = 0;
    pub const MEM: i32         = 1 | SOURCE_SINK;
    pub const FILE: i32        = 2 | SOURCE_SINK;
    pub const FD: i32          = 4 | SOURCE_SINK | DESCRIPTOR;
    pub const NULL: i32        = 6 | SOURCE_SINK;
    pub const MD: i32          = 8 | FILTER;
    pub const BUFFER: i32      = 9 | FILTER;
    pub const CIPHER: i32      = 10 | FILTER;
    pub const BASE64: i32      = 11 | FILTER;
    pub const NULL_FILTER: i32 = 17 | FILTER;
    pub const COMP: i32        = 23 | FILTER;
    /// Host adapters register as a source/sink with the low byte saturated.
    pub const HOST: i32        = SOURCE_SINK | 0xFF;
}

/// Return codes used by device callbacks on the native side.
pub mod codes {
    pub const ERROR: i64           = -1;
    pub const NOT_IMPLEMENTED: i64 = -2;
}

/// Object-name categories (`OBJ_NAME_TYPE_*`).
pub mod obj_name {
    pub const MD_METH: i32     = 0x01;
    pub const CIPHER_METH: i32 = 0x02;
}

/// EVP cipher mode numbers (`EVP_CIPH_*_MODE`).
pub mod cipher_modes {
    pub const STREAM: u32 = 0x0;
    pub const ECB: u32    = 0x1;
    pub const CBC: u32    = 0x2;
    pub const CTR: u32    = 0x5;
}

/// Default block size of the buffering filter (matches `DEFAULT_BUFFER_SIZE`).
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Chunk used by `read_all`, `read_line` and the filters when pulling from below.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Upper bound for a single `read_line` when the caller passes no limit.
pub const DEFAULT_MAX_LINE: usize = 1024 * 1024;

/// How many consecutive `Retry` signals a chain write tolerates.
pub const DEFAULT_WRITE_RETRIES: usize = 16;

/// Base64 line width produced by the codec (characters, excluding `\n`).
pub const BASE64_LINE_WIDTH: usize = 64;

/// Largest digest output in the catalog (SHA-512).
pub const MAX_DIGEST_SIZE: usize = 64;

/// Default salt length for `derive_key`.
pub const DEFAULT_SALT_LEN: usize = 8;

/// Default PBKDF2 iteration count for `derive_key`.
pub const DEFAULT_KDF_ITERATIONS: u32 = 1000;

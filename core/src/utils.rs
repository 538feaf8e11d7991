use std::fmt;
use num_enum::TryFromPrimitive;

use crate::constants::types;

pub fn enum_name_or_hex<T>(raw: T::Primitive) -> String
where
    T: TryFromPrimitive + fmt::Debug,
    T::Primitive: fmt::LowerHex,
{
    match T::try_from_primitive(raw) {
        Ok(variant) => format!("{:?}", variant),
        Err(_) => format!("0x{:x}", raw),
    }
}

/// Human readable name for a device type code.
pub fn kind_name(kind: i32) -> &'static str {
    match kind {
        types::MEM => "memory buffer",
        types::FILE => "FILE pointer",
        types::FD => "file descriptor",
        types::NULL => "NULL",
        types::MD => "message digest",
        types::BUFFER => "buffer",
        types::CIPHER => "cipher",
        types::BASE64 => "base64 encoding",
        types::NULL_FILTER => "NULL filter",
        types::COMP => "zlib compression",
        types::HOST => "host stream",
        _ => "unknown",
    }
}

/// Canonical catalog key: ASCII upper case, surrounding whitespace removed.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

/// Lower-case hex rendering used by digest accessors.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

pub mod types;
pub mod catalog;
pub mod context;
pub mod digest;
pub mod kdf;

pub use self::types::*;
pub use self::catalog::*;
pub use self::context::*;
pub use self::digest::*;
pub use self::kdf::*;

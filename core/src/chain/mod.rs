//! chain/mod.rs
//! Device stacks and the stream façade over them.

pub mod stack;
pub mod io;

pub use self::stack::Chain;

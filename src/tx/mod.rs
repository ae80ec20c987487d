//! Transaction Module
//!
//! Translates caller transactions into device signing requests and decodes
//! the signed payloads the device returns.

mod decode;
mod input;
mod request;

pub use decode::*;
pub use input::*;
pub use request::*;

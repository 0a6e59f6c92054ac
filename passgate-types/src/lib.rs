//! # Passgate Types
//!
//! Type definitions for the wire payloads and platform authenticator surface
//! consumed by the `passgate` client libraries.

mod utils;

pub mod provider;
pub mod token;
pub mod webauthn;

// Re-exports
pub use utils::{
    bytes::Bytes,
    encoding::{self, CodecError},
    rand,
};

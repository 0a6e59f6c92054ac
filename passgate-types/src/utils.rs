pub(crate) mod bytes;
pub(crate) mod serde;

pub mod encoding;
pub mod rand;

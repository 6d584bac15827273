//! Payload encoding and response decoding
//!
//! Pure translation between the uniform conversation model and each
//! provider family's wire format.

pub mod decode;
pub mod encode;

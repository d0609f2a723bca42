//! JWT encoding, decoding, and claims.

pub mod claims;
pub mod codec;

pub use claims::{Claims, TokenScope};
pub use codec::TokenCodec;

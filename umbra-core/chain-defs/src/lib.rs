pub mod abi;
pub mod address;
pub mod block;
pub mod circuit;
pub mod codec;
pub mod contracts;
pub mod crypto;
pub mod logs;
pub mod packing;
pub mod receipt;
pub mod tx;
mod utils;

pub use address::Address;
pub use crypto::{Fr, PublicKey};

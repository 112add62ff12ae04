//! User memory protection keys.
//!
//! `UPKRU` holds two bits per key (access-disable, write-disable) for 32 keys,
//! `SPKCTL.PKE` switches the mechanism on for U-mode. Keys are carried in PTE bits
//! 58:54 by the VMA layer; key 0 is the default key of every mapping.

pub mod pkeys;
pub mod pkru;

pub use pkeys::*;
pub use pkru::*;

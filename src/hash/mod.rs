//! Value identity hashing.
//!
//! Selection tracks values by a derived hash key rather than by equality,
//! so externally owned values can be matched across option re-mounts and
//! model writes. Implementation details live in the private `core` module.

mod core;

pub use core::{HashKey, IdentityArena, IdentityHasher, KeyPolicy, OptionValue};

// Thin re-export module: implementation is in `blockchain/core.rs` so the
// store and its validation rules can evolve separately.

pub mod core;
pub use core::*;

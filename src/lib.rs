//! Virtual CPU for the AssEmbly instruction set.
//!
//! Loads raw AssEmbly bytecode into a flat byte-addressable memory and runs it
//! on a sixteen-register 64-bit processor, including the signed, floating-point,
//! extended and external-assembly extension sets.

pub mod processor;
pub mod utils;

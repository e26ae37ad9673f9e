//! Derive macros for the `assembly-cpu` crate.
//!
//! - `#[derive(Error)]` implements `Display` and `std::error::Error` from
//!   per-variant `#[error("...")]` messages.

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `std::error::Error` for an error enum or struct.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}

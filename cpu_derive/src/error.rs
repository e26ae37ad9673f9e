//! `#[derive(Error)]` expansion.
//!
//! ```ignore
//! use cpu_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum ProcessorError {
//!     #[error("division by zero in {instruction}")]
//!     DivideByZero { instruction: &'static str },
//!
//!     #[error("unknown extension set {0:#04X}")]
//!     UnknownSet(u8),
//!
//!     #[error("console input ended")]
//!     ConsoleInputEnded,
//! }
//! ```
//!
//! Named fields are interpolated by name, tuple fields by position (`{0}`),
//! and any format spec after the field (`{0:#04X}`, `{address:#x}`) is kept.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(|variant| {
                    let ident = &variant.ident;
                    let message = message(&variant.attrs, variant)?;
                    Ok(match &variant.fields {
                        Fields::Unit => quote! { Self::#ident => f.write_str(#message), },
                        Fields::Named(fields) => {
                            let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                            quote! {
                                Self::#ident { #(#names),* } => {
                                    write!(f, #message, #(#names = #names),*)
                                }
                            }
                        }
                        Fields::Unnamed(fields) => {
                            let bindings = positional_bindings(fields.unnamed.len());
                            let message = rename_positional(&message, fields.unnamed.len());
                            quote! {
                                Self::#ident(#(#bindings),*) => {
                                    write!(f, #message, #(#bindings = #bindings),*)
                                }
                            }
                        }
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message = message(&input.attrs, &input.ident)?;
            match &data.fields {
                Fields::Unit => quote! { f.write_str(#message) },
                Fields::Named(fields) => {
                    let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
                    quote! { write!(f, #message, #(#names = self.#names),*) }
                }
                Fields::Unnamed(fields) => {
                    let bindings = positional_bindings(fields.unnamed.len());
                    let indices = (0..fields.unnamed.len()).map(syn::Index::from);
                    let message = rename_positional(&message, fields.unnamed.len());
                    quote! { write!(f, #message, #(#bindings = self.#indices),*) }
                }
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "#[derive(Error)] is only supported on enums and structs",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Reads the string literal out of the first `#[error(...)]` attribute.
fn message<T: ToTokens>(attrs: &[Attribute], target: &T) -> syn::Result<String> {
    let attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("error"))
        .ok_or_else(|| {
            syn::Error::new_spanned(target, "missing #[error(\"...\")] message")
        })?;
    let lit: LitStr = attr.parse_args().map_err(|_| {
        syn::Error::new_spanned(attr, "expected a string literal, e.g. #[error(\"bad opcode {0}\")]")
    })?;
    Ok(lit.value())
}

fn positional_bindings(count: usize) -> Vec<syn::Ident> {
    (0..count).map(|i| format_ident!("_{}", i)).collect()
}

/// Rewrites `{0}` / `{0:...}` into `{_0}` / `{_0:...}` so tuple fields can be
/// passed as named format arguments.
fn rename_positional(message: &str, count: usize) -> String {
    let mut out = message.to_string();
    for i in (0..count).rev() {
        out = out
            .replace(&format!("{{{}}}", i), &format!("{{_{}}}", i))
            .replace(&format!("{{{}:", i), &format!("{{_{}:", i));
    }
    out
}

//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
extern crate proc_macro;
extern crate proc_macro2;
extern crate syn;
#[macro_use]
extern crate quote;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type};

/// Derive macro to specify a struct that can be filled directly from a FileMaker
/// [`Record`](../filemaker_rust_sdk/struct.Record.html).
///
/// Each struct field to be mapped carries an `fm` attribute:
///
/// - `#[fm(field = "Remote Name")]` copies the named record field into the struct
///   field, converting it through `FromFieldValue`.
/// - `#[fm(nested)]` maps the struct field (itself an `FMRecord`) from the same record.
///   If the field is an `Option<S>`, it is only mapped when it is already `Some`.
///
/// Fields without an `fm` attribute are left untouched.
///
/// Every mapped field is attempted. A field that fails to convert keeps its
/// previous value (an `Option` field is set to `None`), and the first failure
/// is returned once all fields have been visited.
#[proc_macro_derive(FMRecord, attributes(fm))]
pub fn fm_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_fm_record(input) {
        Ok(ts) => ts.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

enum Mapping {
    Field(String),
    Nested,
}

fn impl_fm_record(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(d) => match &d.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "FMRecord only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "FMRecord only supports Struct datatypes",
            ))
        }
    };

    let mut body = TokenStream2::default();
    for field in fields {
        let mut mapping: Option<Mapping> = None;
        for a in &field.attrs {
            if !a.path().is_ident("fm") {
                continue;
            }
            a.parse_nested_meta(|meta| {
                if meta.path.is_ident("field") {
                    let s: LitStr = meta.value()?.parse()?;
                    mapping = Some(Mapping::Field(s.value()));
                    return Ok(());
                }
                if meta.path.is_ident("nested") {
                    mapping = Some(Mapping::Nested);
                    return Ok(());
                }
                Err(meta.error("expected `field = \"...\"` or `nested`"))
            })?;
        }

        let ident = match &field.ident {
            Some(i) => i,
            None => continue,
        };
        let ty = &field.ty;
        match mapping {
            Some(Mapping::Field(remote)) => {
                let on_err = if option_inner(ty).is_some() {
                    quote! { self.#ident = None; }
                } else {
                    TokenStream2::default()
                };
                body.extend(quote! {
                    match <#ty as ::filemaker_rust_sdk::FromFieldValue>::from_field(
                        #remote,
                        record.get(#remote),
                        tz,
                    ) {
                        Ok(v) => self.#ident = v,
                        Err(e) => {
                            #on_err
                            first_err.get_or_insert(e);
                        }
                    }
                });
            }
            Some(Mapping::Nested) => {
                if let Some(inner) = option_inner(ty) {
                    body.extend(quote! {
                        if let Some(v) = self.#ident.as_mut() {
                            if let Err(e) = <#inner as ::filemaker_rust_sdk::FMRecord>::map_from(v, record, tz) {
                                first_err.get_or_insert(e);
                            }
                        }
                    });
                } else {
                    body.extend(quote! {
                        if let Err(e) = <#ty as ::filemaker_rust_sdk::FMRecord>::map_from(&mut self.#ident, record, tz) {
                            first_err.get_or_insert(e);
                        }
                    });
                }
            }
            None => {}
        }
    }

    Ok(quote! {
        impl #impl_generics ::filemaker_rust_sdk::FMRecord for #name #ty_generics #where_clause {
            fn map_from(
                &mut self,
                record: &::filemaker_rust_sdk::Record,
                tz: &::filemaker_rust_sdk::FixedOffset,
            ) -> ::std::result::Result<(), ::filemaker_rust_sdk::FMError> {
                #[allow(unused_mut)]
                let mut first_err: ::std::option::Option<::filemaker_rust_sdk::FMError> = None;
                #body
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
        }
    })
}

// Returns T for a type spelled Option<T> (or a path ending in Option<T>).
fn option_inner(ty: &Type) -> Option<&Type> {
    let p = match ty {
        Type::Path(p) if p.qself.is_none() => p,
        _ => return None,
    };
    let last = p.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    if let PathArguments::AngleBracketed(args) = &last.arguments {
        if let Some(GenericArgument::Type(t)) = args.args.first() {
            return Some(t);
        }
    }
    None
}

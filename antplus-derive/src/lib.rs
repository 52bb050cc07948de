// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Derives for the `antplus` crate.
//!
//! `#[derive(AntTx)]` turns a packed struct into a transmittable message. The message id defaults
//! to the `TxMessageId` variant with the same name as the struct, use `#[ant_tx(id = "Variant")]`
//! when the names differ.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::Ident;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, LitStr};

#[proc_macro_derive(AntTx, attributes(ant_tx))]
pub fn derive_ant_tx(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match impl_ant_tx(&ast) {
        Ok(gen) => gen.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn message_id(ast: &DeriveInput) -> syn::Result<Ident> {
    let mut id = ast.ident.clone();
    for attr in ast.attrs.iter().filter(|a| a.path().is_ident("ant_tx")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let lit: LitStr = meta.value()?.parse()?;
                id = lit.parse()?;
                Ok(())
            } else {
                Err(meta.error("expected `id = \"<TxMessageId variant>\"`"))
            }
        })?;
    }
    Ok(id)
}

fn impl_ant_tx(ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &ast.ident;
    let id = message_id(ast)?;
    Ok(quote! {
        impl crate::messages::TransmitableMessage for #name {
            fn serialize_message(
                &self,
                buf: &mut [u8],
            ) -> Result<usize, ::packed_struct::PackingError> {
                let len = ::packed_struct::PackedStructSlice::packed_bytes_size(Some(self))?;
                if buf.len() < len {
                    return Err(::packed_struct::PackingError::BufferTooSmall);
                }
                ::packed_struct::PackedStructSlice::pack_to_slice(self, &mut buf[..len])?;
                Ok(len)
            }
            fn get_tx_msg_id(&self) -> crate::messages::TxMessageId {
                crate::messages::TxMessageId::#id
            }
        }
        impl From<#name> for crate::messages::TxMessage {
            fn from(msg: #name) -> crate::messages::TxMessage {
                crate::messages::TxMessage::#name(msg)
            }
        }
    })
}

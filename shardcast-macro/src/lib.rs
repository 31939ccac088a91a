// Copyright 2015-2020 Shardcast contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;

// Turns an `async fn` test into a plain #[test] that drives the future to
// completion on whichever runtime the workspace was built with.
#[doc(hidden)]
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let test_fn = syn::parse_macro_input!(input as syn::ItemFn);

    if test_fn.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            &test_fn.sig.fn_token,
            "this attribute only supports async fns; use #[test] directly",
        )
        .to_compile_error()
        .into();
    }

    let attrs = &test_fn.attrs;
    let name = &test_fn.sig.ident;
    let ret = &test_fn.sig.output;
    let body = &test_fn.block;
    let future = quote! { async move #body };
    let runner = runtime_entry(future);

    let expanded = quote! {
        #[test]
        #(#attrs)*
        fn #name() #ret {
            #runner
        }
    };
    expanded.into()
}

// The blocking entry point of the selected runtime, wrapped around the
// test future. Resolved at macro-crate compile time, since the runtime
// features are mutually exclusive workspace-wide.
fn runtime_entry(future: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    if cfg!(feature = "rt-tokio") {
        quote! {
            ::shardcast_rt::tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to start the test runtime")
                .block_on(#future)
        }
    } else if cfg!(feature = "rt-async-std") {
        quote! {
            ::shardcast_rt::async_std::task::block_on(#future)
        }
    } else {
        quote! {
            ::core::compile_error!(
                "enable one of the 'rt-tokio' / 'rt-async-std' features to run async tests"
            )
        }
    }
}

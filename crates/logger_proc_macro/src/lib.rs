use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{parse_macro_input, FnArg, ItemFn, Pat, ReturnType};
use quote::quote;

#[derive(Eq, PartialEq)]
enum ProcLogLevel {
    Trace,
    Debug,
}

// #[log(trace)] or #[log(debug)]
//
// #[log(trace)] logs the function arguments and return value
// #[log(trace)] is only applicable to function which parameters and return type implement Debug
//
// #[log(debug)] logs the function arguments and their types
//
// Note: If logger level is below Trace, #[log(trace)] falls back to the #[log(debug)] output
//
// The expansion refers to `::logger`, so the annotated crate must depend on it.

#[proc_macro_attribute]
pub fn log(attr: TokenStream, item: TokenStream) -> TokenStream {
    let log_level = match attr.to_string().trim_matches('"').to_lowercase().as_str() {
        "trace" => ProcLogLevel::Trace,
        "debug" => ProcLogLevel::Debug,
        other => {
            let message = format!("Invalid log level `{}`, expected `trace` or `debug`", other);
            return TokenStream::from(quote! { compile_error!(#message); });
        }
    };

    let input_fn: ItemFn = parse_macro_input!(item as ItemFn);
    let fn_name = &input_fn.sig.ident;
    let is_async = input_fn.sig.asyncness.is_some();
    let fn_block = &input_fn.block;

    let return_type = match &input_fn.sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    let log_args_type = args_with_types(&input_fn);
    let log_args_value = args_with_values(&input_fn);

    // the explicit return type keeps `?` inside the wrapped body inferable
    let call_original_fn = if is_async {
        quote! { let result = (async move { let inner: #return_type = #fn_block; inner }).await; }
    } else {
        quote! { let result = (move || -> #return_type { #fn_block })(); }
    };

    let module_path = quote! { module_path!() };

    let (log_enter, log_exit) = match log_level {
        ProcLogLevel::Trace => (
            quote! {
                if ::logger::get_logger_level() == ::logger::LogLevel::Trace {
                    ::logger::trace!("Function call {}::{}{}", #module_path, stringify!(#fn_name), #log_args_value);
                }
                else {
                    ::logger::debug!("Function call {}::{}{}", #module_path, stringify!(#fn_name), #log_args_type);
                }
            },
            quote! {
                if ::logger::get_logger_level() == ::logger::LogLevel::Trace {
                    ::logger::trace!("Function {}::{} returned: {:?}", #module_path, stringify!(#fn_name), result);
                }
                else {
                    ::logger::debug!("Function {}::{} returned.", #module_path, stringify!(#fn_name));
                }
            }
        ),
        ProcLogLevel::Debug => (
            quote! { ::logger::debug!("Function call {}::{}{}", #module_path, stringify!(#fn_name), #log_args_type); },
            quote! { ::logger::debug!("Function {}::{} returned.", #module_path, stringify!(#fn_name)); }
        ),
    };

    let attributes = &input_fn.attrs;
    let visibility = &input_fn.vis;
    let signature = &input_fn.sig;

    let expanded = quote! {
        #(#attributes)* #visibility #signature {
            #log_enter
            #call_original_fn
            #log_exit
            result
        }
    };

    TokenStream::from(expanded)
}

// "(name: Type, ...)"
fn args_with_types(input_fn: &ItemFn) -> TokenStream2 {
    let parts = typed_args(input_fn).map(|(ident, ty)| {
        quote! { format!("{}: {}", stringify!(#ident), stringify!(#ty)) }
    });
    quote! { format!("({})", <[String]>::join(&[#(#parts),*], ", ")) }
}

// "(name: value, ...)"
fn args_with_values(input_fn: &ItemFn) -> TokenStream2 {
    let parts = typed_args(input_fn).map(|(ident, _)| {
        quote! { format!("{}: {:?}", stringify!(#ident), #ident) }
    });
    quote! { format!("({})", <[String]>::join(&[#(#parts),*], ", ")) }
}

// `self` receivers and destructuring patterns are skipped.
fn typed_args(input_fn: &ItemFn) -> impl Iterator<Item = (&syn::Ident, &syn::Type)> {
    input_fn.sig.inputs.iter().filter_map(|arg| {
        if let FnArg::Typed(pat_type) = arg {
            if let Pat::Ident(ref pat_ident) = *pat_type.pat {
                return Some((&pat_ident.ident, pat_type.ty.as_ref()));
            }
        }
        None
    })
}

//! Procedural macros for JSON:API Rust.
//!
//! `#[derive(Resource)]` implements `jsonapi_core::Resource` from
//! `#[jsonapi(...)]` field attributes.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod resource_derive;

/// Derive `jsonapi_core::Resource` for a struct with named fields.
///
/// # Field attributes
///
/// - `#[jsonapi(primary = "blogs")]`: the identifier and the resource type it keys.
///   Exactly one field must carry it.
/// - `#[jsonapi(attr)]` or `#[jsonapi(attr = "created_at")]`: an attribute, named
///   after the field unless given. Add `omitempty` to skip null and zero values.
/// - `#[jsonapi(relation)]` or `#[jsonapi(relation = "current_post")]`: a relation.
///   `Option<Related<T>>` is to-one, `Vec<Related<T>>` is to-many. Add `embedded`
///   to inline related records instead of sideloading them.
///
/// Fields without `#[jsonapi]` are not written and decode to `Default::default()`.
///
/// # Struct attributes
///
/// - `#[jsonapi(crate = "jsonapi_core")]`: path to the core types. Defaults to the
///   `jsonapi` facade; set it when depending on `jsonapi-core` directly.
///
/// # Example
///
/// ```
/// use jsonapi::prelude::*;
///
/// #[derive(Debug, Default, Resource)]
/// struct Comment {
///     #[jsonapi(primary = "comments")]
///     id: u64,
///     #[jsonapi(attr)]
///     body: String,
/// }
///
/// let meta = <Comment as Resource>::metadata().unwrap();
/// assert_eq!(meta.resource_type(), "comments");
/// ```
#[proc_macro_derive(Resource, attributes(jsonapi))]
pub fn derive_resource(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let def = match resource_derive::parse_resource(&input) {
        Ok(def) => def,
        Err(e) => return e.to_compile_error().into(),
    };

    resource_derive::generate_resource_impl(&def).into()
}

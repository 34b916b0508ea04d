//! Derive macro mapping Rust structs onto Hessian2 JVM classes.
//!
//! # Example
//!
//! ```ignore
//! use hessian_derive::Hessian;
//!
//! #[derive(Debug, Clone, Default, Hessian)]
//! #[hessian(class_name = "com.example.Person")]
//! pub struct Person {
//!     pub name: String,
//!     pub age: i32,
//!     #[hessian(field_name = "emailAddress")]
//!     pub email: Option<String>,
//! }
//! ```

extern crate proc_macro;

mod hessian;

use proc_macro::TokenStream;

/// Derives `JavaClass`, `HessianObject`, `Serializable` and `Deserializable`
/// for a struct with named fields.
///
/// The struct must also implement `Debug`, `Clone` and `Default`. Only `pub`
/// fields are written; every other field keeps its default value when the
/// struct is decoded.
///
/// # Attributes
///
/// ## Struct-level
/// - `#[hessian(class_name = "...")]` sets the Java class name (defaults to
///   the Rust struct name).
///
/// ## Field-level
/// - `#[hessian(field_name = "...")]` overrides the wire field name (defaults
///   to the field name in lowerCamelCase).
/// - `#[hessian(flatten)]` splices the fields of an embedded `HessianObject`
///   in at this position instead of writing it as a nested object.
/// - `#[hessian(skip)]` excludes a `pub` field.
#[proc_macro_derive(Hessian, attributes(hessian))]
pub fn derive_hessian(input: TokenStream) -> TokenStream {
    hessian::derive_hessian_impl(input)
}

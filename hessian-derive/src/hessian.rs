//! Derive macro implementation for `Hessian`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Visibility};

pub fn derive_hessian_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct FieldAttrs {
    field_name: Option<LitStr>,
    flatten: bool,
    skip: bool,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let class_name = parse_class_name(&input.attrs)?.unwrap_or_else(|| name.unraw().to_string());
    let list_type_name = format!("[{}", class_name);

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Hessian only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Hessian can only be derived for structs",
            ))
        }
    };

    let mut layout = Vec::new();
    let mut dependencies = Vec::new();

    for field in fields {
        let attrs = parse_field_attrs(&field.attrs)?;
        // Unexported fields never reach the wire.
        if attrs.skip || !matches!(field.vis, Visibility::Public(_)) {
            continue;
        }

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let rust_name = ident.unraw().to_string();

        if attrs.flatten {
            if let Some(rename) = &attrs.field_name {
                return Err(syn::Error::new_spanned(
                    rename,
                    "`field_name` has no effect on a flattened field",
                ));
            }
            layout.push(quote! {
                ::hessian_core::FieldLayout::<Self>::inline::<#ty>(
                    #rust_name,
                    |value| &value.#ident,
                    |value| &mut value.#ident,
                )
            });
            dependencies.push(quote! {
                <#ty as ::hessian_core::HessianObject>::register_dependencies(registry)?;
            });
            continue;
        }

        let rename = match &attrs.field_name {
            Some(lit) => quote! { ::std::option::Option::Some(#lit) },
            None => quote! { ::std::option::Option::None },
        };
        layout.push(quote! {
            ::hessian_core::FieldLayout::<Self>::field(
                #rust_name,
                #rename,
                |value, encoder| <#ty as ::hessian_core::Serializable>::serialize(&value.#ident, encoder),
                |target, value| {
                    target.#ident = <#ty as ::hessian_core::Deserializable>::from_value(value)?;
                    ::std::result::Result::Ok(())
                },
            )
        });
        dependencies.push(quote! {
            <#ty as ::hessian_core::Deserializable>::register_types(registry)?;
        });
    }

    Ok(quote! {
        impl #impl_generics ::hessian_core::JavaClass for #name #ty_generics #where_clause {
            fn java_class_name() -> &'static str {
                #class_name
            }
        }

        impl #impl_generics ::hessian_core::HessianObject for #name #ty_generics #where_clause {
            fn layout() -> ::std::vec::Vec<::hessian_core::FieldLayout<Self>> {
                ::std::vec![#(#layout),*]
            }

            fn register_dependencies(
                registry: &::hessian_core::TypeRegistry,
            ) -> ::hessian_core::Result<()> {
                let _ = registry;
                #(#dependencies)*
                ::std::result::Result::Ok(())
            }
        }

        impl #impl_generics ::hessian_core::Serializable for #name #ty_generics #where_clause {
            fn serialize(&self, encoder: &mut ::hessian_core::Encoder) -> ::hessian_core::Result<()> {
                encoder.write_object(self, ::std::option::Option::None)
            }

            fn serialize_shared(
                &self,
                encoder: &mut ::hessian_core::Encoder,
                identity: ::hessian_core::Identity,
            ) -> ::hessian_core::Result<()> {
                encoder.write_object(self, ::std::option::Option::Some(identity))
            }

            fn list_type_name() -> ::std::option::Option<::std::borrow::Cow<'static, str>> {
                ::std::option::Option::Some(::std::borrow::Cow::Borrowed(#list_type_name))
            }
        }

        impl #impl_generics ::hessian_core::Deserializable for #name #ty_generics #where_clause {
            fn from_value(value: ::hessian_core::Value) -> ::hessian_core::Result<Self> {
                ::hessian_core::object_from_value(value)
            }

            fn from_shared(
                value: ::hessian_core::Value,
            ) -> ::hessian_core::Result<::std::rc::Rc<::std::cell::RefCell<Self>>> {
                ::hessian_core::object_from_shared(value)
            }

            fn register_types(registry: &::hessian_core::TypeRegistry) -> ::hessian_core::Result<()> {
                registry.register::<Self>()
            }
        }
    })
}

fn parse_class_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut class_name = None;
    for attr in attrs {
        if !attr.path().is_ident("hessian") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("class_name") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("class_name must not be empty"));
                }
                class_name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported hessian struct attribute"))
            }
        })?;
    }
    Ok(class_name)
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("hessian") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("field_name") {
                parsed.field_name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("flatten") {
                parsed.flatten = true;
            } else if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else {
                return Err(meta.error("unsupported hessian field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

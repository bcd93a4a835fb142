//! Procedural macros for the repolayer project.
//!
//! Provides `#[derive(Entity)]`, which implements the entity contract from
//! conventional fields and registers the type's storage metadata with the
//! process-wide entity registry.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, Type, parse_macro_input};

/// Derives the `Entity` trait and registers the type's storage metadata.
///
/// Expects a struct with named fields following the layer's conventions:
/// an id field (named `id` unless overridden), a `created_on` field
/// convertible into `chrono::DateTime<Utc>` (e.g. `bson::DateTime`), and an
/// `object_type_id: Option<String>` field for the virtual-collection
/// discriminator.
///
/// Supported `#[entity(...)]` keys:
///
/// - `collection = "Name"` — explicit physical collection name;
/// - `virtual_collection = "name"` — shared virtual collection;
/// - `virtual_type = "name"` — discriminator override;
/// - `group = "Name"` — collection group;
/// - `key = "object_id"` / `key = "opaque"` — key representation;
/// - `id = "field"` — the id field, when it is not named `id`.
///
/// Declaring both `collection` and `virtual_collection` is accepted here
/// and rejected when the type is opened, so the contradiction surfaces as a
/// configuration error rather than mid-expansion.
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
/// #[entity(virtual_collection = "entities", key = "object_id")]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: String,
///     #[serde(rename = "createdOn")]
///     pub created_on: bson::DateTime,
///     #[serde(rename = "objectTypeId", skip_serializing_if = "Option::is_none")]
///     pub object_type_id: Option<String>,
///     pub name: String,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;

    let mut collection: Option<String> = None;
    let mut virtual_collection: Option<String> = None;
    let mut virtual_type: Option<String> = None;
    let mut group: Option<String> = None;
    let mut key_kind: Option<String> = None;
    let mut id_field = "id".to_string();

    for attr in &input.attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }
        let result = attr.parse_nested_meta(|meta| {
            let value = || -> syn::Result<String> {
                let lit: LitStr = meta.value()?.parse()?;
                Ok(lit.value())
            };
            if meta.path.is_ident("collection") {
                collection = Some(value()?);
            } else if meta.path.is_ident("virtual_collection") {
                virtual_collection = Some(value()?);
            } else if meta.path.is_ident("virtual_type") {
                virtual_type = Some(value()?);
            } else if meta.path.is_ident("group") {
                group = Some(value()?);
            } else if meta.path.is_ident("key") {
                key_kind = Some(value()?);
            } else if meta.path.is_ident("id") {
                id_field = value()?;
            } else {
                return Err(meta.error("unrecognized entity attribute"));
            }
            Ok(())
        });
        if let Err(err) = result {
            return err.to_compile_error().into();
        }
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(
                    &input.ident,
                    "Entity can only be derived for structs with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(&input.ident, "Entity can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let field_type = |name: &str| -> Option<&Type> {
        fields
            .iter()
            .find(|field| field.ident.as_ref().is_some_and(|ident| ident == name))
            .map(|field| &field.ty)
    };

    let Some(key_type) = field_type(&id_field) else {
        return syn::Error::new_spanned(
            struct_name,
            format!("Entity requires an id field named `{id_field}`"),
        )
        .to_compile_error()
        .into();
    };
    if field_type("created_on").is_none() {
        return syn::Error::new_spanned(struct_name, "Entity requires a `created_on` field")
            .to_compile_error()
            .into();
    }
    if field_type("object_type_id").is_none() {
        return syn::Error::new_spanned(
            struct_name,
            "Entity requires an `object_type_id: Option<String>` field",
        )
        .to_compile_error()
        .into();
    }

    let key_kind_tokens = match key_kind.as_deref() {
        Some("object_id") => quote! { ::repolayer::entity::KeyKind::ObjectId },
        Some("opaque") | None => quote! { ::repolayer::entity::KeyKind::Opaque },
        Some(other) => {
            return syn::Error::new_spanned(
                struct_name,
                format!("unsupported key kind {other:?}; expected \"object_id\" or \"opaque\""),
            )
            .to_compile_error()
            .into();
        }
    };

    let optional_str = |value: &Option<String>| match value {
        Some(value) => quote! { ::core::option::Option::Some(#value) },
        None => quote! { ::core::option::Option::None },
    };
    let collection_tokens = optional_str(&collection);
    let virtual_collection_tokens = optional_str(&virtual_collection);
    let virtual_type_tokens = optional_str(&virtual_type);
    let group_tokens = optional_str(&group);

    let id_ident = format_ident!("{}", id_field);
    let metadata_tokens = quote! {
        ::repolayer::entity::EntityMetadata {
            collection_name: #collection_tokens,
            virtual_collection: #virtual_collection_tokens,
            virtual_type_name: #virtual_type_tokens,
            collection_group: #group_tokens,
            key_kind: #key_kind_tokens,
        }
    };

    let expanded = quote! {
        impl ::repolayer::entity::Entity for #struct_name {
            type Key = #key_type;

            fn id(&self) -> &Self::Key {
                &self.#id_ident
            }

            fn created_on(&self) -> ::repolayer::chrono::DateTime<::repolayer::chrono::Utc> {
                self.created_on.into()
            }

            fn object_type_id(&self) -> ::core::option::Option<&str> {
                self.object_type_id.as_deref()
            }

            fn set_object_type_id(
                &mut self,
                type_id: ::core::option::Option<::std::string::String>,
            ) {
                self.object_type_id = type_id;
            }

            fn type_name() -> &'static str {
                stringify!(#struct_name)
            }

            fn metadata() -> ::repolayer::entity::EntityMetadata {
                #metadata_tokens
            }
        }

        ::repolayer::inventory::submit! {
            ::repolayer::registry::EntityDescriptor {
                type_name: stringify!(#struct_name),
                metadata: #metadata_tokens,
            }
        }
    };

    TokenStream::from(expanded)
}

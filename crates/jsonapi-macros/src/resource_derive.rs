//! Implementation of the Resource derive macro.
//!
//! This module reads `#[jsonapi(...)]` field attributes and generates the
//! schema, encode and decode halves of `jsonapi_core::Resource`. Generated
//! paths go through the `jsonapi` facade unless the struct names another
//! crate path with `#[jsonapi(crate = "...")]`.

use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Path, Result, Type, parse_quote,
};

/// Member names JSON:API accepts: alphanumeric at both ends, `-`, `_` or space inside.
const MEMBER_NAME_PATTERN: &str = r"^[A-Za-z0-9](?:[A-Za-z0-9_\- ]*[A-Za-z0-9])?$";

/// Parsed definition of a struct with `#[derive(Resource)]`.
#[derive(Debug)]
pub struct ResourceDef {
    /// The struct name.
    pub name: Ident,
    /// Every named field, annotated or not, in declaration order.
    pub fields: Vec<ResourceFieldDef>,
    /// Generics from the struct.
    pub generics: syn::Generics,
    /// Path the generated code reaches the core types through.
    pub krate: Path,
}

/// One struct field.
#[derive(Debug)]
pub struct ResourceFieldDef {
    pub name: Ident,
    pub ty: Type,
    /// `None` for fields without `#[jsonapi]`; they stay off the wire.
    pub role: Option<RoleDef>,
}

/// What a `#[jsonapi(...)]` attribute declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDef {
    Primary { resource_type: String },
    Attr { wire_name: String, omit_empty: bool },
    Relation { wire_name: String, embedded: bool },
}

impl RoleDef {
    fn wire_name(&self) -> &str {
        match self {
            RoleDef::Primary { .. } => "id",
            RoleDef::Attr { wire_name, .. } | RoleDef::Relation { wire_name, .. } => wire_name,
        }
    }
}

/// Parse a `DeriveInput` into a `ResourceDef`, enforcing one identifier and
/// unique, valid member names.
pub fn parse_resource(input: &DeriveInput) -> Result<ResourceDef> {
    let krate = parse_crate_path(input)?;
    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Resource can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Resource can only be derived for structs, not unions",
            ));
        }
    };

    let mut primary: Option<&Ident> = None;
    let mut wire_names: HashMap<String, &Ident> = HashMap::new();
    for field in &fields {
        let Some(role) = &field.role else { continue };
        if let RoleDef::Primary { .. } = role {
            if let Some(first) = primary {
                return Err(Error::new_spanned(
                    &field.name,
                    format!("duplicate `primary` field; `{first}` is already the identifier"),
                ));
            }
            primary = Some(&field.name);
            continue;
        }
        let wire_name = role.wire_name().to_string();
        if let Some(first) = wire_names.insert(wire_name.clone(), &field.name) {
            return Err(Error::new_spanned(
                &field.name,
                format!("wire name `{wire_name}` is already used by `{first}`"),
            ));
        }
    }

    if primary.is_none() {
        return Err(Error::new_spanned(
            &input.ident,
            "Resource requires exactly one field marked `#[jsonapi(primary = \"...\")]`",
        ));
    }

    Ok(ResourceDef {
        name: input.ident.clone(),
        fields,
        generics: input.generics.clone(),
        krate,
    })
}

/// The struct-level `#[jsonapi(crate = "...")]` path, defaulting to the
/// facade's re-export.
fn parse_crate_path(input: &DeriveInput) -> Result<Path> {
    let mut krate: Option<Path> = None;
    for attribute in &input.attrs {
        if !attribute.path().is_ident("jsonapi") {
            continue;
        }
        attribute.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let value: LitStr = meta.value()?.parse()?;
                krate = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error("only `crate = \"...\"` is accepted on the struct"))
            }
        })?;
    }
    Ok(krate.unwrap_or_else(|| parse_quote!(::jsonapi::__private)))
}

fn parse_fields(fields: &Fields) -> Result<Vec<ResourceFieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new_spanned(
            fields,
            "Resource requires a struct with named fields",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

fn parse_field(field: &Field) -> Result<ResourceFieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut primary: Option<LitStr> = None;
    let mut attr: Option<Option<LitStr>> = None;
    let mut relation: Option<Option<LitStr>> = None;
    let mut omit_empty = false;
    let mut embedded = false;

    for attribute in &field.attrs {
        if !attribute.path().is_ident("jsonapi") {
            continue;
        }

        attribute.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("primary") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(Error::new_spanned(value, "resource type must not be empty"));
                }
                primary = Some(value);
            } else if path.is_ident("attr") {
                attr = Some(if meta.input.peek(syn::Token![=]) {
                    Some(meta.value()?.parse()?)
                } else {
                    None
                });
            } else if path.is_ident("relation") {
                relation = Some(if meta.input.peek(syn::Token![=]) {
                    Some(meta.value()?.parse()?)
                } else {
                    None
                });
            } else if path.is_ident("omitempty") {
                omit_empty = true;
            } else if path.is_ident("embedded") {
                embedded = true;
            } else {
                let key = path
                    .get_ident()
                    .map_or_else(|| "?".to_string(), ToString::to_string);
                return Err(meta.error(format!("unknown jsonapi attribute key `{key}`")));
            }
            Ok(())
        })?;
    }

    let declared = usize::from(primary.is_some())
        + usize::from(attr.is_some())
        + usize::from(relation.is_some());
    if declared > 1 {
        return Err(Error::new_spanned(
            &name,
            "a field can be only one of `primary`, `attr` or `relation`",
        ));
    }
    if omit_empty && attr.is_none() {
        return Err(Error::new_spanned(&name, "`omitempty` only applies to `attr` fields"));
    }
    if embedded && relation.is_none() {
        return Err(Error::new_spanned(&name, "`embedded` only applies to `relation` fields"));
    }

    let role = if let Some(resource_type) = primary {
        Some(RoleDef::Primary {
            resource_type: resource_type.value(),
        })
    } else if let Some(wire) = attr {
        Some(RoleDef::Attr {
            wire_name: member_name(&name, wire)?,
            omit_empty,
        })
    } else if let Some(wire) = relation {
        Some(RoleDef::Relation {
            wire_name: member_name(&name, wire)?,
            embedded,
        })
    } else {
        None
    };

    Ok(ResourceFieldDef {
        name,
        ty: field.ty.clone(),
        role,
    })
}

/// The explicit wire name, or the field name, checked against JSON:API member
/// name rules.
fn member_name(field: &Ident, explicit: Option<LitStr>) -> Result<String> {
    let (wire_name, span) = match &explicit {
        Some(lit) => (lit.value(), lit.span()),
        None => (field.to_string(), field.span()),
    };

    if wire_name == "id" || wire_name == "type" {
        return Err(Error::new(
            span,
            format!("`{wire_name}` is a reserved member name"),
        ));
    }
    let pattern = regex::Regex::new(MEMBER_NAME_PATTERN)
        .map_err(|e| Error::new(span, format!("invalid member name pattern: {e}")))?;
    if !pattern.is_match(&wire_name) {
        return Err(Error::new(
            span,
            format!("`{wire_name}` is not a valid JSON:API member name"),
        ));
    }
    Ok(wire_name)
}

/// Generate the `Resource` trait implementation.
pub fn generate_resource_impl(def: &ResourceDef) -> TokenStream {
    let name = &def.name;
    let name_str = name.to_string();
    let krate = &def.krate;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let mut decls = Vec::new();
    let mut outs = Vec::new();
    let mut inits = Vec::new();
    let mut identifier = None;

    for field in &def.fields {
        let field_name = &field.name;
        let field_name_str = field_name.to_string();
        let ty = &field.ty;

        let Some(role) = &field.role else {
            inits.push(quote! { #field_name: ::core::default::Default::default() });
            continue;
        };
        let index = decls.len();

        match role {
            RoleDef::Primary { resource_type } => {
                identifier = Some(field_name);
                decls.push(quote! {
                    #krate::FieldDecl::identifier(#field_name_str, #resource_type)
                });
                outs.push(quote! { #krate::FieldOut::identifier(&self.#field_name) });
                inits.push(quote! { #field_name: reader.identifier()? });
            }
            RoleDef::Attr {
                wire_name,
                omit_empty,
            } => {
                let omit = omit_empty.then(|| quote! { .omit_empty() });
                decls.push(quote! {
                    #krate::FieldDecl::attribute(#field_name_str, #wire_name) #omit
                });
                outs.push(quote! { #krate::FieldOut::attribute(&self.#field_name) });
                inits.push(quote! { #field_name: reader.attribute(#index)? });
            }
            RoleDef::Relation {
                wire_name,
                embedded,
            } => {
                let embed = embedded.then(|| quote! { .embedded() });
                decls.push(quote! {
                    #krate::FieldDecl::relation::<#ty>(#field_name_str, #wire_name) #embed
                });
                outs.push(quote! {
                    #krate::RelationField::to_field_out(&self.#field_name)
                });
                inits.push(quote! { #field_name: reader.relation(#index)? });
            }
        }
    }

    let resource_id = match identifier {
        Some(field_name) => quote! { #krate::ResourceId::to_id(&self.#field_name) },
        None => quote! { ::core::option::Option::None },
    };

    quote! {
        impl #impl_generics #krate::Resource for #name #ty_generics #where_clause {
            fn schema() -> #krate::Schema {
                #krate::Schema::new(#name_str)
                    #(.field(#decls))*
            }

            fn resource_id(&self) -> ::core::option::Option<::std::string::String> {
                #resource_id
            }

            fn encode(&self) -> ::std::vec::Vec<#krate::FieldOut<'_>> {
                ::std::vec![#(#outs),*]
            }

            fn decode(
                reader: &mut #krate::FieldReader<'_, '_>,
            ) -> #krate::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#inits),*
                })
            }
        }
    }
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident};

struct RelationField {
    kind: Ident,
    flag: Ident,
    count: Option<Ident>,
}

pub fn derive_toggleable(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = named_fields(input)?;

    let id_field = extract_id_field(name, fields)?;
    let relations = extract_relations(fields)?;

    let getters = relations.iter().map(|relation| {
        let kind = &relation.kind;
        let flag = &relation.flag;
        let count = match &relation.count {
            Some(count) => quote! { ::std::option::Option::Some(self.#count) },
            None => quote! { ::std::option::Option::None },
        };
        quote! {
            optimistic_toggle::RelationKind::#kind => ::std::option::Option::Some(
                optimistic_toggle::RelationState::new(self.#flag, #count),
            ),
        }
    });

    let setters = relations.iter().map(|relation| {
        let kind = &relation.kind;
        let flag = &relation.flag;
        let count = relation.count.as_ref().map(|count| {
            quote! {
                if let ::std::option::Option::Some(count) = state.count {
                    self.#count = count;
                }
            }
        });
        quote! {
            optimistic_toggle::RelationKind::#kind => {
                self.#flag = state.active;
                #count
                true
            }
        }
    });

    Ok(quote! {
        impl optimistic_toggle::Toggleable for #name {
            fn id(&self) -> &str {
                &self.#id_field
            }

            #[allow(unreachable_patterns)]
            fn relation(
                &self,
                kind: optimistic_toggle::RelationKind,
            ) -> ::std::option::Option<optimistic_toggle::RelationState> {
                match kind {
                    #(#getters)*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn set_relation(
                &mut self,
                kind: optimistic_toggle::RelationKind,
                state: optimistic_toggle::RelationState,
            ) -> bool {
                match kind {
                    #(#setters)*
                    _ => false,
                }
            }
        }
    })
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::punctuated::Punctuated<Field, syn::Token![,]>> {
    if let Data::Struct(data_struct) = &input.data {
        if let Fields::Named(fields) = &data_struct.fields {
            return Ok(&fields.named);
        }
    }

    Err(syn::Error::new_spanned(
        &input.ident,
        "Toggleable derive: only structs with named fields are supported",
    ))
}

fn extract_id_field(
    name: &Ident,
    fields: &syn::punctuated::Punctuated<Field, syn::Token![,]>,
) -> syn::Result<Ident> {
    for field in fields {
        for attr in &field.attrs {
            if !attr.path().is_ident("toggle") {
                continue;
            }
            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                } else if meta.input.peek(syn::Token![=]) {
                    // relation attributes are handled by extract_relations
                    let _: syn::Expr = meta.value()?.parse()?;
                }
                Ok(())
            })?;
            if is_id {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    // Default: a field named "id"
    fields
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == "id")
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                name,
                "Toggleable derive: no field marked with #[toggle(id)] and no field named `id`",
            )
        })
}

fn extract_relations(
    fields: &syn::punctuated::Punctuated<Field, syn::Token![,]>,
) -> syn::Result<Vec<RelationField>> {
    let mut relations = Vec::new();

    for field in fields {
        let Some(flag) = &field.ident else { continue };

        for attr in &field.attrs {
            if !attr.path().is_ident("toggle") {
                continue;
            }

            let mut kind = None;
            let mut count = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("relation") {
                    kind = Some(meta.value()?.parse::<Ident>()?);
                } else if meta.path.is_ident("count") {
                    count = Some(meta.value()?.parse::<Ident>()?);
                } else if meta.path.is_ident("id") {
                    // handled by extract_id_field
                } else {
                    return Err(meta.error("expected `id`, `relation = Kind` or `count = field`"));
                }
                Ok(())
            })?;

            match (kind, count) {
                (Some(kind), count) => relations.push(RelationField {
                    kind,
                    flag: flag.clone(),
                    count,
                }),
                (None, Some(count)) => {
                    return Err(syn::Error::new_spanned(
                        count,
                        "Toggleable derive: `count` requires `relation` on the same field",
                    ))
                }
                (None, None) => {}
            }
        }
    }

    Ok(relations)
}

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Token, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        ));
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");
    let rename_all = container_rename_all(&input.attrs)?;

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return Err(syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            ));
        }
    };

    let calmform = calmform_path();
    let mut fields_methods = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let options = FieldOptions::parse(&field.attrs)?;
        let field_name = field_ident.to_string();
        let key_name = match (options.rename, rename_all.as_deref()) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => apply_rename_rule(rule, &field_name),
            (None, None) => field_name.trim_start_matches("r#").to_string(),
        };

        fields_methods.push(quote! {
            pub fn #field_ident(&self) -> #calmform::form::FieldKey {
                #calmform::form::FieldKey::under(self.prefix.as_ref(), #key_name)
            }
        });

        if options.nested {
            let field_ty = field.ty;
            let nested_ident = format_ident!("{}_fields", field_ident);
            fields_methods.push(quote! {
                pub fn #nested_ident(&self) -> <#field_ty as #calmform::form::FormModel>::Fields {
                    <#field_ty as #calmform::form::FormModel>::fields_under(
                        ::core::option::Option::Some(self.#field_ident()),
                    )
                }
            });
        }
    }

    Ok(quote! {
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct #fields_struct_ident {
            prefix: ::core::option::Option<#calmform::form::FieldKey>,
        }

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #calmform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields_under(
                prefix: ::core::option::Option<#calmform::form::FieldKey>,
            ) -> Self::Fields {
                #fields_struct_ident { prefix }
            }
        }
    })
}

#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    nested: bool,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs {
            if attr.path().is_ident("form") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("nested") {
                        options.nested = true;
                        Ok(())
                    } else if meta.path.is_ident("rename") {
                        let value: LitStr = meta.value()?.parse()?;
                        options.rename = Some(value.value());
                        Ok(())
                    } else {
                        Err(meta.error("unsupported form attribute, expected `nested` or `rename`"))
                    }
                })?;
            } else if attr.path().is_ident("serde") && options.rename.is_none() {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                        let value: LitStr = meta.value()?.parse()?;
                        options.rename = Some(value.value());
                        return Ok(());
                    }
                    skip_serde_meta(&meta)
                })?;
            }
        }
        Ok(options)
    }
}

fn container_rename_all(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut rule = None;
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") && meta.input.peek(Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                rule = Some(value.value());
                return Ok(());
            }
            skip_serde_meta(&meta)
        })?;
    }
    Ok(rule)
}

// Serde attributes we don't interpret still have to be consumed.
fn skip_serde_meta(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        let _: TokenStream2 = content.parse()?;
    }
    Ok(())
}

fn apply_rename_rule(rule: &str, field: &str) -> String {
    let words = field
        .trim_start_matches("r#")
        .split('_')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();
    match rule {
        "lowercase" => words.concat().to_lowercase(),
        "UPPERCASE" => words.concat().to_uppercase(),
        "PascalCase" => to_pascal_case(&words),
        "camelCase" => {
            let pascal = to_pascal_case(&words);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                None => pascal,
            }
        }
        "SCREAMING_SNAKE_CASE" => words.join("_").to_uppercase(),
        "kebab-case" => words.join("-"),
        "SCREAMING-KEBAB-CASE" => words.join("-").to_uppercase(),
        _ => words.join("_"),
    }
}

fn to_pascal_case(words: &[&str]) -> String {
    let mut out = String::new();
    for segment in words {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::calmform),
    }
}

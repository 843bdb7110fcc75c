use crate::model::{CaseDeclaration, SumTypeDeclaration};
use crate::shape::{classify, resolve, CaseShape, CompositeField, TypeShape};
use darling::ast::Style;
use proc_macro2::{Span, TokenStream};
use std::collections::hash_map::{Entry, HashMap};
use syn::ext::IdentExt;
use syn::*;
use template_quote::{quote, ToTokens};

/// The getter (and optional setter) generated for one variant.
pub(crate) struct Accessor {
    pub vis: Visibility,
    pub getter: Ident,
    pub output: Type,
    pub read: TokenStream,
    pub doc: String,
    pub setter: Option<Setter>,
    pub record: Option<Record>,
}

pub(crate) struct Setter {
    pub vis: Visibility,
    pub ident: Ident,
    pub input: Type,
    pub pattern: TokenStream,
    pub construct: TokenStream,
    pub message: String,
    pub doc: String,
}

/// Struct standing in for a named tuple of the fields of a struct-like variant.
pub(crate) struct Record {
    pub vis: Visibility,
    pub ident: Ident,
    pub labels: Vec<Ident>,
    pub params: Vec<Ident>,
    pub doc: String,
}

fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 && chars[i - 1] != '_' {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || next_is_lower {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Turns `name` into an identifier, escaping keywords.
fn ident_from(name: &str) -> Ident {
    if parse_str::<Ident>(name).is_ok() {
        Ident::new(name, Span::call_site())
    } else if matches!(name, "self" | "super" | "crate" | "Self") {
        Ident::new(&format!("{}_", name), Span::call_site())
    } else {
        Ident::new_raw(name, Span::call_site())
    }
}

fn option_of(inner: TokenStream) -> Type {
    parse_quote!(::core::option::Option<#inner>)
}

// `Self::C`, `Self::C(..)` or `Self::C { .. }` depending on how the variant is written.
fn any_payload_pattern(case: &CaseDeclaration) -> TokenStream {
    let ident = &case.ident;
    match case.style() {
        Style::Unit => quote!(Self::#ident),
        Style::Tuple => quote!(Self::#ident(..)),
        Style::Struct => quote!(Self::#ident { .. }),
    }
}

/// Derives one accessor per variant, in declaration order.
pub(crate) fn derive(declaration: &SumTypeDeclaration, setters: bool) -> Vec<Accessor> {
    declaration
        .cases()
        .iter()
        .map(|case| derive_case(declaration, case, setters))
        .collect()
}

pub(crate) fn derive_case(
    declaration: &SumTypeDeclaration,
    case: &CaseDeclaration,
    setters: bool,
) -> Accessor {
    let enum_ident = declaration.ident.unraw();
    let case_ident = &case.ident;
    let snake = camel_to_snake(&case_ident.unraw().to_string());
    let getter = ident_from(&snake);
    let vis = declaration.vis.clone();
    let make_setter = |input: Type, pattern: TokenStream, construct: TokenStream| Setter {
        vis: vis.clone(),
        ident: Ident::new(&format!("set_{}", snake), Span::call_site()),
        input,
        pattern,
        construct,
        message: format!(
            "the setter generated by #[case_accessors] for `{}::{}` expects `Some`, found `None`",
            enum_ident,
            case_ident.unraw()
        ),
        doc: format!(
            " Replaces `self` with [`Self::{}`] holding the given payload. \
             Passing `None` leaves `self` unchanged and fails a debug assertion.",
            case_ident
        ),
    };
    match resolve(case) {
        CaseShape::NoPayload => Accessor {
            vis: vis.clone(),
            getter,
            output: parse_quote!(bool),
            read: quote! {
                ::core::matches!(self, #{any_payload_pattern(case)})
            },
            doc: format!(" Returns `true` if `self` is [`Self::{}`].", case_ident),
            setter: None,
            record: None,
        },
        CaseShape::SinglePositional(param) => {
            let ty = &param.ty;
            let (output, value, input, payload) = match classify(ty) {
                TypeShape::Optional(inner) => (
                    option_of(quote!(&#inner)),
                    quote!(__value.as_ref()),
                    option_of(quote!(#inner)),
                    quote!(::core::option::Option::Some(__value)),
                ),
                // Parenthesized so that `+ Send` bounds stay attached to the object type.
                TypeShape::Existential(object) => (
                    option_of(quote!(&(#object))),
                    quote!(::core::option::Option::Some(&**__value)),
                    option_of(quote!(#ty)),
                    quote!(__value),
                ),
                TypeShape::Plain => (
                    option_of(quote!(&#ty)),
                    quote!(::core::option::Option::Some(__value)),
                    option_of(quote!(#ty)),
                    quote!(__value),
                ),
            };
            Accessor {
                vis: vis.clone(),
                getter,
                output,
                read: quote! {
                    match self {
                        Self::#case_ident(__value) => #value,
                        _ => ::core::option::Option::None,
                    }
                },
                doc: format!(
                    " Returns the payload of [`Self::{}`], or `None` for any other variant.",
                    case_ident
                ),
                setter: setters.then(|| {
                    make_setter(input, quote!(__value), quote!(Self::#case_ident(#payload)))
                }),
                record: None,
            }
        }
        CaseShape::Composite(fields) => {
            let bindings: Vec<&Ident> = fields.iter().map(|field| &field.binding).collect();
            let tys: Vec<&Type> = fields.iter().map(|field| field.ty).collect();
            let doc = format!(
                " Returns the fields of [`Self::{}`], or `None` for any other variant.",
                case_ident
            );
            if fields.iter().all(CompositeField::is_labeled) {
                let record = Record::new(declaration, case, &fields);
                let record_ident = &record.ident;
                Accessor {
                    vis: vis.clone(),
                    getter,
                    output: option_of(quote!(#record_ident<#(&#tys),*>)),
                    read: quote! {
                        match self {
                            Self::#case_ident { #(#bindings),* } => {
                                ::core::option::Option::Some(#record_ident { #(#bindings),* })
                            }
                            _ => ::core::option::Option::None,
                        }
                    },
                    doc,
                    setter: setters.then(|| {
                        make_setter(
                            option_of(quote!(#record_ident<#(#tys),*>)),
                            quote!(#record_ident { #(#bindings),* }),
                            quote!(Self::#case_ident { #(#bindings),* }),
                        )
                    }),
                    record: Some(record),
                }
            } else {
                Accessor {
                    vis: vis.clone(),
                    getter,
                    output: option_of(quote!((#(&#tys),*))),
                    read: quote! {
                        match self {
                            Self::#case_ident(#(#bindings),*) => {
                                ::core::option::Option::Some((#(#bindings),*))
                            }
                            _ => ::core::option::Option::None,
                        }
                    },
                    doc,
                    setter: setters.then(|| {
                        make_setter(
                            option_of(quote!((#(#tys),*))),
                            quote!((#(#bindings),*)),
                            quote!(Self::#case_ident(#(#bindings),*)),
                        )
                    }),
                    record: None,
                }
            }
        }
    }
}

/// Two variants whose generated methods share a name.
pub(crate) struct NameClash<'a> {
    pub name: &'a Ident,
    pub first: &'a Ident,
    pub second: &'a Ident,
}

/// Finds every generated method name already taken by an earlier variant. `accessors` must come
/// from [`derive`] on the same declaration.
pub(crate) fn clashes<'a>(
    declaration: &'a SumTypeDeclaration,
    accessors: &'a [Accessor],
) -> Vec<NameClash<'a>> {
    let mut taken: HashMap<String, &Ident> = HashMap::new();
    let mut clashes = Vec::new();
    for (case, accessor) in declaration.cases().iter().zip(accessors) {
        let setter = accessor.setter.as_ref().map(|setter| &setter.ident);
        for name in std::iter::once(&accessor.getter).chain(setter) {
            match taken.entry(name.to_string()) {
                Entry::Occupied(entry) => clashes.push(NameClash {
                    name,
                    first: *entry.get(),
                    second: &case.ident,
                }),
                Entry::Vacant(entry) => {
                    entry.insert(&case.ident);
                }
            }
        }
    }
    clashes
}

impl Record {
    fn new(
        declaration: &SumTypeDeclaration,
        case: &CaseDeclaration,
        fields: &[CompositeField<'_>],
    ) -> Self {
        let ident = Ident::new(
            &format!("{}_{}Fields", declaration.ident.unraw(), case.ident.unraw()),
            Span::call_site(),
        );
        Self {
            vis: declaration.vis.clone(),
            ident,
            labels: fields.iter().map(|field| field.binding.clone()).collect(),
            params: (0..fields.len())
                .map(|i| Ident::new(&format!("T{}", i), Span::call_site()))
                .collect(),
            doc: format!(
                " Fields of [`{}::{}`], in declaration order.",
                declaration.ident, case.ident
            ),
        }
    }
}

impl ToTokens for Record {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Record {
            vis,
            ident,
            labels,
            params,
            doc,
        } = self;
        tokens.extend(quote! {
            #[doc = #doc]
            #[allow(dead_code, non_camel_case_types)]
            #[derive(
                ::core::clone::Clone,
                ::core::marker::Copy,
                ::core::fmt::Debug,
                ::core::default::Default,
                ::core::cmp::PartialEq,
                ::core::cmp::Eq,
                ::core::cmp::PartialOrd,
                ::core::cmp::Ord,
                ::core::hash::Hash,
            )]
            #vis struct #ident<#(#params),*> {
                #(for (label, param) in labels.iter().zip(params)) {
                    pub #label: #param,
                }
            }

            #[allow(dead_code)]
            impl<'a, #(#params: ::core::clone::Clone),*> #ident<#(&'a #params),*> {
                /// Clones every borrowed field into an owned record.
                #[inline]
                #vis fn cloned(self) -> #ident<#(#params),*> {
                    #ident {
                        #(for label in labels) {
                            #label: ::core::clone::Clone::clone(self.#label),
                        }
                    }
                }
            }
        });
    }
}

impl ToTokens for Setter {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Setter {
            vis,
            ident,
            input,
            pattern,
            construct,
            message,
            doc,
        } = self;
        tokens.extend(quote! {
            #[doc = #doc]
            #[inline]
            #[track_caller]
            #vis fn #ident(&mut self, value: #input) {
                ::core::debug_assert!(value.is_some(), "{}", #message);
                if let ::core::option::Option::Some(#pattern) = value {
                    *self = #construct;
                }
            }
        });
    }
}

impl ToTokens for Accessor {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let Accessor {
            vis,
            getter,
            output,
            read,
            doc,
            setter,
            ..
        } = self;
        tokens.extend(quote! {
            #[doc = #doc]
            #[inline]
            #vis fn #getter(&self) -> #output {
                #read
            }
            #(if let Some(setter) = setter) {
                #setter
            }
        });
    }
}

/// Renders the records and the inherent `impl` block holding every accessor.
pub(crate) fn render(declaration: &SumTypeDeclaration, accessors: &[Accessor]) -> TokenStream {
    let ident = &declaration.ident;
    let (impl_generics, ty_generics, where_clause) = declaration.generics.split_for_impl();
    quote! {
        #(for accessor in accessors) {
            #(if let Some(record) = &accessor.record) {
                #record
            }
        }
        #[allow(dead_code, unreachable_patterns, unused_parens)]
        impl #impl_generics #ident #ty_generics #where_clause {
            #(for accessor in accessors) {
                #accessor
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darling::FromDeriveInput;

    fn declaration(input: DeriveInput) -> SumTypeDeclaration {
        SumTypeDeclaration::from_derive_input(&input).unwrap()
    }

    fn find<'a>(accessors: &'a [Accessor], name: &str) -> &'a Accessor {
        accessors
            .iter()
            .find(|accessor| accessor.getter == name)
            .unwrap()
    }

    #[test]
    fn snake_case_names() {
        assert_eq!(camel_to_snake("Circle"), "circle");
        assert_eq!(camel_to_snake("NotFound"), "not_found");
        assert_eq!(camel_to_snake("HTTPError"), "http_error");
        assert_eq!(camel_to_snake("V2Ready"), "v2_ready");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
        assert_eq!(camel_to_snake("circle"), "circle");
    }

    #[test]
    fn keyword_names_are_escaped() {
        assert_eq!(ident_from("type").to_string(), "r#type");
        assert_eq!(ident_from("self").to_string(), "self_");
        assert_eq!(ident_from("circle").to_string(), "circle");
    }

    #[test]
    fn shape_enum_without_setters() {
        let declaration = declaration(parse_quote! {
            enum Shape {
                Circle { radius: f64 },
                Empty,
            }
        });
        let accessors = derive(&declaration, false);
        assert_eq!(accessors.len(), 2);

        let circle = find(&accessors, "circle");
        assert_eq!(
            circle.output,
            parse_quote!(::core::option::Option<Shape_CircleFields<&f64>>)
        );
        assert!(circle.setter.is_none());
        let record = circle.record.as_ref().unwrap();
        assert_eq!(record.ident, "Shape_CircleFields");
        assert_eq!(record.labels, [Ident::new("radius", Span::call_site())]);

        let empty = find(&accessors, "empty");
        assert_eq!(empty.output, parse_quote!(bool));
        assert!(empty.setter.is_none());
        assert!(empty.record.is_none());
    }

    #[test]
    fn accessors_follow_declaration_order() {
        let declaration = declaration(parse_quote! {
            enum Token { Word(String), Number(i64), Comma, End }
        });
        let names: Vec<String> = derive(&declaration, false)
            .iter()
            .map(|accessor| accessor.getter.to_string())
            .collect();
        assert_eq!(names, ["word", "number", "comma", "end"]);
    }

    #[test]
    fn result_like_enum_with_setters() {
        let declaration = declaration(parse_quote! {
            enum Outcome {
                Success(i32),
                Failure(Box<dyn std::error::Error>),
            }
        });
        let accessors = derive(&declaration, true);

        let success = find(&accessors, "success");
        assert_eq!(success.output, parse_quote!(::core::option::Option<&i32>));
        let setter = success.setter.as_ref().unwrap();
        assert_eq!(setter.ident, "set_success");
        assert_eq!(setter.input, parse_quote!(::core::option::Option<i32>));
        assert!(setter.message.contains("`Outcome::Success`"));

        let failure = find(&accessors, "failure");
        assert_eq!(
            failure.output,
            parse_quote!(::core::option::Option<&(dyn std::error::Error)>)
        );
        assert_eq!(
            failure.setter.as_ref().unwrap().input,
            parse_quote!(::core::option::Option<Box<dyn std::error::Error>>)
        );
    }

    #[test]
    fn optional_payload_is_not_wrapped_twice() {
        let declaration = declaration(parse_quote! {
            enum Lookup { Hit(Option<u32>), Miss }
        });
        let accessors = derive(&declaration, true);
        let hit = find(&accessors, "hit");
        assert_eq!(hit.output, parse_quote!(::core::option::Option<&u32>));
        assert_eq!(
            hit.setter.as_ref().unwrap().input,
            parse_quote!(::core::option::Option<u32>)
        );
    }

    #[test]
    fn unit_variant_never_has_setter() {
        let declaration = declaration(parse_quote! {
            enum Light { On, Off }
        });
        assert!(derive(&declaration, true)
            .iter()
            .all(|accessor| accessor.setter.is_none() && accessor.output == parse_quote!(bool)));
    }

    #[test]
    fn positional_composite_is_a_tuple() {
        let declaration = declaration(parse_quote! {
            enum Edge { Span(usize, usize, String) }
        });
        let accessors = derive(&declaration, true);
        let span = find(&accessors, "span");
        assert_eq!(
            span.output,
            parse_quote!(::core::option::Option<(&usize, &usize, &String)>)
        );
        assert_eq!(
            span.setter.as_ref().unwrap().input,
            parse_quote!(::core::option::Option<(usize, usize, String)>)
        );
        assert!(span.record.is_none());
    }

    #[test]
    fn named_composite_keeps_labels_in_order() {
        let declaration = declaration(parse_quote! {
            pub enum Event { Move { x: i32, y: i32, r#type: u8 } }
        });
        let accessors = derive(&declaration, true);
        let event = find(&accessors, "r#move");
        let record = event.record.as_ref().unwrap();
        let labels: Vec<String> = record.labels.iter().map(ToString::to_string).collect();
        assert_eq!(labels, ["x", "y", "r#type"]);
        assert_eq!(
            event.setter.as_ref().unwrap().input,
            parse_quote!(::core::option::Option<Event_MoveFields<i32, i32, u8>>)
        );
        assert_eq!(event.vis, parse_quote!(pub));
    }

    fn clash_names(declaration: &SumTypeDeclaration, setters: bool) -> Vec<String> {
        let accessors = derive(declaration, setters);
        clashes(declaration, &accessors)
            .iter()
            .map(|clash| format!("{}: {} {}", clash.name, clash.first, clash.second))
            .collect()
    }

    #[test]
    fn setter_name_taken_by_getter() {
        let declaration = declaration(parse_quote! {
            enum Command { Value(u8), SetValue(u8), Reset }
        });
        assert!(clash_names(&declaration, false).is_empty());
        assert_eq!(
            clash_names(&declaration, true),
            ["set_value: Value SetValue"]
        );
    }

    #[test]
    fn variants_with_the_same_snake_case_name() {
        let declaration = declaration(parse_quote! {
            enum Failure { HttpError(u16), HTTPError { code: u16 }, Other }
        });
        assert_eq!(
            clash_names(&declaration, true),
            [
                "http_error: HttpError HTTPError",
                "set_http_error: HttpError HTTPError"
            ]
        );
    }

    #[test]
    fn distinct_names_do_not_clash() {
        let declaration = declaration(parse_quote! {
            enum Shape { Circle { radius: f64 }, Square(f64), Empty }
        });
        assert!(clash_names(&declaration, true).is_empty());
    }

    #[test]
    fn record_name_separates_enum_and_variant() {
        let first = declaration(parse_quote!(enum AB { C { x: u8 } }));
        let second = declaration(parse_quote!(enum A { BC { x: u8 } }));
        let record = |declaration: &SumTypeDeclaration| {
            derive(declaration, false)[0]
                .record
                .as_ref()
                .unwrap()
                .ident
                .to_string()
        };
        assert_eq!(record(&first), "AB_CFields");
        assert_eq!(record(&second), "A_BCFields");
    }

    #[test]
    fn render_passes_generics_through() {
        let declaration = declaration(parse_quote! {
            enum Tree<'a, T: Clone> where T: 'a {
                Leaf(&'a T),
                Node { left: Box<Tree<'a, T>>, right: Box<Tree<'a, T>> },
            }
        });
        let accessors = derive(&declaration, true);
        let file: File = parse2(render(&declaration, &accessors)).unwrap();
        let item_impl = file
            .items
            .iter()
            .rev()
            .find_map(|item| match item {
                Item::Impl(item_impl) => Some(item_impl),
                _ => None,
            })
            .unwrap();
        assert_eq!(*item_impl.self_ty, parse_quote!(Tree<'a, T>));
        assert_eq!(item_impl.generics.params.len(), 2);
        assert!(item_impl.generics.where_clause.is_some());
        let methods: Vec<String> = item_impl
            .items
            .iter()
            .filter_map(|item| match item {
                ImplItem::Fn(method) => Some(method.sig.ident.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(methods, ["leaf", "set_leaf", "node", "set_node"]);
        assert!(file.items.iter().any(|item| matches!(
            item,
            Item::Struct(item_struct) if item_struct.ident == "Tree_NodeFields"
        )));
    }
}

use darling::ast::NestedMeta;
use darling::FromDeriveInput;
use derive_syn_parse::Parse;
use proc_macro::TokenStream as TokenStream1;
use proc_macro2::Span;
use proc_macro2::TokenStream;
use proc_macro_error::proc_macro_error;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::*;
use template_quote::quote;

mod accessor;
mod diagnostic;
mod model;
mod shape;

use diagnostic::{Diagnostic, DiagnosticKind};
use model::SumTypeDeclaration;

#[derive(Parse)]
struct Arguments {
    #[call(Punctuated::parse_terminated)]
    items: Punctuated<NestedMeta, Token![,]>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GeneratorConfig {
    setters: bool,
}

impl GeneratorConfig {
    // Every argument is checked on its own: a malformed one is reported and skipped, and the last
    // well-formed `setters` wins.
    fn parse(args: TokenStream, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut config = Self::default();
        let args = match parse2::<Arguments>(args.clone()) {
            Ok(args) => args,
            Err(_) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidArguments,
                    args.span(),
                ));
                return config;
            }
        };
        for item in &args.items {
            match item {
                NestedMeta::Meta(Meta::NameValue(MetaNameValue {
                    path,
                    value:
                        Expr::Lit(ExprLit {
                            lit: Lit::Bool(value),
                            ..
                        }),
                    ..
                })) if path.is_ident("setters") => config.setters = value.value,
                other => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::InvalidArguments,
                    other.span(),
                )),
            }
        }
        config
    }
}

struct Expansion {
    tokens: TokenStream,
    diagnostics: Vec<Diagnostic>,
}

fn expand(args: TokenStream, input: TokenStream) -> Expansion {
    let mut diagnostics = Vec::new();
    let declaration = match parse2::<DeriveInput>(input.clone())
        .ok()
        .and_then(|derive_input| SumTypeDeclaration::from_derive_input(&derive_input).ok())
    {
        Some(declaration) => declaration,
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::NotAnEnum,
                Span::call_site(),
            ));
            return Expansion {
                tokens: input,
                diagnostics,
            };
        }
    };
    let config = GeneratorConfig::parse(args, &mut diagnostics);
    if declaration.cases().is_empty() {
        let warning = Diagnostic::new(DiagnosticKind::NoCases, Span::call_site());
        let tokens = quote! { #input #{ warning.lint() } };
        diagnostics.push(warning);
        return Expansion {
            tokens,
            diagnostics,
        };
    }
    let accessors = accessor::derive(&declaration, config.setters);
    let clashes = accessor::clashes(&declaration, &accessors);
    if !clashes.is_empty() {
        diagnostics.extend(clashes.iter().map(|clash| {
            Diagnostic::new(DiagnosticKind::NameClash, clash.second.span()).with_detail(format!(
                "`{}` is generated for both `{}` and `{}`",
                clash.name, clash.first, clash.second
            ))
        }));
        return Expansion {
            tokens: input,
            diagnostics,
        };
    }
    Expansion {
        tokens: quote! {
            #input
            #{ accessor::render(&declaration, &accessors) }
        },
        diagnostics,
    }
}

/// Generates an accessor method for every variant of an `enum`.
///
/// Each variant `Case` gets a getter named after it in snake_case:
///
/// - a variant without fields gets `fn case(&self) -> bool`,
/// - a variant with one unnamed field `T` gets `fn case(&self) -> Option<&T>`. If `T` is
///   `Option<U>` the getter returns `Option<&U>`, and a pointer to a trait object such as
///   `Box<dyn P>` is returned as `Option<&(dyn P)>`,
/// - a variant with several unnamed fields gets `fn case(&self) -> Option<(&A, &B, ..)>`,
/// - a variant with named fields gets `fn case(&self) -> Option<Enum_CaseFields<&A, &B, ..>>`,
///   where `Enum_CaseFields` is a generated struct with one public field per name.
///
/// With `#[case_accessors(setters = true)]` every variant carrying fields also gets
/// `fn set_case(&mut self, value: Option<..>)` taking owned values. Passing `None` never changes
/// `self`, and fails a `debug_assert!` in debug builds.
///
/// ```ignore
/// use case_accessors::case_accessors;
///
/// #[case_accessors(setters = true)]
/// enum Outcome {
///     Success(i32),
///     Failure(Box<dyn std::error::Error>),
/// }
///
/// let mut outcome = Outcome::Success(1);
/// assert_eq!(outcome.success(), Some(&1));
/// outcome.set_success(Some(2));
/// assert_eq!(outcome.success(), Some(&2));
/// assert!(outcome.failure().is_none());
/// ```
#[proc_macro_error]
#[proc_macro_attribute]
pub fn case_accessors(attr: TokenStream1, input: TokenStream1) -> TokenStream1 {
    let expansion = expand(attr.into(), input.into());
    for diagnostic in &expansion.diagnostics {
        diagnostic.emit();
    }
    expansion.tokens.into()
}
